use anyhow::Result;
use novedades_misc::api::user::User;

use crate::db::types::Transaction;

/// Upper bound on the primary-supervisor chain walk. This is a safety bound
/// against malformed (cyclic) supervisor data, not a business rule: past it
/// the walk gives up and answers "not a superior".
pub const MAX_DEPTH: usize = 10;

/// One step up the primary-supervisor chain. Implemented by the database
/// transaction; tests use an in-memory map.
pub trait SupervisorLookup {
    fn primary_supervisor(&self, id: u64) -> Result<Option<u64>>;
}

impl<'a> SupervisorLookup for dyn Transaction + 'a {
    fn primary_supervisor(&self, id: u64) -> Result<Option<u64>> {
        Transaction::primary_supervisor(self, id)
    }
}

/// Decides whether `actor` is a superior, direct or transitive, of
/// `subject`.
///
/// The direct check covers both supervisor links. The transitive walk
/// follows only the primary chain: the secondary supervisor is a one-level
/// override and is never chained upward.
pub fn is_superior_of<L>(actor: &User, subject: &User, lookup: &L) -> Result<bool>
where
    L: SupervisorLookup + ?Sized,
{
    if subject.jefe_id == Some(actor.id) || subject.segundo_jefe_id == Some(actor.id) {
        return Ok(true);
    }

    let mut current = subject.jefe_id;
    let mut depth = 0;
    while let Some(id) = current {
        if depth >= MAX_DEPTH {
            break;
        }
        if id == actor.id {
            return Ok(true);
        }
        current = lookup.primary_supervisor(id)?;
        depth += 1;
    }

    Ok(false)
}
