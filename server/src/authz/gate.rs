use anyhow::Result;
use novedades_misc::api::comment::{Comment, CommentState};
use novedades_misc::api::user::{Role, User};

use super::capability::capability_for;
use super::hierarchy::{is_superior_of, SupervisorLookup};

/// Whether `actor` may read `subject`'s record and annotation book: self,
/// an administrator, or any superior in the hierarchy.
///
/// Both users must already be loaded; resolving ids is the caller's job.
pub fn can_view<L>(actor: &User, subject: &User, lookup: &L) -> Result<bool>
where
    L: SupervisorLookup + ?Sized,
{
    if actor.id == subject.id {
        return Ok(true);
    }
    if capability_for(&actor.role).manage_users {
        return Ok(true);
    }
    is_superior_of(actor, subject, lookup)
}

/// Whether `actor` may create an annotation about `subject`.
///
/// Unlike viewing, annotation eligibility is strictly a direct-relationship
/// check: the transitive chain is never consulted. The secondary supervisor
/// link only counts for the Encargado de Unidad -> Funcionario pair.
pub fn can_annotate(actor: &User, subject: &User) -> bool {
    let cap = capability_for(&actor.role);
    if cap.manage_users {
        return true;
    }
    if !cap.review_subordinates {
        return false;
    }

    let subject_role = match Role::from_name(&subject.role) {
        Some(role) => role,
        None => return false,
    };
    if !cap.annotate_targets.contains(&subject_role) {
        return false;
    }

    if subject.jefe_id == Some(actor.id) {
        return true;
    }

    // Dual-jefe rule: only a unit manager annotating staff may come in
    // through the secondary link.
    Role::from_name(&actor.role) == Some(Role::EncargadoUnidad)
        && subject_role == Role::Funcionario
        && subject.segundo_jefe_id == Some(actor.id)
}

/// Whether `actor` may acknowledge `comment`: only the subject, and only
/// while the comment is still pending.
pub fn can_accept_comment(actor: &User, comment: &Comment) -> bool {
    actor.id == comment.funcionario_id && comment.estado == CommentState::Pendiente
}

/// Whether `actor` may administer users (create, relink, deactivate) and
/// read the audit log.
pub fn can_manage_users(actor: &User) -> bool {
    capability_for(&actor.role).manage_users
}
