use anyhow::{bail, Result};
use chrono::Utc;
use novedades_misc::api::user::User;

use crate::context::ServerContext;

use super::bootstrap_admin_user;

pub fn auth_bearer_token(sc: &ServerContext, auth: String, is_remote: bool) -> Result<User> {
    let now = Utc::now().timestamp() as u64;
    let subject = sc.jwt_validator.validate_token(&auth, now)?;

    if subject.bootstrap_admin {
        if is_remote {
            bail!("cannot auth as admin from remote");
        }
        return Ok(bootstrap_admin_user());
    }

    let user = sc
        .db
        .with_transaction(|tx| tx.get_user_by_name(&subject.name))?;

    match user {
        Some(user) if user.active => Ok(user),
        Some(_) => bail!("account is deactivated"),
        None => bail!("user '{}' no longer exists", subject.name),
    }
}
