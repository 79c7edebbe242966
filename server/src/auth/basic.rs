use anyhow::{bail, Context, Result};
use log::error;
use novedades_misc::api::user::User;
use novedades_misc::code;

use crate::context::ServerContext;

use super::bootstrap_admin_user;

enum BasicOutcome {
    NoMatch,
    Deactivated,
    Ok(User),
}

pub fn auth_basic(sc: &ServerContext, auth: String, is_remote: bool) -> Result<User> {
    let fields = auth.split(':').collect::<Vec<&str>>();
    if fields.len() != 2 {
        bail!("basic auth missing password");
    }

    let username = fields[0];
    let password = fields[1];
    let password = code::base64_decode_string(password).context("decode password base64")?;

    if username == "admin" {
        if is_remote {
            bail!("cannot login as admin from remote");
        }

        if password == sc.cfg.admin_password {
            return Ok(bootstrap_admin_user());
        }

        bail!("incorrect admin password");
    }

    let result = sc.db.with_transaction(|tx| {
        let up = match tx.get_user_password(username)? {
            Some(up) => up,
            None => return Ok(BasicOutcome::NoMatch),
        };

        let hash = code::sha256(format!("{password}{}", up.salt));
        if hash != up.password {
            return Ok(BasicOutcome::NoMatch);
        }

        if !up.active {
            return Ok(BasicOutcome::Deactivated);
        }

        match tx.get_user_by_name(username)? {
            Some(user) => Ok(BasicOutcome::Ok(user)),
            None => Ok(BasicOutcome::NoMatch),
        }
    });

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Auth database error: {e:#}");
            bail!("database error");
        }
    };
    match outcome {
        BasicOutcome::Ok(user) => Ok(user),
        BasicOutcome::Deactivated => bail!("account is deactivated"),
        BasicOutcome::NoMatch => bail!("incorrect username or password"),
    }
}

#[cfg(test)]
mod tests {
    use novedades_misc::api::user::PatchUserRequest;

    use super::*;

    #[test]
    fn test_auth_basic() {
        let sc = ServerContext::new_test();
        let funcionario_id = sc.seed_user("mreyes", "Funcionario", "clave123", None, None);
        sc.seed_user("bsoto", "Encargado de Unidad", "clave456", None, None);
        sc.db
            .with_transaction(|tx| {
                tx.update_user(
                    PatchUserRequest {
                        id: funcionario_id,
                        active: Some(false),
                        ..Default::default()
                    },
                    10,
                )
            })
            .unwrap();

        // Correct credentials for an active user.
        let auth = format!("bsoto:{}", code::base64_encode("clave456"));
        let user = auth_basic(&sc, auth, true).unwrap();
        assert_eq!(user.name, "bsoto");
        assert_eq!(user.role, "Encargado de Unidad");

        // Wrong password.
        let auth = format!("bsoto:{}", code::base64_encode("xxx"));
        assert!(auth_basic(&sc, auth, true).is_err());

        // Unknown user.
        let auth = format!("nobody:{}", code::base64_encode("clave456"));
        assert!(auth_basic(&sc, auth, true).is_err());

        // Deactivated user, even with correct credentials.
        let auth = format!("mreyes:{}", code::base64_encode("clave123"));
        let err = auth_basic(&sc, auth, true).unwrap_err();
        assert_eq!(err.to_string(), "account is deactivated");

        // Bootstrap admin: local only.
        let auth = format!("admin:{}", code::base64_encode(&sc.cfg.admin_password));
        assert!(auth_basic(&sc, auth.clone(), true).is_err());
        let user = auth_basic(&sc, auth, false).unwrap();
        assert_eq!(user.name, "admin");
        assert_eq!(user.role, "Admin");

        let auth = format!("admin:{}", code::base64_encode("wrong"));
        assert!(auth_basic(&sc, auth, false).is_err());
    }
}
