use chrono::Utc;
use log::{debug, error};
use novedades_misc::api::audit::AuditAction;
use novedades_misc::api::user::{GetUserRequest, PatchUserRequest, PutUserRequest, User};
use novedades_misc::api::{ListResponse, Response};
use novedades_misc::code;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::authz::{can_manage_users, can_view, capability_for};
use crate::context::ServerContext;
use crate::db::types::{CreateUserParams, Transaction};
use crate::register_handlers;

use super::record_audit;

register_handlers!(put_user, get_user, patch_user);

async fn put_user(mut req: PutUserRequest, op: User, sc: &ServerContext) -> Response<()> {
    if !can_manage_users(&op) {
        return Response::forbidden();
    }
    debug!("Create user: {}", req.name);

    let result = sc.db.with_transaction(|tx| {
        if tx.has_user_name(&req.name)? {
            return Ok(Some("user already exists"));
        }
        if let Some(message) = validate_supervisors(tx, None, req.jefe_id, req.segundo_jefe_id)? {
            return Ok(Some(message));
        }

        let salt = generate_salt(sc.cfg.salt_length);
        req.password = code::sha256(format!("{}{}", req.password, salt));

        let now = Utc::now().timestamp() as u64;
        let full_name = req.full_name.clone();

        let id = tx.create_user(CreateUserParams {
            user: req,
            salt,
            create_time: now,
            update_time: now,
        })?;

        record_audit(
            tx,
            Some(&op),
            AuditAction::LinkUser,
            format!("Se otorgó acceso a {full_name} (ID: {id})."),
        )?;
        Ok(None)
    });

    match result {
        Ok(None) => Response::ok(),
        Ok(Some(message)) => Response::bad_request(message),
        Err(e) => {
            error!("Failed to create user: {e:#}");
            Response::database_error()
        }
    }
}

enum GetOutcome {
    Forbidden,
    NotFound,
    List(ListResponse<User>),
}

async fn get_user(
    req: GetUserRequest,
    op: User,
    sc: &ServerContext,
) -> Response<ListResponse<User>> {
    debug!("Get users: {req:?}");
    let admin = can_manage_users(&op);

    let result = sc.db.with_transaction(|tx| {
        // Point lookups are view-gated per subject; list queries are either
        // admin-only or the caller's own panel of direct subordinates.
        if req.id.is_some() || req.name.is_some() {
            let subject = match req.id {
                Some(id) => tx.get_user(id)?,
                None => tx.get_user_by_name(req.name.as_ref().unwrap())?,
            };
            let subject = match subject {
                Some(subject) => subject,
                None => return Ok(GetOutcome::NotFound),
            };
            if !can_view(&op, &subject, tx)? {
                return Ok(GetOutcome::Forbidden);
            }
            return Ok(GetOutcome::List(ListResponse {
                total: 1,
                items: vec![subject],
            }));
        }

        if !admin {
            let own_panel = req.supervised_by == Some(op.id)
                && capability_for(&op.role).review_subordinates;
            if !own_panel {
                return Ok(GetOutcome::Forbidden);
            }
        }

        let total = tx.count_users(req.clone())?;
        let users = tx.get_users(req)?;
        Ok(GetOutcome::List(ListResponse {
            total,
            items: users,
        }))
    });

    match result {
        Ok(GetOutcome::List(users)) => Response::with_data(users),
        Ok(GetOutcome::Forbidden) => Response::forbidden(),
        Ok(GetOutcome::NotFound) => Response::resource_not_found(),
        Err(e) => {
            error!("Failed to get users: {e:#}");
            Response::database_error()
        }
    }
}

enum PatchOutcome {
    NotFound,
    BadRequest(&'static str),
    Done,
}

async fn patch_user(req: PatchUserRequest, op: User, sc: &ServerContext) -> Response<()> {
    let admin = can_manage_users(&op);
    if !admin {
        // Self-service is limited to changing one's own password.
        if req.id != op.id || req.is_admin_patch() || req.password.is_none() {
            return Response::forbidden();
        }
    }

    debug!("Patch user: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let current = match tx.get_user(req.id)? {
            Some(current) => current,
            None => return Ok(PatchOutcome::NotFound),
        };
        if let Some(message) =
            validate_supervisors(tx, Some(req.id), req.jefe_id, req.segundo_jefe_id)?
        {
            return Ok(PatchOutcome::BadRequest(message));
        }

        let mut req = req;
        if let Some(ref password) = req.password {
            // Re-hash against the stored salt.
            let up = match tx.get_user_password(&current.name)? {
                Some(up) => up,
                None => return Ok(PatchOutcome::NotFound),
            };
            req.password = Some(code::sha256(format!("{password}{}", up.salt)));
        }

        let activation = match req.active {
            Some(active) if active != current.active => Some(active),
            _ => None,
        };
        let hierarchy_edit = req.role.is_some()
            || req.jefe_id.is_some()
            || req.segundo_jefe_id.is_some()
            || req.clear_jefe
            || req.clear_segundo_jefe;

        let now = Utc::now().timestamp() as u64;
        tx.update_user(req, now)?;

        if let Some(active) = activation {
            let action = if active {
                AuditAction::ActivateUser
            } else {
                AuditAction::DeactivateUser
            };
            record_audit(
                tx,
                Some(&op),
                action,
                format!(
                    "Admin {} (ID: {}) cambió el estado de {} (ID: {}).",
                    op.full_name, op.id, current.full_name, current.id
                ),
            )?;
        }
        if hierarchy_edit {
            record_audit(
                tx,
                Some(&op),
                AuditAction::EditUser,
                format!(
                    "Se actualizaron rol y jerarquías de {} (ID: {}).",
                    current.full_name, current.id
                ),
            )?;
        }

        Ok(PatchOutcome::Done)
    });

    match result {
        Ok(PatchOutcome::Done) => Response::ok(),
        Ok(PatchOutcome::NotFound) => Response::resource_not_found(),
        Ok(PatchOutcome::BadRequest(message)) => Response::bad_request(message),
        Err(e) => {
            error!("Failed to patch user: {e:#}");
            Response::database_error()
        }
    }
}

/// Supervisor links must point at existing users and never at the user
/// itself. Deeper cycles are tolerated by the resolver's depth bound.
fn validate_supervisors(
    tx: &dyn Transaction,
    user_id: Option<u64>,
    jefe_id: Option<u64>,
    segundo_jefe_id: Option<u64>,
) -> anyhow::Result<Option<&'static str>> {
    for supervisor in [jefe_id, segundo_jefe_id].into_iter().flatten() {
        if user_id == Some(supervisor) {
            return Ok(Some("user cannot be their own supervisor"));
        }
        if tx.get_user(supervisor)?.is_none() {
            return Ok(Some("supervisor does not exist"));
        }
    }
    Ok(None)
}

fn generate_salt(length: usize) -> String {
    let mut rng = thread_rng();

    (0..length)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::auth::bootstrap_admin_user;

    use super::*;

    fn loaded_user(sc: &ServerContext, id: u64) -> User {
        sc.db
            .with_transaction(|tx| tx.get_user(id))
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_user() {
        let sc = ServerContext::new_test();
        let admin = bootstrap_admin_user();

        let resp = put_user(
            PutUserRequest {
                name: "bsoto".to_string(),
                full_name: "Beatriz Soto".to_string(),
                email: "bsoto@example.org".to_string(),
                password: "clave123".to_string(),
                role: "Encargado de Unidad".to_string(),
                jefe_id: None,
                segundo_jefe_id: None,
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        // Duplicate name.
        let resp = put_user(
            PutUserRequest {
                name: "bsoto".to_string(),
                full_name: "Otra Persona".to_string(),
                email: "otra@example.org".to_string(),
                password: "clave123".to_string(),
                role: "Funcionario".to_string(),
                jefe_id: None,
                segundo_jefe_id: None,
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 400);

        // Nonexistent supervisor.
        let resp = put_user(
            PutUserRequest {
                name: "mreyes".to_string(),
                full_name: "Marta Reyes".to_string(),
                email: "mreyes@example.org".to_string(),
                password: "clave123".to_string(),
                role: "Funcionario".to_string(),
                jefe_id: Some(999),
                segundo_jefe_id: None,
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 400);

        // Non-admins cannot create users.
        let unidad = loaded_user(&sc, 1);
        let resp = put_user(
            PutUserRequest {
                name: "intruso".to_string(),
                full_name: "Intruso".to_string(),
                email: "intruso@example.org".to_string(),
                password: "clave123".to_string(),
                role: "Funcionario".to_string(),
                jefe_id: None,
                segundo_jefe_id: None,
            },
            unidad,
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);
    }

    #[tokio::test]
    async fn test_get_user_authorization() {
        let sc = ServerContext::new_test();
        let admin = bootstrap_admin_user();

        let unidad_id = sc.seed_user("bsoto", "Encargado de Unidad", "x", None, None);
        let func_id = sc.seed_user("mreyes", "Funcionario", "x", Some(unidad_id), None);
        let other_id = sc.seed_user("pgomez", "Funcionario", "x", None, None);

        let unidad = loaded_user(&sc, unidad_id);
        let func = loaded_user(&sc, func_id);

        // Admin lists everyone.
        let resp = get_user(GetUserRequest::default(), admin.clone(), &sc).await;
        assert_eq!(resp.code, 200);
        assert_eq!(resp.data.unwrap().total, 3);

        // A supervisor views a direct subordinate.
        let resp = get_user(
            GetUserRequest {
                id: Some(func_id),
                ..Default::default()
            },
            unidad.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        // ...but not an unrelated user.
        let resp = get_user(
            GetUserRequest {
                id: Some(other_id),
                ..Default::default()
            },
            unidad.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // Self-lookup always works.
        let resp = get_user(
            GetUserRequest {
                id: Some(func_id),
                ..Default::default()
            },
            func.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        // Own panel listing.
        let resp = get_user(
            GetUserRequest {
                supervised_by: Some(unidad_id),
                ..Default::default()
            },
            unidad.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);
        let list = resp.data.unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].id, func_id);

        // Someone else's panel is off-limits.
        let resp = get_user(
            GetUserRequest {
                supervised_by: Some(unidad_id),
                ..Default::default()
            },
            func.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // A Funcionario has no panel at all.
        let resp = get_user(
            GetUserRequest {
                supervised_by: Some(func_id),
                ..Default::default()
            },
            func,
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // Unknown subject.
        let resp = get_user(
            GetUserRequest {
                id: Some(999),
                ..Default::default()
            },
            admin,
            &sc,
        )
        .await;
        assert_eq!(resp.code, 404);
    }

    #[tokio::test]
    async fn test_patch_user() {
        let sc = ServerContext::new_test();
        let admin = bootstrap_admin_user();

        let unidad_id = sc.seed_user("bsoto", "Encargado de Unidad", "x", None, None);
        let func_id = sc.seed_user("mreyes", "Funcionario", "clave123", Some(unidad_id), None);
        let func = loaded_user(&sc, func_id);

        // Admin relinks and deactivates.
        let resp = patch_user(
            PatchUserRequest {
                id: func_id,
                active: Some(false),
                clear_jefe: true,
                ..Default::default()
            },
            admin.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);
        let patched = loaded_user(&sc, func_id);
        assert!(!patched.active);
        assert_eq!(patched.jefe_id, None);

        // Both audit entries were written.
        let audits = sc
            .db
            .with_transaction(|tx| {
                tx.get_audits(novedades_misc::api::audit::GetAuditRequest::default())
            })
            .unwrap();
        assert!(audits
            .iter()
            .any(|entry| entry.action == "Desactivación de Usuario"));
        assert!(audits.iter().any(|entry| entry.action == "Edición de Usuario"));

        // Self password change is allowed...
        let resp = patch_user(
            PatchUserRequest {
                id: func_id,
                password: Some("nueva_clave1".to_string()),
                ..Default::default()
            },
            func.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 200);

        // ...but touching one's own role is not.
        let resp = patch_user(
            PatchUserRequest {
                id: func_id,
                role: Some("Admin".to_string()),
                ..Default::default()
            },
            func.clone(),
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // Nor patching somebody else.
        let resp = patch_user(
            PatchUserRequest {
                id: unidad_id,
                password: Some("pwn".to_string()),
                ..Default::default()
            },
            func,
            &sc,
        )
        .await;
        assert_eq!(resp.code, 403);

        // Self-supervision is rejected.
        let resp = patch_user(
            PatchUserRequest {
                id: unidad_id,
                jefe_id: Some(unidad_id),
                ..Default::default()
            },
            admin,
            &sc,
        )
        .await;
        assert_eq!(resp.code, 400);
    }
}
