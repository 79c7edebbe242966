use log::{debug, error};
use novedades_misc::api::audit::{AuditEntry, GetAuditRequest};
use novedades_misc::api::user::User;
use novedades_misc::api::{ListResponse, Response};

use crate::authz::can_manage_users;
use crate::context::ServerContext;
use crate::register_handlers;

register_handlers!(get_audit);

async fn get_audit(
    req: GetAuditRequest,
    op: User,
    sc: &ServerContext,
) -> Response<ListResponse<AuditEntry>> {
    if !can_manage_users(&op) {
        return Response::forbidden();
    }
    debug!("Get audits: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let total = tx.count_audits(req.clone())?;
        let entries = tx.get_audits(req)?;
        Ok(ListResponse {
            total,
            items: entries,
        })
    });

    match result {
        Ok(entries) => Response::with_data(entries),
        Err(e) => {
            error!("Failed to get audits: {e:#}");
            Response::database_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use novedades_misc::api::audit::AuditAction;

    use crate::auth::bootstrap_admin_user;
    use crate::handlers::record_audit;

    use super::*;

    #[tokio::test]
    async fn test_get_audit() {
        let sc = ServerContext::new_test();
        let admin = bootstrap_admin_user();

        sc.db
            .with_transaction(|tx| {
                record_audit(tx, Some(&admin), AuditAction::LinkUser, "alta".to_string())?;
                record_audit(tx, None, AuditAction::DeactivateUser, "baja".to_string())
            })
            .unwrap();

        let resp = get_audit(GetAuditRequest::default(), admin.clone(), &sc).await;
        assert_eq!(resp.code, 200);
        let list = resp.data.unwrap();
        assert_eq!(list.total, 2);

        // System entries carry no user id but keep a readable name.
        let system_entry = list
            .items
            .iter()
            .find(|entry| entry.user_id.is_none())
            .unwrap();
        assert_eq!(system_entry.user_name, "Sistema");

        // Filter by action.
        let resp = get_audit(
            GetAuditRequest {
                action: Some("Vinculación de Usuario".to_string()),
                ..Default::default()
            },
            admin,
            &sc,
        )
        .await;
        assert_eq!(resp.data.unwrap().total, 1);

        // The audit log is admin-only.
        let func_id = sc.seed_user("mreyes", "Funcionario", "x", None, None);
        let func = sc
            .db
            .with_transaction(|tx| tx.get_user(func_id))
            .unwrap()
            .unwrap();
        let resp = get_audit(GetAuditRequest::default(), func, &sc).await;
        assert_eq!(resp.code, 403);
    }
}
