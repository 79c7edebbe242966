use novedades_misc::api::audit::GetAuditRequest;
use novedades_misc::api::QueryRequest;

use crate::db::types::CreateAuditParams;
use crate::db::Database;

pub fn run_audit_tests(db: &Database) {
    db.with_transaction(|tx| {
        tx.create_audit(CreateAuditParams {
            timestamp: 100,
            user_id: Some(1),
            user_name: "Usuario asalas".to_string(),
            action: "Inicio de Sesión",
            details: "Usuario asalas (ID: 1) inició sesión.".to_string(),
        })?;
        tx.create_audit(CreateAuditParams {
            timestamp: 200,
            user_id: Some(1),
            user_name: "Usuario asalas".to_string(),
            action: "Creación de Comentario",
            details: "Comentario Folio: 1.".to_string(),
        })?;
        tx.create_audit(CreateAuditParams {
            timestamp: 300,
            user_id: None,
            user_name: "Sistema".to_string(),
            action: "Desactivación de Usuario",
            details: "Desactivación automática.".to_string(),
        })?;
        Ok(())
    })
    .unwrap();

    db.with_transaction(|tx| {
        assert_eq!(tx.count_audits(GetAuditRequest::default())?, 3);

        // Newest first.
        let entries = tx.get_audits(GetAuditRequest::default())?;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].timestamp, 300);
        assert_eq!(entries[0].user_id, None);
        assert_eq!(entries[0].user_name, "Sistema");
        assert_eq!(entries[2].timestamp, 100);

        let by_user = tx.get_audits(GetAuditRequest {
            user_id: Some(1),
            ..Default::default()
        })?;
        assert_eq!(by_user.len(), 2);

        let by_action = tx.get_audits(GetAuditRequest {
            action: Some("Inicio de Sesión".to_string()),
            ..Default::default()
        })?;
        assert_eq!(by_action.len(), 1);
        assert_eq!(by_action[0].timestamp, 100);

        let paged = tx.get_audits(GetAuditRequest {
            query: QueryRequest {
                limit: Some(1),
                offset: Some(2),
                ..Default::default()
            },
            ..Default::default()
        })?;
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].timestamp, 100);

        Ok(())
    })
    .unwrap();
}
