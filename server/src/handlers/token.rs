use chrono::Utc;
use log::{debug, error};
use novedades_misc::api::audit::AuditAction;
use novedades_misc::api::user::{TokenResponse, User};
use novedades_misc::api::{EmptyRequest, Response};

use crate::context::ServerContext;
use crate::register_handlers;

use super::record_audit;

register_handlers!(get_token);

async fn get_token(_req: EmptyRequest, op: User, sc: &ServerContext) -> Response<TokenResponse> {
    debug!("Generate token for user: {}", op.name);
    let now = Utc::now().timestamp() as u64;
    let token = match sc.jwt_generator.generate_token(&op, now) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate token: {e:#}");
            return Response::internal_server_error("failed to generate token");
        }
    };

    let result = sc.db.with_transaction(|tx| {
        record_audit(
            tx,
            Some(&op),
            AuditAction::Login,
            format!("Usuario {} (ID: {}) inició sesión.", op.full_name, op.id),
        )
    });
    if let Err(e) = result {
        error!("Failed to record login audit: {e:#}");
        return Response::database_error();
    }

    Response::with_data(token)
}
