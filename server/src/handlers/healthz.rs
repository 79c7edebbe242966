use actix_web::HttpResponse;
use chrono::Utc;
use novedades_misc::api::{HealthResponse, Response};

use super::convert_response;

/// Liveness probe, unauthenticated.
pub async fn get_healthz_handler() -> HttpResponse {
    let now = Utc::now().timestamp() as u64;
    convert_response(Response::with_data(HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
    }))
}
