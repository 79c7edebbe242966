use actix_web::HttpResponse;
use anyhow::Result;
use chrono::Utc;
use novedades_misc::api::audit::{AuditAction, SYSTEM_ACTOR};
use novedades_misc::api::user::User;
use novedades_misc::api::{self, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::types::{CreateAuditParams, Transaction};

pub mod audit;
pub mod comment;
pub mod factor;
pub mod healthz;
pub mod token;
pub mod user;

#[macro_export]
macro_rules! register_handlers {
    ($handler:ident) => {
        paste::paste! {
            pub async fn [< $handler _handler >](
                req: actix_web::HttpRequest,
                sc: actix_web::web::Data<std::sync::Arc<$crate::context::ServerContext>>,
            ) -> actix_web::HttpResponse {
                let f = || async move {
                    let user = $crate::auth_request!(sc.as_ref(), req);
                    let req = $crate::parse_request!(req);
                    $handler(req, user, sc.as_ref()).await
                };
                let resp = f().await;
                $crate::handlers::convert_response(resp)
            }
        }
    };

    ($handler:ident, $($rest:ident),* $(,)?) => {
        $crate::register_handlers!($handler);
        $crate::register_handlers!($($rest),*);
    };
}

pub fn convert_response<T>(resp: Response<T>) -> HttpResponse
where
    T: Serialize + DeserializeOwned,
{
    let mut http_resp = match resp.code {
        api::STATUS_OK => HttpResponse::Ok(),
        api::STATUS_BAD_REQUEST => HttpResponse::BadRequest(),
        api::STATUS_UNAUTHORIZED => HttpResponse::Unauthorized(),
        api::STATUS_FORBIDDEN => HttpResponse::Forbidden(),
        api::STATUS_NOT_FOUND => HttpResponse::NotFound(),
        _ => HttpResponse::InternalServerError(),
    };
    http_resp.json(resp)
}

/// Appends an audit entry in the same transaction as the action it records,
/// so a rolled-back action leaves no trace and a recorded action is never
/// lost.
pub fn record_audit(
    tx: &dyn Transaction,
    actor: Option<&User>,
    action: AuditAction,
    details: String,
) -> Result<()> {
    let now = Utc::now().timestamp() as u64;
    tx.create_audit(CreateAuditParams {
        timestamp: now,
        user_id: actor.map(|user| user.id),
        user_name: actor
            .map(|user| user.full_name.clone())
            .unwrap_or_else(|| String::from(SYSTEM_ACTOR)),
        action: action.name(),
        details,
    })
}
