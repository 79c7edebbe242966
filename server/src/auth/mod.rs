mod basic;
mod bearer_token;

pub mod jwt;
pub mod rsa;

use actix_web::HttpRequest;
use novedades_misc::api;
use novedades_misc::api::user::User;

use crate::context::ServerContext;

/// The configured administrator account has no database row; it is
/// synthesized with this reserved id (sqlite rowids start at 1).
pub const BOOTSTRAP_ADMIN_ID: u64 = 0;

pub fn bootstrap_admin_user() -> User {
    User {
        id: BOOTSTRAP_ADMIN_ID,
        name: String::from("admin"),
        full_name: String::from("Administrador"),
        email: String::new(),
        role: String::from("Admin"),
        active: true,
        jefe_id: None,
        segundo_jefe_id: None,
        create_time: 0,
        update_time: 0,
    }
}

#[macro_export]
macro_rules! auth_request {
    ($sc:expr, $req:expr) => {
        match $crate::auth::auth_request_raw($sc, &$req) {
            $crate::auth::AuthResult::Ok(user) => user,
            $crate::auth::AuthResult::Failed(msg) => {
                return novedades_misc::api::Response::unauthorized(msg)
            }
        }
    };
}

pub enum AuthResult {
    Ok(User),
    Failed(String),
}

pub fn auth_request_raw(sc: &ServerContext, req: &HttpRequest) -> AuthResult {
    let auth_header = match req.headers().get(api::HEADER_AUTHORIZATION) {
        Some(header) => match header.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => return AuthResult::failed("invalid authorization header value"),
        },
        None => return AuthResult::failed("missing authorization"),
    };

    let fields = auth_header.split_whitespace().collect::<Vec<&str>>();
    if fields.len() != 2 {
        return AuthResult::failed("invalid authorization header format");
    }

    let auth_type = fields[0];
    let auth = fields[1].to_string();

    let is_remote = if let Some(addr) = req.connection_info().peer_addr() {
        addr != "127.0.0.1"
    } else {
        true
    };

    match auth_type.to_lowercase().as_str() {
        "basic" => match basic::auth_basic(sc, auth, is_remote) {
            Ok(user) => AuthResult::Ok(user),
            Err(e) => AuthResult::Failed(format!("basic auth failed: {e:#}")),
        },
        "bearer" => match bearer_token::auth_bearer_token(sc, auth, is_remote) {
            Ok(user) => AuthResult::Ok(user),
            Err(e) => AuthResult::Failed(format!("bearer token auth failed: {e:#}")),
        },
        _ => AuthResult::failed("unsupported authorization type"),
    }
}

impl AuthResult {
    fn failed(msg: impl ToString) -> Self {
        Self::Failed(msg.to_string())
    }
}
