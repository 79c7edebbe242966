use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{QueryRequest, Request};

pub const TOKEN_PATH: &str = "/api/v1/token";
pub const USER_PATH: &str = "/api/v1/user";

/// The closed set of roles in the organization. Role names are the
/// authorization keys; everything role-dependent is resolved through
/// [`Role::from_name`] so an unrecognized name never grants anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    JefaSalud,
    EncargadoRecinto,
    EncargadoUnidad,
    Funcionario,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::JefaSalud,
        Role::EncargadoRecinto,
        Role::EncargadoUnidad,
        Role::Funcionario,
    ];

    pub fn from_name(name: &str) -> Option<Role> {
        match name {
            "Admin" => Some(Role::Admin),
            "Jefa Salud" => Some(Role::JefaSalud),
            "Encargado de Recinto" => Some(Role::EncargadoRecinto),
            "Encargado de Unidad" => Some(Role::EncargadoUnidad),
            "Funcionario" => Some(Role::Funcionario),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::JefaSalud => "Jefa Salud",
            Role::EncargadoRecinto => "Encargado de Recinto",
            Role::EncargadoUnidad => "Encargado de Unidad",
            Role::Funcionario => "Funcionario",
        }
    }
}

/// A user of the service. The supervisor links are the reporting hierarchy:
/// `jefe_id` is the primary chain (followed transitively), `segundo_jefe_id`
/// is a one-level override that only participates in direct checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,

    pub name: String,

    pub full_name: String,

    pub email: String,

    /// Role name, one of [`Role::ALL`]. Kept as the raw name so that rows
    /// carrying an unknown role keep failing closed instead of erroring.
    pub role: String,

    pub active: bool,

    pub jefe_id: Option<u64>,

    pub segundo_jefe_id: Option<u64>,

    pub create_time: u64,

    pub update_time: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct PutUserRequest {
    pub name: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub jefe_id: Option<u64>,
    pub segundo_jefe_id: Option<u64>,
}

impl Request for PutUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.name = fields.remove("name").unwrap_or_default();
        if self.name.is_empty() {
            bail!("name is required to put user");
        }
        if self.name == "admin" {
            bail!("name cannot be 'admin'");
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            bail!("invalid name");
        }

        self.full_name = fields.remove("full_name").unwrap_or_default();
        if self.full_name.is_empty() {
            bail!("full_name is required to put user");
        }

        self.email = fields.remove("email").unwrap_or_default();
        if self.email.is_empty() {
            bail!("email is required to put user");
        }

        self.password = fields.remove("password").unwrap_or_default();
        if self.password.is_empty() {
            bail!("password is required to put user");
        }

        self.role = fields.remove("role").unwrap_or_default();
        if Role::from_name(&self.role).is_none() {
            bail!("unknown role '{}'", self.role);
        }

        self.jefe_id = parse_from_map!(fields, "jefe_id");
        self.segundo_jefe_id = parse_from_map!(fields, "segundo_jefe_id");

        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetUserRequest {
    pub id: Option<u64>,

    pub name: Option<String>,

    pub role: Option<String>,

    pub active: Option<bool>,

    /// List users directly supervised by this user, through either
    /// supervisor link.
    pub supervised_by: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        self.name = fields.remove("name");
        if self.id.is_some() || self.name.is_some() {
            return Ok(());
        }

        self.role = fields.remove("role");
        if let Some(ref role) = self.role {
            if Role::from_name(role).is_none() {
                bail!("unknown role '{role}'");
            }
        }
        self.active = parse_from_map!(fields, "active");
        self.supervised_by = parse_from_map!(fields, "supervised_by");

        self.query.complete(fields)?;

        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct PatchUserRequest {
    pub id: u64,

    pub password: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,

    pub jefe_id: Option<u64>,
    pub segundo_jefe_id: Option<u64>,

    /// Clearing a supervisor link is distinct from leaving it untouched.
    pub clear_jefe: bool,
    pub clear_segundo_jefe: bool,
}

impl PatchUserRequest {
    /// True if the patch touches anything beyond the user's own password.
    pub fn is_admin_patch(&self) -> bool {
        self.role.is_some()
            || self.active.is_some()
            || self.jefe_id.is_some()
            || self.segundo_jefe_id.is_some()
            || self.clear_jefe
            || self.clear_segundo_jefe
    }
}

impl Request for PatchUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = match parse_from_map!(fields, "id") {
            Some(id) => id,
            None => bail!("id is required to patch user"),
        };

        self.password = fields.remove("password");
        self.role = fields.remove("role");
        if let Some(ref role) = self.role {
            if Role::from_name(role).is_none() {
                bail!("unknown role '{role}'");
            }
        }
        self.active = parse_from_map!(fields, "active");

        self.jefe_id = parse_from_map!(fields, "jefe_id");
        self.segundo_jefe_id = parse_from_map!(fields, "segundo_jefe_id");
        self.clear_jefe = parse_from_map!(fields, "clear_jefe").unwrap_or_default();
        self.clear_segundo_jefe = parse_from_map!(fields, "clear_segundo_jefe").unwrap_or_default();

        if self.clear_jefe && self.jefe_id.is_some() {
            bail!("cannot set and clear jefe_id at the same time");
        }
        if self.clear_segundo_jefe && self.segundo_jefe_id.is_some() {
            bail!("cannot set and clear segundo_jefe_id at the same time");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expire_after: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        for role in Role::ALL {
            assert_eq!(Role::from_name(role.name()), Some(role));
        }
        assert_eq!(Role::from_name("Gerente"), None);
        assert_eq!(Role::from_name("admin"), None);
        assert_eq!(Role::from_name(""), None);
    }

    #[test]
    fn test_put_user_complete() {
        let fields: HashMap<String, String> = [
            ("name", "jperez"),
            ("full_name", "Juana Perez"),
            ("email", "jperez@example.org"),
            ("password", "secret123"),
            ("role", "Encargado de Unidad"),
            ("jefe_id", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut req = PutUserRequest::default();
        req.complete(fields).unwrap();
        assert_eq!(
            req,
            PutUserRequest {
                name: "jperez".to_string(),
                full_name: "Juana Perez".to_string(),
                email: "jperez@example.org".to_string(),
                password: "secret123".to_string(),
                role: "Encargado de Unidad".to_string(),
                jefe_id: Some(3),
                segundo_jefe_id: None,
            }
        );

        // Unknown roles are rejected at the boundary.
        let fields: HashMap<String, String> = [
            ("name", "x"),
            ("full_name", "X"),
            ("email", "x@example.org"),
            ("password", "p"),
            ("role", "Gerente"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let mut req = PutUserRequest::default();
        assert!(req.complete(fields).is_err());
    }

    #[test]
    fn test_patch_user_complete() {
        let fields: HashMap<String, String> = [("id", "7"), ("clear_segundo_jefe", "true")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut req = PatchUserRequest::default();
        req.complete(fields).unwrap();
        assert_eq!(req.id, 7);
        assert!(req.clear_segundo_jefe);
        assert!(req.is_admin_patch());

        let fields: HashMap<String, String> =
            [("id", "7"), ("segundo_jefe_id", "2"), ("clear_segundo_jefe", "true")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        let mut req = PatchUserRequest::default();
        assert!(req.complete(fields).is_err());

        let fields: HashMap<String, String> = [("id", "7"), ("password", "new")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut req = PatchUserRequest::default();
        req.complete(fields).unwrap();
        assert!(!req.is_admin_patch());
    }
}
