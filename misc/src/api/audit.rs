use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{QueryRequest, Request};

pub const AUDIT_PATH: &str = "/api/v1/audit";

/// Name shown for entries recorded without an authenticated actor.
pub const SYSTEM_ACTOR: &str = "Sistema";

/// The fixed vocabulary of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    CreateComment,
    AcceptComment,
    LinkUser,
    EditUser,
    ActivateUser,
    DeactivateUser,
}

impl AuditAction {
    pub const ALL: [AuditAction; 7] = [
        AuditAction::Login,
        AuditAction::CreateComment,
        AuditAction::AcceptComment,
        AuditAction::LinkUser,
        AuditAction::EditUser,
        AuditAction::ActivateUser,
        AuditAction::DeactivateUser,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AuditAction::Login => "Inicio de Sesión",
            AuditAction::CreateComment => "Creación de Comentario",
            AuditAction::AcceptComment => "Aceptación de Comentario",
            AuditAction::LinkUser => "Vinculación de Usuario",
            AuditAction::EditUser => "Edición de Usuario",
            AuditAction::ActivateUser => "Activación de Usuario",
            AuditAction::DeactivateUser => "Desactivación de Usuario",
        }
    }

    pub fn from_name(name: &str) -> Option<AuditAction> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

/// One append-only audit record. Entries are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: u64,

    pub timestamp: u64,

    /// Acting user, absent for system-originated entries.
    pub user_id: Option<u64>,

    /// Display-name snapshot taken when the entry was written, so renames
    /// and deactivations do not rewrite history.
    pub user_name: String,

    pub action: String,

    pub details: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetAuditRequest {
    pub user_id: Option<u64>,

    pub action: Option<String>,

    pub query: QueryRequest,
}

impl Request for GetAuditRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.user_id = parse_from_map!(fields, "user_id");

        self.action = fields.remove("action");
        if let Some(ref action) = self.action {
            if AuditAction::from_name(action).is_none() {
                bail!("unknown audit action '{action}'");
            }
        }

        self.query.complete(fields)?;

        Ok(())
    }
}
