use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{parse_from_map, time};

use super::{QueryRequest, Request};

pub const COMMENT_PATH: &str = "/api/v1/comment";

/// Kind of an annotation: merit or demerit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    Favorable,
    Desfavorable,
}

impl CommentKind {
    pub fn from_name(name: &str) -> Option<CommentKind> {
        match name {
            "Favorable" => Some(CommentKind::Favorable),
            "Desfavorable" => Some(CommentKind::Desfavorable),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommentKind::Favorable => "Favorable",
            CommentKind::Desfavorable => "Desfavorable",
        }
    }
}

/// Lifecycle of an annotation. The only transition is
/// Pendiente -> Aceptada, performed once by the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentState {
    Pendiente,
    Aceptada,
}

impl CommentState {
    pub fn from_name(name: &str) -> Option<CommentState> {
        match name {
            "Pendiente" => Some(CommentState::Pendiente),
            "Aceptada" => Some(CommentState::Aceptada),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommentState::Pendiente => "Pendiente",
            CommentState::Aceptada => "Aceptada",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub folio: u64,

    pub kind: CommentKind,

    /// Rationale written by the supervisor who created the annotation.
    pub motivo: String,

    /// Acknowledgment written by the subject on acceptance.
    pub observacion: Option<String>,

    pub estado: CommentState,

    pub funcionario_id: u64,

    pub jefe_id: u64,

    pub subfactor_id: u64,

    pub create_time: u64,

    pub accept_time: Option<u64>,
}

#[derive(Debug, Default, PartialEq)]
pub struct PutCommentRequest {
    pub funcionario_id: u64,
    pub kind: String,
    pub motivo: String,
    pub subfactor_id: u64,
}

impl Request for PutCommentRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.funcionario_id = match parse_from_map!(fields, "funcionario_id") {
            Some(id) => id,
            None => bail!("funcionario_id is required to put comment"),
        };

        self.kind = fields.remove("kind").unwrap_or_default();
        if CommentKind::from_name(&self.kind).is_none() {
            bail!("kind must be 'Favorable' or 'Desfavorable'");
        }

        self.motivo = fields.remove("motivo").unwrap_or_default();
        if self.motivo.is_empty() {
            bail!("motivo is required to put comment");
        }

        self.subfactor_id = match parse_from_map!(fields, "subfactor_id") {
            Some(id) => id,
            None => bail!("subfactor_id is required to put comment"),
        };

        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetCommentRequest {
    pub folio: Option<u64>,

    pub funcionario_id: Option<u64>,

    pub kind: Option<String>,

    pub estado: Option<String>,

    pub factor_id: Option<u64>,

    pub subfactor_id: Option<u64>,

    /// Creation-date range, inclusive, unix seconds. Parsed from
    /// YYYY-MM-DD or raw timestamps.
    pub created_after: Option<u64>,
    pub created_before: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetCommentRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.folio = parse_from_map!(fields, "folio");
        if self.folio.is_some() {
            return Ok(());
        }

        self.funcionario_id = parse_from_map!(fields, "funcionario_id");

        self.kind = fields.remove("kind");
        if let Some(ref kind) = self.kind {
            if CommentKind::from_name(kind).is_none() {
                bail!("kind must be 'Favorable' or 'Desfavorable'");
            }
        }

        self.estado = fields.remove("estado");
        if let Some(ref estado) = self.estado {
            if CommentState::from_name(estado).is_none() {
                bail!("estado must be 'Pendiente' or 'Aceptada'");
            }
        }

        self.factor_id = parse_from_map!(fields, "factor_id");
        self.subfactor_id = parse_from_map!(fields, "subfactor_id");

        if let Some(s) = fields.remove("created_after") {
            self.created_after = Some(time::parse_time(&s)?);
        }
        if let Some(s) = fields.remove("created_before") {
            self.created_before = Some(time::parse_time(&s)?);
        }

        self.query.complete(fields)?;

        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct AcceptCommentRequest {
    pub folio: u64,
    pub observacion: Option<String>,
}

impl Request for AcceptCommentRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.folio = match parse_from_map!(fields, "folio") {
            Some(folio) => folio,
            None => bail!("folio is required to accept comment"),
        };
        self.observacion = fields.remove("observacion");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_state_names() {
        assert_eq!(CommentKind::from_name("Favorable"), Some(CommentKind::Favorable));
        assert_eq!(CommentKind::from_name("favorable"), None);
        assert_eq!(CommentState::from_name("Aceptada"), Some(CommentState::Aceptada));
        assert_eq!(CommentState::from_name("Rechazada"), None);
    }

    #[test]
    fn test_get_comment_complete() {
        let fields: HashMap<String, String> = [
            ("funcionario_id", "12"),
            ("kind", "Desfavorable"),
            ("estado", "Aceptada"),
            ("created_after", "2025-01-01"),
            ("limit", "5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut req = GetCommentRequest::default();
        req.complete(fields).unwrap();
        assert_eq!(req.funcionario_id, Some(12));
        assert_eq!(req.kind.as_deref(), Some("Desfavorable"));
        assert_eq!(req.estado.as_deref(), Some("Aceptada"));
        assert!(req.created_after.is_some());
        assert_eq!(req.query.limit, Some(5));

        // folio short-circuits every other filter
        let fields: HashMap<String, String> = [("folio", "44"), ("kind", "bad-value")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut req = GetCommentRequest::default();
        req.complete(fields).unwrap();
        assert_eq!(req.folio, Some(44));
        assert_eq!(req.kind, None);

        let fields: HashMap<String, String> = [("kind", "Neutral")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut req = GetCommentRequest::default();
        assert!(req.complete(fields).is_err());
    }
}
