use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{QueryRequest, Request};

pub const FACTOR_PATH: &str = "/api/v1/factor";
pub const SUBFACTOR_PATH: &str = "/api/v1/subfactor";

/// Top-level evaluation category. Comments are classified under a
/// sub-factor, which belongs to exactly one factor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Factor {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubFactor {
    pub id: u64,
    pub name: String,
    pub factor_id: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct PutFactorRequest {
    pub name: String,
}

impl Request for PutFactorRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.name = fields.remove("name").unwrap_or_default();
        if self.name.is_empty() {
            bail!("name is required to put factor");
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct PutSubFactorRequest {
    pub name: String,
    pub factor_id: u64,
}

impl Request for PutSubFactorRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.name = fields.remove("name").unwrap_or_default();
        if self.name.is_empty() {
            bail!("name is required to put subfactor");
        }
        self.factor_id = match parse_from_map!(fields, "factor_id") {
            Some(id) => id,
            None => bail!("factor_id is required to put subfactor"),
        };
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetFactorRequest {
    pub id: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetFactorRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        if self.id.is_some() {
            return Ok(());
        }
        self.query.complete(fields)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GetSubFactorRequest {
    pub id: Option<u64>,

    pub factor_id: Option<u64>,

    pub query: QueryRequest,
}

impl Request for GetSubFactorRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = parse_from_map!(fields, "id");
        if self.id.is_some() {
            return Ok(());
        }
        self.factor_id = parse_from_map!(fields, "factor_id");
        self.query.complete(fields)?;
        Ok(())
    }
}
