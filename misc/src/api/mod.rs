pub mod audit;
pub mod comment;
pub mod factor;
pub mod user;

use std::collections::HashMap;
use std::fmt::Display;

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const HEALTHZ_PATH: &str = "/healthz";

pub const HEADER_AUTHORIZATION: &str = "Authorization";

#[macro_export]
macro_rules! parse_from_map {
    ($fields:expr,$field:expr) => {
        match $fields.get($field) {
            Some(value) => match value.parse() {
                Ok(value) => Some(value),
                Err(_) => bail!(format!("{} is invalid", $field)),
            },
            None => None,
        }
    };
}

#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Integer(u64),
    Bool(bool),
    Null,
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{text}"),
            Value::Integer(integer) => write!(f, "{integer}"),
            Value::Bool(boolean) => write!(f, "{boolean}"),
            Value::Null => write!(f, "null"),
        }
    }
}

/// A request that can be completed from URL query-string fields.
pub trait Request: Default {
    fn complete(&mut self, _fields: HashMap<String, String>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EmptyRequest;

impl Request for EmptyRequest {}

/// Common pagination and search fields shared by all list requests.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct QueryRequest {
    pub offset: Option<u64>,
    pub limit: Option<u64>,

    pub search: Option<String>,
}

const DEFAULT_LIMIT: u64 = 10;

impl Request for QueryRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.offset = parse_from_map!(fields, "offset");
        self.limit = parse_from_map!(fields, "limit");
        if self.limit.is_none() {
            self.limit = Some(DEFAULT_LIMIT);
        }
        self.search = fields.remove("search");

        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct Response<T: Serialize + DeserializeOwned> {
    pub code: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub const STATUS_OK: u32 = 200;
pub const STATUS_BAD_REQUEST: u32 = 400;
pub const STATUS_UNAUTHORIZED: u32 = 401;
pub const STATUS_FORBIDDEN: u32 = 403;
pub const STATUS_NOT_FOUND: u32 = 404;
pub const STATUS_INTERNAL_SERVER_ERROR: u32 = 500;

impl<T: Serialize + DeserializeOwned> Response<T> {
    pub fn ok() -> Self {
        Self {
            code: STATUS_OK,
            message: None,
            data: None,
        }
    }

    pub fn with_data(data: T) -> Self {
        Self {
            code: STATUS_OK,
            message: None,
            data: Some(data),
        }
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self {
            code: STATUS_BAD_REQUEST,
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn unauthorized(message: impl ToString) -> Self {
        Self {
            code: STATUS_UNAUTHORIZED,
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn forbidden() -> Self {
        Self {
            code: STATUS_FORBIDDEN,
            message: Some(String::from("Operation not allowed")),
            data: None,
        }
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self {
            code: STATUS_NOT_FOUND,
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn resource_not_found() -> Self {
        Self::not_found("Resource not found")
    }

    pub fn internal_server_error(message: impl ToString) -> Self {
        Self {
            code: STATUS_INTERNAL_SERVER_ERROR,
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn database_error() -> Self {
        Self::internal_server_error("Database error")
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct ListResponse<T: Serialize + DeserializeOwned> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub timestamp: u64,
}
