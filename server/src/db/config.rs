use std::path::PathBuf;

use anyhow::{Context, Result};
use novedades_misc::config::{CommonConfig, PathSet};
use serde::{Deserialize, Serialize};

use super::sqlite::SqliteConnection;
use super::{Database, UnionConnection};

/// Database configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DbConfig {
    /// Database type to use
    #[serde(default = "DbConfig::default_name")]
    pub name: DbType,

    /// SQLite configuration, only valid when database type is sqlite
    #[serde(default = "SqliteConfig::default")]
    pub sqlite: SqliteConfig,
}

/// Database type
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum DbType {
    /// Use SQLite database
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl CommonConfig for DbConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            sqlite: SqliteConfig::default(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.sqlite.complete(ps).context("sqlite")?;
        Ok(())
    }
}

impl DbConfig {
    pub fn build(&self) -> Result<Database> {
        let conn = match self.name {
            DbType::Sqlite => UnionConnection::Sqlite(self.sqlite.build()?),
        };
        Ok(Database::new(conn))
    }

    fn default_name() -> DbType {
        DbType::Sqlite
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SqliteConfig {
    #[serde(default)]
    pub memory: bool,

    #[serde(skip)]
    path: PathBuf,
}

impl CommonConfig for SqliteConfig {
    fn default() -> Self {
        Self {
            memory: false,
            path: PathBuf::new(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.memory {
            return Ok(());
        }

        self.path = ps.data_dir.join("sqlite.db");

        Ok(())
    }
}

impl SqliteConfig {
    pub fn build(&self) -> Result<SqliteConnection> {
        if self.memory {
            SqliteConnection::memory()
        } else {
            SqliteConnection::open(&self.path)
        }
    }
}
