mod audit;
mod comment;
mod factor;
mod user;

use std::path::Path;

use anyhow::Result;
use novedades_misc::api::audit::{AuditEntry, GetAuditRequest};
use novedades_misc::api::comment::{Comment, GetCommentRequest};
use novedades_misc::api::factor::{Factor, GetFactorRequest, GetSubFactorRequest, SubFactor};
use novedades_misc::api::user::{GetUserRequest, PatchUserRequest, User};
use novedades_misc::api::Value;
use rusqlite::types::Value as DbValue;
use rusqlite::Connection as RawConnection;
use rusqlite::Transaction as RawTransaction;

use super::types::{
    Connection, CreateAuditParams, CreateCommentParams, CreateUserParams, Transaction,
    UserPassword,
};

/// SQLite-based database implementation, suitable for single-node
/// deployments. Supports both file-based and in-memory databases.
pub struct SqliteConnection {
    conn: RawConnection,
}

pub struct SqliteTransaction<'a> {
    tx: RawTransaction<'a>,
}

impl SqliteConnection {
    /// Opens a SQLite database file, creating it and all required tables if
    /// they don't exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = RawConnection::open(path)?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database. Content is lost when the program
    /// exits; recommended for testing only.
    pub fn memory() -> Result<Self> {
        let conn = RawConnection::open_in_memory()?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    fn init_tables(conn: &RawConnection) -> Result<()> {
        user::create_table(conn)?;
        comment::create_table(conn)?;
        factor::create_tables(conn)?;
        audit::create_table(conn)?;
        Ok(())
    }
}

impl<'a> Connection<'a, SqliteTransaction<'a>> for SqliteConnection {
    fn transaction(&'a mut self) -> Result<SqliteTransaction<'a>> {
        let tx = self.conn.transaction()?;
        Ok(SqliteTransaction { tx })
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<u64> {
        user::create(&self.tx, params)
    }

    fn update_user(&self, patch: PatchUserRequest, update_time: u64) -> Result<()> {
        user::update(&self.tx, patch, update_time)
    }

    fn get_user(&self, id: u64) -> Result<Option<User>> {
        user::get(&self.tx, id)
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        user::get_by_name(&self.tx, name)
    }

    fn has_user_name(&self, name: &str) -> Result<bool> {
        user::has_name(&self.tx, name)
    }

    fn count_users(&self, req: GetUserRequest) -> Result<u64> {
        user::count_users(&self.tx, req)
    }

    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>> {
        user::get_users(&self.tx, req)
    }

    fn get_user_password(&self, name: &str) -> Result<Option<UserPassword>> {
        user::get_password(&self.tx, name)
    }

    fn primary_supervisor(&self, id: u64) -> Result<Option<u64>> {
        user::primary_supervisor(&self.tx, id)
    }

    fn create_comment(&self, params: CreateCommentParams) -> Result<u64> {
        comment::create(&self.tx, params)
    }

    fn get_comment(&self, folio: u64) -> Result<Option<Comment>> {
        comment::get(&self.tx, folio)
    }

    fn count_comments(&self, req: GetCommentRequest) -> Result<u64> {
        comment::count_comments(&self.tx, req)
    }

    fn get_comments(&self, req: GetCommentRequest) -> Result<Vec<Comment>> {
        comment::get_comments(&self.tx, req)
    }

    fn accept_comment(&self, folio: u64, observacion: &str, accept_time: u64) -> Result<bool> {
        comment::accept(&self.tx, folio, observacion, accept_time)
    }

    fn create_factor(&self, name: &str) -> Result<u64> {
        factor::create_factor(&self.tx, name)
    }

    fn has_factor(&self, id: u64) -> Result<bool> {
        factor::has_factor(&self.tx, id)
    }

    fn get_factors(&self, req: GetFactorRequest) -> Result<Vec<Factor>> {
        factor::get_factors(&self.tx, req)
    }

    fn create_subfactor(&self, name: &str, factor_id: u64) -> Result<u64> {
        factor::create_subfactor(&self.tx, name, factor_id)
    }

    fn has_subfactor(&self, id: u64) -> Result<bool> {
        factor::has_subfactor(&self.tx, id)
    }

    fn get_subfactors(&self, req: GetSubFactorRequest) -> Result<Vec<SubFactor>> {
        factor::get_subfactors(&self.tx, req)
    }

    fn create_audit(&self, params: CreateAuditParams) -> Result<()> {
        audit::create(&self.tx, params)
    }

    fn count_audits(&self, req: GetAuditRequest) -> Result<u64> {
        audit::count_audits(&self.tx, req)
    }

    fn get_audits(&self, req: GetAuditRequest) -> Result<Vec<AuditEntry>> {
        audit::get_audits(&self.tx, req)
    }

    fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

/// Converts builder values into rusqlite parameters.
pub fn convert_values(values: Vec<Value>) -> Vec<DbValue> {
    values
        .into_iter()
        .map(|value| match value {
            Value::Text(text) => DbValue::Text(text),
            Value::Integer(integer) => DbValue::Integer(integer as i64),
            Value::Bool(boolean) => DbValue::Integer(boolean as i64),
            Value::Null => DbValue::Null,
        })
        .collect()
}
