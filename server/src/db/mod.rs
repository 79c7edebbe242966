mod sql;
mod sqlite;

#[cfg(test)]
mod tests;

pub mod config;
pub mod types;

use std::cell::RefCell;
use std::sync::Mutex;

use anyhow::{bail, Result};
use novedades_misc::api::audit::{AuditEntry, GetAuditRequest};
use novedades_misc::api::comment::{Comment, GetCommentRequest};
use novedades_misc::api::factor::{Factor, GetFactorRequest, GetSubFactorRequest, SubFactor};
use novedades_misc::api::user::{GetUserRequest, PatchUserRequest, User};
use sqlite::{SqliteConnection, SqliteTransaction};
use types::{
    Connection, CreateAuditParams, CreateCommentParams, CreateUserParams, Transaction,
    UserPassword,
};

pub struct Database {
    conn: Mutex<RefCell<UnionConnection>>,
}

impl Database {
    pub fn new(conn: UnionConnection) -> Self {
        Self {
            conn: Mutex::new(RefCell::new(conn)),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        let conn = SqliteConnection::memory().unwrap();
        Self::new(UnionConnection::Sqlite(conn))
    }

    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Transaction) -> Result<T>,
    {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(e) => bail!("failed to lock connection: {:#}", e),
        };
        let mut conn = conn.borrow_mut();
        let tx = conn.transaction()?;

        let result = f(&tx);

        if result.is_ok() {
            tx.commit()
        } else {
            tx.rollback()
        }?;

        result
    }
}

pub enum UnionConnection {
    Sqlite(SqliteConnection),
}

pub enum UnionTransaction<'a> {
    Sqlite(SqliteTransaction<'a>),
}

impl<'a> Connection<'a, UnionTransaction<'a>> for UnionConnection {
    fn transaction(&'a mut self) -> Result<UnionTransaction<'a>> {
        match self {
            UnionConnection::Sqlite(conn) => conn.transaction().map(UnionTransaction::Sqlite),
        }
    }
}

impl Transaction for UnionTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_user(params),
        }
    }

    fn update_user(&self, patch: PatchUserRequest, update_time: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_user(patch, update_time),
        }
    }

    fn get_user(&self, id: u64) -> Result<Option<User>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user(id),
        }
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user_by_name(name),
        }
    }

    fn has_user_name(&self, name: &str) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_user_name(name),
        }
    }

    fn count_users(&self, req: GetUserRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_users(req),
        }
    }

    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_users(req),
        }
    }

    fn get_user_password(&self, name: &str) -> Result<Option<UserPassword>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user_password(name),
        }
    }

    fn primary_supervisor(&self, id: u64) -> Result<Option<u64>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.primary_supervisor(id),
        }
    }

    fn create_comment(&self, params: CreateCommentParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_comment(params),
        }
    }

    fn get_comment(&self, folio: u64) -> Result<Option<Comment>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_comment(folio),
        }
    }

    fn count_comments(&self, req: GetCommentRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_comments(req),
        }
    }

    fn get_comments(&self, req: GetCommentRequest) -> Result<Vec<Comment>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_comments(req),
        }
    }

    fn accept_comment(&self, folio: u64, observacion: &str, accept_time: u64) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.accept_comment(folio, observacion, accept_time),
        }
    }

    fn create_factor(&self, name: &str) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_factor(name),
        }
    }

    fn has_factor(&self, id: u64) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_factor(id),
        }
    }

    fn get_factors(&self, req: GetFactorRequest) -> Result<Vec<Factor>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_factors(req),
        }
    }

    fn create_subfactor(&self, name: &str, factor_id: u64) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_subfactor(name, factor_id),
        }
    }

    fn has_subfactor(&self, id: u64) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.has_subfactor(id),
        }
    }

    fn get_subfactors(&self, req: GetSubFactorRequest) -> Result<Vec<SubFactor>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_subfactors(req),
        }
    }

    fn create_audit(&self, params: CreateAuditParams) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_audit(params),
        }
    }

    fn count_audits(&self, req: GetAuditRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_audits(req),
        }
    }

    fn get_audits(&self, req: GetAuditRequest) -> Result<Vec<AuditEntry>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_audits(req),
        }
    }

    fn commit(self) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.commit(),
        }
    }

    fn rollback(self) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.rollback(),
        }
    }
}
