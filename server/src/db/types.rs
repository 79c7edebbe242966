use anyhow::Result;
use novedades_misc::api::audit::{AuditEntry, GetAuditRequest};
use novedades_misc::api::comment::{Comment, GetCommentRequest};
use novedades_misc::api::factor::{Factor, GetFactorRequest, GetSubFactorRequest, SubFactor};
use novedades_misc::api::user::{GetUserRequest, PatchUserRequest, PutUserRequest, User};

pub trait Connection<'a, T>
where
    T: Transaction + 'a,
{
    fn transaction(&'a mut self) -> Result<T>;
}

pub trait Transaction {
    fn create_user(&self, params: CreateUserParams) -> Result<u64>;
    fn update_user(&self, patch: PatchUserRequest, update_time: u64) -> Result<()>;
    fn get_user(&self, id: u64) -> Result<Option<User>>;
    fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;
    fn has_user_name(&self, name: &str) -> Result<bool>;
    fn count_users(&self, req: GetUserRequest) -> Result<u64>;
    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>>;
    fn get_user_password(&self, name: &str) -> Result<Option<UserPassword>>;

    /// One step of the primary-supervisor chain. Returns None when the user
    /// does not exist or has no primary supervisor.
    fn primary_supervisor(&self, id: u64) -> Result<Option<u64>>;

    fn create_comment(&self, params: CreateCommentParams) -> Result<u64>;
    fn get_comment(&self, folio: u64) -> Result<Option<Comment>>;
    fn count_comments(&self, req: GetCommentRequest) -> Result<u64>;
    fn get_comments(&self, req: GetCommentRequest) -> Result<Vec<Comment>>;

    /// Compare-and-set acceptance: flips estado Pendiente -> Aceptada.
    /// Returns false when the comment was not Pendiente anymore, leaving the
    /// row untouched.
    fn accept_comment(&self, folio: u64, observacion: &str, accept_time: u64) -> Result<bool>;

    fn create_factor(&self, name: &str) -> Result<u64>;
    fn has_factor(&self, id: u64) -> Result<bool>;
    fn get_factors(&self, req: GetFactorRequest) -> Result<Vec<Factor>>;
    fn create_subfactor(&self, name: &str, factor_id: u64) -> Result<u64>;
    fn has_subfactor(&self, id: u64) -> Result<bool>;
    fn get_subfactors(&self, req: GetSubFactorRequest) -> Result<Vec<SubFactor>>;

    fn create_audit(&self, params: CreateAuditParams) -> Result<()>;
    fn count_audits(&self, req: GetAuditRequest) -> Result<u64>;
    fn get_audits(&self, req: GetAuditRequest) -> Result<Vec<AuditEntry>>;

    fn commit(self) -> Result<()>;
    fn rollback(self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct CreateUserParams {
    pub user: PutUserRequest,
    pub salt: String,
    pub create_time: u64,
    pub update_time: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct UserPassword {
    pub name: String,
    pub password: String,
    pub salt: String,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct CreateCommentParams {
    pub kind: String,
    pub motivo: String,
    pub funcionario_id: u64,
    pub jefe_id: u64,
    pub subfactor_id: u64,
    pub create_time: u64,
}

#[derive(Debug, Default)]
pub struct CreateAuditParams {
    pub timestamp: u64,
    pub user_id: Option<u64>,
    pub user_name: String,
    pub action: &'static str,
    pub details: String,
}
