use anyhow::Result;
use log::debug;
use novedades_misc::api::user::{GetUserRequest, PatchUserRequest, User};
use novedades_misc::api::Value;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use crate::db::sql::{Select, Update};
use crate::db::types::{CreateUserParams, UserPassword};

use super::convert_values;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS usuarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL,
    role TEXT NOT NULL,
    active INTEGER NOT NULL,
    jefe_id INTEGER,
    segundo_jefe_id INTEGER,
    password TEXT NOT NULL,
    salt TEXT NOT NULL,
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_usuarios_jefe ON usuarios(jefe_id);
CREATE INDEX IF NOT EXISTS idx_usuarios_segundo_jefe ON usuarios(segundo_jefe_id);
"#;

const USER_FIELDS: [&str; 10] = [
    "id",
    "name",
    "full_name",
    "email",
    "role",
    "active",
    "jefe_id",
    "segundo_jefe_id",
    "create_time",
    "update_time",
];

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateUserParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO usuarios (name, full_name, email, role, active, jefe_id, segundo_jefe_id, password, salt, create_time, update_time)
    VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?)
    "#;
    debug!("Database create_user: {}", params.user.name);
    tx.execute(
        sql,
        params![
            params.user.name,
            params.user.full_name,
            params.user.email,
            params.user.role,
            params.user.jefe_id,
            params.user.segundo_jefe_id,
            params.user.password,
            params.salt,
            params.create_time,
            params.update_time,
        ],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn update(tx: &Transaction, patch: PatchUserRequest, update_time: u64) -> Result<()> {
    let mut update = Update::new("usuarios");

    if let Some(password) = patch.password {
        update.add_field("password", Value::Text(password));
    }
    if let Some(role) = patch.role {
        update.add_field("role", Value::Text(role));
    }
    if let Some(active) = patch.active {
        update.add_field("active", Value::Bool(active));
    }
    if patch.clear_jefe {
        update.add_field("jefe_id", Value::Null);
    } else if let Some(jefe_id) = patch.jefe_id {
        update.add_field("jefe_id", Value::Integer(jefe_id));
    }
    if patch.clear_segundo_jefe {
        update.add_field("segundo_jefe_id", Value::Null);
    } else if let Some(segundo_jefe_id) = patch.segundo_jefe_id {
        update.add_field("segundo_jefe_id", Value::Integer(segundo_jefe_id));
    }

    update.add_field("update_time", Value::Integer(update_time));

    update.add_where("id = ?", Value::Integer(patch.id));

    let (sql, values) = update.build();
    if sql.is_empty() {
        return Ok(());
    }
    let values = convert_values(values);

    debug!("Database update_user: {sql}, {values:?}");
    tx.execute(&sql, params_from_iter(values.iter()))?;

    Ok(())
}

pub fn get(tx: &Transaction, id: u64) -> Result<Option<User>> {
    let mut select = Select::new(USER_FIELDS.to_vec(), "usuarios");
    select.add_where("id = ?", Value::Integer(id));
    query_one(tx, select)
}

pub fn get_by_name(tx: &Transaction, name: &str) -> Result<Option<User>> {
    let mut select = Select::new(USER_FIELDS.to_vec(), "usuarios");
    select.add_where("name = ?", Value::Text(name.to_string()));
    query_one(tx, select)
}

pub fn has_name(tx: &Transaction, name: &str) -> Result<bool> {
    let mut select = Select::count("usuarios");
    select.add_where("name = ?", Value::Text(name.to_string()));

    let (sql, values) = select.build();
    let values = convert_values(values);

    let count: i64 = tx
        .prepare(&sql)?
        .query_row(params_from_iter(values), |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_password(tx: &Transaction, name: &str) -> Result<Option<UserPassword>> {
    let mut select = Select::new(vec!["name", "password", "salt", "active"], "usuarios");
    select.add_where("name = ?", Value::Text(name.to_string()));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_user_password: {sql}");
    let mut stmt = tx.prepare(&sql)?;
    let up = stmt
        .query_row(params_from_iter(values), |row| {
            Ok(UserPassword {
                name: row.get(0)?,
                password: row.get(1)?,
                salt: row.get(2)?,
                active: row.get(3)?,
            })
        })
        .optional()?;

    Ok(up)
}

pub fn primary_supervisor(tx: &Transaction, id: u64) -> Result<Option<u64>> {
    let jefe_id: Option<Option<u64>> = tx
        .prepare("SELECT jefe_id FROM usuarios WHERE id = ?")?
        .query_row(params![id], |row| row.get(0))
        .optional()?;
    Ok(jefe_id.flatten())
}

pub fn count_users(tx: &Transaction, req: GetUserRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_users: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;

    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_users(tx: &Transaction, req: GetUserRequest) -> Result<Vec<User>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_users: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;

    let mut users = Vec::new();
    let rows = stmt.query_map(params_from_iter(values), user_from_row)?;
    for row in rows {
        users.push(row?);
    }

    Ok(users)
}

fn query_one(tx: &Transaction, select: Select) -> Result<Option<User>> {
    let (sql, values) = select.build();
    let values = convert_values(values);

    let mut stmt = tx.prepare(&sql)?;
    let user = stmt
        .query_row(params_from_iter(values), user_from_row)
        .optional()?;
    Ok(user)
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        active: row.get(5)?,
        jefe_id: row.get(6)?,
        segundo_jefe_id: row.get(7)?,
        create_time: row.get(8)?,
        update_time: row.get(9)?,
    })
}

fn build_select_sql(count: bool, req: GetUserRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("usuarios")
    } else {
        Select::new(USER_FIELDS.to_vec(), "usuarios")
    };

    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }
    if let Some(name) = req.name {
        select.add_where("name = ?", Value::Text(name));
    }
    if let Some(role) = req.role {
        select.add_where("role = ?", Value::Text(role));
    }
    if let Some(active) = req.active {
        select.add_where("active = ?", Value::Bool(active));
    }
    if let Some(supervisor) = req.supervised_by {
        select.add_where_values(
            "(jefe_id = ? OR segundo_jefe_id = ?)",
            vec![Value::Integer(supervisor), Value::Integer(supervisor)],
        );
    }

    select.set_query(req.query, "full_name");

    select.add_order_by("full_name");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
