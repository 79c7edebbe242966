use anyhow::Result;
use log::debug;
use novedades_misc::api::factor::{Factor, GetFactorRequest, GetSubFactorRequest, SubFactor};
use novedades_misc::api::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::db::sql::Select;

use super::convert_values;

const CREATE_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS factores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS subfactores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    factor_id INTEGER NOT NULL
);
"#;

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES_SQL)?;
    Ok(())
}

pub fn create_factor(tx: &Transaction, name: &str) -> Result<u64> {
    debug!("Database create_factor: {name}");
    tx.execute("INSERT INTO factores (name) VALUES (?)", params![name])?;
    Ok(tx.last_insert_rowid() as u64)
}

pub fn has_factor(tx: &Transaction, id: u64) -> Result<bool> {
    let count: i64 = tx
        .prepare("SELECT COUNT(1) FROM factores WHERE id = ?")?
        .query_row(params![id], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_factors(tx: &Transaction, req: GetFactorRequest) -> Result<Vec<Factor>> {
    let mut select = Select::new(vec!["id", "name"], "factores");
    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }
    select.set_query(req.query, "name");
    select.add_order_by("name");

    let (sql, values) = select.build();
    let values = convert_values(values);
    debug!("Database get_factors: {sql}");

    let mut stmt = tx.prepare(&sql)?;
    let mut factors = Vec::new();
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(Factor {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    for row in rows {
        factors.push(row?);
    }

    Ok(factors)
}

pub fn create_subfactor(tx: &Transaction, name: &str, factor_id: u64) -> Result<u64> {
    debug!("Database create_subfactor: {name} under factor {factor_id}");
    tx.execute(
        "INSERT INTO subfactores (name, factor_id) VALUES (?, ?)",
        params![name, factor_id],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

pub fn has_subfactor(tx: &Transaction, id: u64) -> Result<bool> {
    let count: i64 = tx
        .prepare("SELECT COUNT(1) FROM subfactores WHERE id = ?")?
        .query_row(params![id], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_subfactors(tx: &Transaction, req: GetSubFactorRequest) -> Result<Vec<SubFactor>> {
    let mut select = Select::new(vec!["id", "name", "factor_id"], "subfactores");
    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }
    if let Some(factor_id) = req.factor_id {
        select.add_where("factor_id = ?", Value::Integer(factor_id));
    }
    select.set_query(req.query, "name");
    select.add_order_by("name");

    let (sql, values) = select.build();
    let values = convert_values(values);
    debug!("Database get_subfactors: {sql}");

    let mut stmt = tx.prepare(&sql)?;
    let mut subfactors = Vec::new();
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(SubFactor {
            id: row.get(0)?,
            name: row.get(1)?,
            factor_id: row.get(2)?,
        })
    })?;
    for row in rows {
        subfactors.push(row?);
    }

    Ok(subfactors)
}
