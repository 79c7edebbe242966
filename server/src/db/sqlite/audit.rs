use anyhow::Result;
use log::debug;
use novedades_misc::api::audit::{AuditEntry, GetAuditRequest};
use novedades_misc::api::Value;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::db::sql::Select;
use crate::db::types::CreateAuditParams;

use super::convert_values;

// Append-only: this module deliberately exposes no UPDATE or DELETE.
const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    usuario_id INTEGER,
    usuario_nombre TEXT NOT NULL,
    accion TEXT NOT NULL,
    detalles TEXT NOT NULL
);
"#;

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateAuditParams) -> Result<()> {
    let sql = r#"
    INSERT INTO logs (timestamp, usuario_id, usuario_nombre, accion, detalles)
    VALUES (?, ?, ?, ?, ?)
    "#;
    debug!("Database create_audit: {} by {}", params.action, params.user_name);
    tx.execute(
        sql,
        params![
            params.timestamp,
            params.user_id,
            params.user_name,
            params.action,
            params.details,
        ],
    )?;

    Ok(())
}

pub fn count_audits(tx: &Transaction, req: GetAuditRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_audits: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;

    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_audits(tx: &Transaction, req: GetAuditRequest) -> Result<Vec<AuditEntry>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_audits: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;

    let mut entries = Vec::new();
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(AuditEntry {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            user_id: row.get(2)?,
            user_name: row.get(3)?,
            action: row.get(4)?,
            details: row.get(5)?,
        })
    })?;
    for row in rows {
        entries.push(row?);
    }

    Ok(entries)
}

fn build_select_sql(count: bool, req: GetAuditRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("logs")
    } else {
        Select::new(
            vec!["id", "timestamp", "usuario_id", "usuario_nombre", "accion", "detalles"],
            "logs",
        )
    };

    if let Some(user_id) = req.user_id {
        select.add_where("usuario_id = ?", Value::Integer(user_id));
    }
    if let Some(action) = req.action {
        select.add_where("accion = ?", Value::Text(action));
    }

    select.set_query(req.query, "detalles");

    select.add_order_by("timestamp DESC");
    select.add_order_by("id DESC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
