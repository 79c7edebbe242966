use anyhow::{bail, Result};
use log::debug;
use novedades_misc::api::comment::{Comment, CommentKind, CommentState, GetCommentRequest};
use novedades_misc::api::Value;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use crate::db::sql::Select;
use crate::db::types::CreateCommentParams;

use super::convert_values;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS comentarios (
    folio INTEGER PRIMARY KEY AUTOINCREMENT,
    tipo TEXT NOT NULL,
    motivo TEXT NOT NULL,
    observacion TEXT,
    estado TEXT NOT NULL,
    funcionario_id INTEGER NOT NULL,
    jefe_id INTEGER NOT NULL,
    subfactor_id INTEGER NOT NULL,
    create_time INTEGER NOT NULL,
    accept_time INTEGER
);
CREATE INDEX IF NOT EXISTS idx_comentarios_funcionario ON comentarios(funcionario_id);
"#;

const COMMENT_FIELDS: [&str; 10] = [
    "folio",
    "tipo",
    "motivo",
    "observacion",
    "estado",
    "funcionario_id",
    "jefe_id",
    "subfactor_id",
    "create_time",
    "accept_time",
];

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateCommentParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO comentarios (tipo, motivo, estado, funcionario_id, jefe_id, subfactor_id, create_time)
    VALUES (?, ?, 'Pendiente', ?, ?, ?, ?)
    "#;
    debug!(
        "Database create_comment: {} for funcionario {}",
        params.kind, params.funcionario_id
    );
    tx.execute(
        sql,
        params![
            params.kind,
            params.motivo,
            params.funcionario_id,
            params.jefe_id,
            params.subfactor_id,
            params.create_time,
        ],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn get(tx: &Transaction, folio: u64) -> Result<Option<Comment>> {
    let mut select = Select::new(COMMENT_FIELDS.to_vec(), "comentarios");
    select.add_where("folio = ?", Value::Integer(folio));

    let (sql, values) = select.build();
    let values = convert_values(values);

    let mut stmt = tx.prepare(&sql)?;
    let row = stmt
        .query_row(params_from_iter(values), comment_columns)
        .optional()?;

    match row {
        Some(row) => Ok(Some(comment_from_columns(row)?)),
        None => Ok(None),
    }
}

/// Acceptance is a compare-and-set: the UPDATE only applies while the row is
/// still Pendiente, so concurrent attempts cannot double-stamp it.
pub fn accept(tx: &Transaction, folio: u64, observacion: &str, accept_time: u64) -> Result<bool> {
    let sql = r#"
    UPDATE comentarios SET estado = 'Aceptada', observacion = ?, accept_time = ?
    WHERE folio = ? AND estado = 'Pendiente'
    "#;
    debug!("Database accept_comment: folio {folio}");
    let affected = tx.execute(sql, params![observacion, accept_time, folio])?;
    Ok(affected > 0)
}

pub fn count_comments(tx: &Transaction, req: GetCommentRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_comments: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;

    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_comments(tx: &Transaction, req: GetCommentRequest) -> Result<Vec<Comment>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_comments: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;

    let mut comments = Vec::new();
    let rows = stmt.query_map(params_from_iter(values), comment_columns)?;
    for row in rows {
        comments.push(comment_from_columns(row?)?);
    }

    Ok(comments)
}

type CommentColumns = (
    u64,
    String,
    String,
    Option<String>,
    String,
    u64,
    u64,
    u64,
    u64,
    Option<u64>,
);

fn comment_columns(row: &Row) -> rusqlite::Result<CommentColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn comment_from_columns(row: CommentColumns) -> Result<Comment> {
    let (folio, tipo, motivo, observacion, estado, funcionario_id, jefe_id, subfactor_id, create_time, accept_time) =
        row;

    let kind = match CommentKind::from_name(&tipo) {
        Some(kind) => kind,
        None => bail!("comment {folio} has malformed tipo '{tipo}'"),
    };
    let estado = match CommentState::from_name(&estado) {
        Some(estado) => estado,
        None => bail!("comment {folio} has malformed estado '{estado}'"),
    };

    Ok(Comment {
        folio,
        kind,
        motivo,
        observacion,
        estado,
        funcionario_id,
        jefe_id,
        subfactor_id,
        create_time,
        accept_time,
    })
}

fn build_select_sql(count: bool, req: GetCommentRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("comentarios")
    } else {
        Select::new(COMMENT_FIELDS.to_vec(), "comentarios")
    };

    if let Some(folio) = req.folio {
        select.add_where("folio = ?", Value::Integer(folio));
    }
    if let Some(funcionario_id) = req.funcionario_id {
        select.add_where("funcionario_id = ?", Value::Integer(funcionario_id));
    }
    if let Some(kind) = req.kind {
        select.add_where("tipo = ?", Value::Text(kind));
    }
    if let Some(estado) = req.estado {
        select.add_where("estado = ?", Value::Text(estado));
    }
    if let Some(factor_id) = req.factor_id {
        select.add_where(
            "subfactor_id IN (SELECT id FROM subfactores WHERE factor_id = ?)",
            Value::Integer(factor_id),
        );
    }
    if let Some(subfactor_id) = req.subfactor_id {
        select.add_where("subfactor_id = ?", Value::Integer(subfactor_id));
    }
    if let Some(created_after) = req.created_after {
        select.add_where("create_time >= ?", Value::Integer(created_after));
    }
    if let Some(created_before) = req.created_before {
        select.add_where("create_time <= ?", Value::Integer(created_before));
    }

    select.set_query(req.query, "motivo");

    select.add_order_by("create_time DESC");
    select.add_order_by("folio DESC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
