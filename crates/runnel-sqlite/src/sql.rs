//! Statement assembly for the structured primitives
//!
//! Builds parameterized SQL from query/record descriptors. Identifiers
//! come from the caller's descriptors verbatim; values always travel as
//! bound parameters, never inlined into the text.

use runnel_core::types::{Predicate, Query, Record, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

/// Adapter binding a core [`Value`] as a rusqlite parameter.
pub(crate) struct SqlValue<'a>(pub(crate) &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(n) => ToSqlOutput::Borrowed(ValueRef::Integer(*n)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

pub(crate) fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

pub(crate) fn select_sql(query: &Query) -> (String, Vec<&Value>) {
    let mut sql = String::from("SELECT ");
    if query.distinct {
        sql.push_str("DISTINCT ");
    }
    match &query.columns {
        Some(columns) if !columns.is_empty() => sql.push_str(&columns.join(", ")),
        _ => sql.push('*'),
    }
    sql.push_str(" FROM ");
    sql.push_str(&query.table);

    let mut args: Vec<&Value> = Vec::new();
    if let Some(predicate) = &query.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate.clause);
        args.extend(predicate.args.iter());
    }
    if let Some(group_by) = &query.group_by {
        sql.push_str(" GROUP BY ");
        sql.push_str(group_by);
    }
    if let Some(having) = &query.having {
        sql.push_str(" HAVING ");
        sql.push_str(having);
    }
    if let Some(order_by) = &query.order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    (sql, args)
}

pub(crate) fn insert_sql<'a>(table: &str, record: &'a Record) -> (String, Vec<&'a Value>) {
    if record.is_empty() {
        return (format!("INSERT INTO {} DEFAULT VALUES", table), Vec::new());
    }

    let mut columns = Vec::with_capacity(record.len());
    let mut args = Vec::with_capacity(record.len());
    for (column, value) in record.columns() {
        columns.push(column);
        args.push(value);
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );

    (sql, args)
}

pub(crate) fn update_sql<'a>(
    table: &str,
    record: &'a Record,
    predicate: &'a Predicate,
) -> (String, Vec<&'a Value>) {
    let mut assignments = Vec::with_capacity(record.len());
    let mut args = Vec::with_capacity(record.len() + predicate.args.len());
    for (column, value) in record.columns() {
        assignments.push(format!("{} = ?", column));
        args.push(value);
    }
    let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
    sql.push_str(" WHERE ");
    sql.push_str(&predicate.clause);
    args.extend(predicate.args.iter());

    (sql, args)
}

pub(crate) fn delete_sql<'a>(table: &str, predicate: Option<&'a Predicate>) -> (String, Vec<&'a Value>) {
    match predicate {
        Some(predicate) => {
            let sql = format!("DELETE FROM {} WHERE {}", table, predicate.clause);
            (sql, predicate.args.iter().collect())
        }
        None => (format!("DELETE FROM {}", table), Vec::new()),
    }
}
