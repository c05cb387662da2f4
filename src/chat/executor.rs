use super::guard;
use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Number, Value};

pub const NOT_ALLOWED: &str = "Query is not allowed. Only SELECT queries are permitted.";
pub const MULTIPLE_STATEMENTS: &str =
    "Query is not allowed. Only a single SELECT statement is permitted.";

pub type Row = Map<String, Value>;

/// Outcome of a model-issued query, shaped for the tool-result payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    pub data: Option<Vec<Row>>,
    pub error: Option<String>,
}

impl QueryResult {
    fn rows(data: Vec<Row>) -> Self {
        Self {
            success: true,
            row_count: Some(data.len()),
            data: Some(data),
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            row_count: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Runs `query` on `conn` if the guard allows it.
///
/// Never fails outward: guard rejections and store errors both come back as
/// `success: false`. A failed statement is rolled back so `conn` stays usable.
pub fn execute(conn: &mut Connection, query: &str) -> QueryResult {
    if !guard::is_safe(query) {
        tracing::warn!(query, "rejected query");
        return QueryResult::failure(NOT_ALLOWED);
    }
    if !guard::is_single_statement(query) {
        tracing::warn!(query, "rejected multi-statement query");
        return QueryResult::failure(MULTIPLE_STATEMENTS);
    }

    let tx = match conn.transaction() {
        Ok(tx) => tx,
        Err(e) => return QueryResult::failure(format!("Database query error: {}", e)),
    };

    let fetched = fetch_rows(&tx, query);
    match fetched {
        Ok(rows) => {
            if let Err(e) = tx.commit() {
                tracing::warn!(error = %e, "failed to close read transaction");
            }
            QueryResult::rows(rows)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback() {
                tracing::error!(error = %rollback, "rollback after failed query failed");
            }
            tracing::debug!(query, error = %e, "query failed");
            QueryResult::failure(format!("Database query error: {}", e))
        }
    }
}

fn fetch_rows(conn: &Connection, query: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(query)?;
    let columns: Vec<(String, Option<String>)> = stmt
        .columns()
        .iter()
        .map(|c| {
            (
                c.name().to_string(),
                c.decl_type().map(|t| t.to_ascii_uppercase()),
            )
        })
        .collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::with_capacity(columns.len());
        for (idx, (name, decl_type)) in columns.iter().enumerate() {
            let value = to_transport(row.get_ref(idx)?, decl_type.as_deref());
            record.insert(name.clone(), value);
        }
        out.push(record);
    }
    Ok(out)
}

/// Converts a stored value into a JSON primitive, using the column's declared
/// type to recover JSON documents, booleans and dates.
fn to_transport(value: ValueRef<'_>, decl_type: Option<&str>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => match decl_type {
            Some("BOOLEAN") | Some("BOOL") => Value::Bool(i != 0),
            _ => Value::from(i),
        },
        ValueRef::Real(f) => float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            match decl_type {
                Some("JSON") | Some("JSONB") => serde_json::from_str::<Value>(&text)
                    .unwrap_or_else(|_| Value::String(text.into_owned())),
                Some("DATE") => {
                    Value::String(iso_date(&text).unwrap_or_else(|| text.into_owned()))
                }
                Some("DATETIME") | Some("TIMESTAMP") => {
                    Value::String(iso_datetime(&text).unwrap_or_else(|| text.into_owned()))
                }
                _ => Value::String(text.into_owned()),
            }
        }
        ValueRef::Blob(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    }
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn iso_date(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .or_else(|| iso_datetime(text))
}

fn iso_datetime(text: &str) -> Option<String> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}
