//! Materialized result rows.
//!
//! Rows are column-name → JSON value maps so they can be cached, shared
//! between tasks and decoded into typed records with serde.

use serde::de::DeserializeOwned;
use tokio_rusqlite::rusqlite::types::{Value, ValueRef};
use tokio_rusqlite::rusqlite::{self, params_from_iter};

use crate::Error;

/// A single result row keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Convert a SQLite value into its JSON representation.
///
/// Blobs are hex-encoded; non-finite reals become `null`.
pub fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(hex::encode(b)),
    }
}

/// Run a read statement and collect every row.
pub(crate) fn read_rows(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut map = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            map.insert(name.clone(), value_to_json(row.get_ref(idx)?));
        }
        Ok(map)
    })?;

    rows.collect()
}

/// Decode a row into a typed record.
pub fn decode<T: DeserializeOwned>(row: &Row) -> Result<T, Error> {
    serde_json::from_value(serde_json::Value::Object(row.clone())).map_err(Error::from)
}

/// Read an integer column, treating a missing or null value as an error.
pub fn column_i64(row: &Row, column: &str) -> Result<i64, Error> {
    row.get(column)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| Error::InvalidData(format!("column `{column}` is missing or not an integer")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_json() {
        assert_eq!(value_to_json(ValueRef::Null), serde_json::Value::Null);
        assert_eq!(value_to_json(ValueRef::Integer(7)), serde_json::json!(7));
        assert_eq!(value_to_json(ValueRef::Real(1.5)), serde_json::json!(1.5));
        assert_eq!(value_to_json(ValueRef::Text(b"abc")), serde_json::json!("abc"));
        assert_eq!(value_to_json(ValueRef::Blob(&[0xde, 0xad])), serde_json::json!("dead"));
        assert_eq!(value_to_json(ValueRef::Real(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn test_read_rows_keys_by_column() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let rows = read_rows(
            &conn,
            "SELECT ? AS id, 'x' AS name UNION ALL SELECT 2, NULL",
            &[Value::Integer(1)],
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], serde_json::json!(1));
        assert_eq!(rows[0]["name"], serde_json::json!("x"));
        assert_eq!(rows[1]["name"], serde_json::Value::Null);
    }

    #[test]
    fn test_column_i64() {
        let mut row = Row::new();
        row.insert("total".into(), serde_json::json!(25));
        assert_eq!(column_i64(&row, "total").unwrap(), 25);
        assert!(matches!(column_i64(&row, "missing"), Err(Error::InvalidData(_))));
    }
}
