//! SQLite connection support
//!
//! Opening and configuring connections, the `regexp` and `lower` functions,
//! and the conversion of key values to and from SQLite values.

use std::sync::Arc;

use log::debug;
use regex::Regex;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags};
use ujorm_core::Value;

use crate::config::DatabaseConfig;
use crate::error::{OrmError, Result};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Path used to open the database, a private memory database becomes a named shared one
pub(crate) fn database_path(config: &DatabaseConfig) -> String {
    if config.is_memory() {
        format!("file:ujorm_{}?mode=memory&cache=shared", uuid::Uuid::new_v4().simple())
    } else {
        config.url.clone()
    }
}

/// Open and configure a connection
pub(crate) fn open(path: &str, config: &DatabaseConfig) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    configure(&conn, config)?;
    debug!("Opened the database {}", path);
    Ok(conn)
}

/// Apply the connection settings and register the functions
pub(crate) fn configure(conn: &Connection, config: &DatabaseConfig) -> Result<()> {
    conn.busy_timeout(config.busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    // LIKE matches the case sensitive text operators
    conn.pragma_update(None, "case_sensitive_like", true)?;
    register_regexp(conn)?;
    register_lower(conn)?;
    Ok(())
}

/// Register the function behind the `REGEXP` operator
pub(crate) fn register_regexp(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        regexp,
    )?;
    Ok(())
}

/// Replace the ASCII-only built-in `lower` by the Unicode lower case mapping
pub(crate) fn register_lower(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        lower,
    )?;
    Ok(())
}

fn lower(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    match ctx.get_raw(0) {
        ValueRef::Null => Ok(None),
        ValueRef::Text(text) | ValueRef::Blob(text) => Ok(Some(String::from_utf8_lossy(text).to_lowercase())),
        ValueRef::Integer(v) => Ok(Some(v.to_string())),
        ValueRef::Real(v) => Ok(Some(v.to_string())),
    }
}

fn regexp(ctx: &Context<'_>) -> rusqlite::Result<Option<bool>> {
    let pattern: Arc<Regex> = ctx.get_or_create_aux(0, |value| -> std::result::Result<_, BoxError> {
        Ok(Regex::new(value.as_str()?)?)
    })?;
    match ctx.get_raw(1) {
        ValueRef::Null => Ok(None),
        ValueRef::Text(text) => Ok(Some(pattern.is_match(&String::from_utf8_lossy(text)))),
        ValueRef::Integer(v) => Ok(Some(pattern.is_match(&v.to_string()))),
        ValueRef::Real(v) => Ok(Some(pattern.is_match(&v.to_string()))),
        ValueRef::Blob(bytes) => Ok(Some(pattern.is_match(&String::from_utf8_lossy(bytes)))),
    }
}

/// Bind parameter of a key value
#[derive(Debug, Clone, Copy)]
pub struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self.0 {
            Value::Integer(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::BigInt(v) | Value::Timestamp(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Boolean(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Text(v) | Value::Json(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Binary(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::Uuid(v) => ToSqlOutput::Owned(SqlValue::Text(v.hyphenated().to_string())),
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::List(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
                    OrmError::Unsupported("A list is not a bind parameter".to_string()),
                )))
            }
        };
        Ok(output)
    }
}

/// Bind parameters of the values
pub fn params_of(values: &[Value]) -> Vec<SqlParam<'_>> {
    values.iter().map(SqlParam).collect()
}

/// Key value of an SQLite value, it is coerced to the key type later
pub fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::BigInt(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Binary(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params_from_iter;
    use ujorm_core::ValueType;

    fn connection() -> Connection {
        let config = DatabaseConfig::default();
        open(&database_path(&config), &config).unwrap()
    }

    #[test]
    fn test_regexp_function() {
        let conn = connection();
        let matched: Option<bool> = conn
            .query_row("SELECT 'Pavel' REGEXP '^(?:P.*)$'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(matched, Some(true));

        let matched: Option<bool> = conn
            .query_row("SELECT NULL REGEXP '^(?:P.*)$'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(matched, None);

        let result = conn.query_row("SELECT 'x' REGEXP '('", [], |row| row.get::<_, bool>(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_case_sensitive_like() {
        let conn = connection();
        let matched: bool = conn
            .query_row("SELECT 'Pavel' LIKE 'pav%'", [], |row| row.get(0))
            .unwrap();
        assert!(!matched);
        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_unicode_lower() {
        let conn = connection();
        let lowered: String = conn.query_row("SELECT LOWER('ČECH Ärger')", [], |row| row.get(0)).unwrap();
        assert_eq!(lowered, "čech ärger");
        let matched: bool = conn
            .query_row("SELECT LOWER('Čech') LIKE 'č%'", [], |row| row.get(0))
            .unwrap();
        assert!(matched);
        let null: Option<String> = conn.query_row("SELECT LOWER(NULL)", [], |row| row.get(0)).unwrap();
        assert_eq!(null, None);
    }

    #[test]
    fn test_value_conversions() {
        let conn = connection();
        let id = uuid::Uuid::new_v4();
        let values = vec![
            Value::Integer(7),
            Value::Boolean(true),
            Value::Float(1.5),
            Value::Text("abc".to_string()),
            Value::Uuid(id),
            Value::Null,
        ];
        let row: Vec<Value> = conn
            .query_row("SELECT ?, ?, ?, ?, ?, ?", params_from_iter(params_of(&values)), |row| {
                (0..6).map(|i| row.get_ref(i).map(value_from_ref)).collect()
            })
            .unwrap();

        assert_eq!(row[0], Value::BigInt(7));
        assert_eq!(row[1].clone().coerce(ValueType::Boolean).unwrap(), Value::Boolean(true));
        assert_eq!(row[2], Value::Float(1.5));
        assert_eq!(row[3], Value::Text("abc".to_string()));
        assert_eq!(row[4].clone().coerce(ValueType::Uuid).unwrap(), Value::Uuid(id));
        assert_eq!(row[5], Value::Null);

        let list = [Value::List(vec![Value::Integer(1)])];
        assert!(conn
            .query_row("SELECT ?", params_from_iter(params_of(&list)), |row| row.get::<_, i64>(0))
            .is_err());
    }
}
