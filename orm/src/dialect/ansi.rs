//! ANSI SQL dialect

use crate::config::DialectKind;
use crate::error::{OrmError, Result};
use crate::meta::{DbColumn, DbType};
use super::{sized, SqlDialect};

/// Dialect printing standard SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl SqlDialect for AnsiDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Ansi
    }

    fn type_name(&self, column: &DbColumn) -> String {
        match column.db_type {
            DbType::Integer => "INTEGER".to_string(),
            DbType::BigInt => "BIGINT".to_string(),
            DbType::Double => "DOUBLE PRECISION".to_string(),
            DbType::VarChar => sized("VARCHAR", column),
            DbType::Char => sized("CHAR", column),
            DbType::Text | DbType::Json => "CLOB".to_string(),
            DbType::Blob => "BLOB".to_string(),
            DbType::Boolean => "BOOLEAN".to_string(),
            DbType::Uuid => "CHAR(36)".to_string(),
            DbType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    fn regexp_template(&self, _negated: bool) -> Result<&'static str> {
        Err(OrmError::Unsupported(
            "Regular expressions are not a part of ANSI SQL".to_string(),
        ))
    }

    fn generated_suffix(&self) -> &'static str {
        " GENERATED BY DEFAULT AS IDENTITY"
    }

    fn print_limit(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {} ROWS", offset));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", limit));
        }
    }
}
