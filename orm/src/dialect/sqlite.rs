//! SQLite dialect

use crate::config::DialectKind;
use crate::error::Result;
use crate::meta::{DbColumn, DbType, MetaTable};
use super::{sized, SqlDialect};

/// Dialect of the executed SQLite database
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn type_name(&self, column: &DbColumn) -> String {
        match column.db_type {
            // INTEGER keeps a single primary key an alias of the rowid
            DbType::Integer | DbType::BigInt => "INTEGER".to_string(),
            DbType::Double => "REAL".to_string(),
            DbType::VarChar => sized("VARCHAR", column),
            DbType::Char => sized("CHAR", column),
            DbType::Text | DbType::Json => "TEXT".to_string(),
            DbType::Blob => "BLOB".to_string(),
            DbType::Boolean => "BOOLEAN".to_string(),
            DbType::Uuid => "VARCHAR(36)".to_string(),
            DbType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    fn regexp_template(&self, negated: bool) -> Result<&'static str> {
        Ok(if negated {
            "{0} NOT REGEXP {1}"
        } else {
            "{0} REGEXP {1}"
        })
    }

    /// An SQLite schema is an attached database, tables are printed without it
    fn table_name(&self, table: &MetaTable) -> String {
        table.name.clone()
    }

    fn print_limit(&self, sql: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}
