//! PostgreSQL dialect

use crate::config::DialectKind;
use crate::error::Result;
use crate::meta::{DbColumn, DbType, MetaTable};
use super::{sized, SqlDialect};

/// Dialect printing PostgreSQL statements
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlDialect;

impl SqlDialect for PostgreSqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn type_name(&self, column: &DbColumn) -> String {
        match column.db_type {
            DbType::Integer => "INTEGER".to_string(),
            DbType::BigInt => "BIGINT".to_string(),
            DbType::Double => "DOUBLE PRECISION".to_string(),
            DbType::VarChar => sized("VARCHAR", column),
            DbType::Char => sized("CHAR", column),
            DbType::Text => "TEXT".to_string(),
            DbType::Blob => "BYTEA".to_string(),
            DbType::Boolean => "BOOLEAN".to_string(),
            DbType::Uuid => "UUID".to_string(),
            DbType::Timestamp => "TIMESTAMP".to_string(),
            DbType::Json => "JSONB".to_string(),
        }
    }

    fn regexp_template(&self, negated: bool) -> Result<&'static str> {
        Ok(if negated { "{0} !~ {1}" } else { "{0} ~ {1}" })
    }

    fn generated_suffix(&self) -> &'static str {
        " GENERATED BY DEFAULT AS IDENTITY"
    }

    fn comment_statements(&self, table: &MetaTable) -> Vec<String> {
        let name = self.table_name(table);
        let mut result = Vec::new();
        if let Some(comment) = &table.comment {
            result.push(format!("COMMENT ON TABLE {} IS '{}'", name, comment.replace('\'', "''")));
        }
        for (column, db) in table.db_columns() {
            if let Some(comment) = &column.comment {
                result.push(format!(
                    "COMMENT ON COLUMN {}.{} IS '{}'",
                    name,
                    db.name,
                    comment.replace('\'', "''")
                ));
            }
        }
        result
    }
}
