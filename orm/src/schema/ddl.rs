//! Data Definition Language (DDL) planning
//!
//! The meta-model is compared with the existing schema and the statements
//! required by the table policies are printed by the dialect.

use serde::{Deserialize, Serialize};

use crate::dialect::SqlDialect;
use crate::error::{OrmError, Result};
use crate::meta::MetaModel;
use super::reader::DbSchema;
use super::Orm2ddlPolicy;

/// DDL operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DdlOperation {
    /// Create a table
    CreateTable(String),

    /// Add a column to an existing table
    AddColumn {
        /// Table name
        table: String,
        /// Column name
        column: String,
    },

    /// Create an index
    CreateIndex {
        /// Table name
        table: String,
        /// Index name
        index: String,
    },

    /// Comment a table or its columns
    Comment(String),
}

/// DDL statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlStatement {
    /// DDL operation
    pub ddl: DdlOperation,

    /// SQL statement
    pub sql: String,
}

impl DdlStatement {
    /// Create a new DDL statement
    pub fn new(ddl: DdlOperation, sql: String) -> Self {
        DdlStatement { ddl, sql }
    }
}

/// Plan the statements reconciling the schema with the meta-model
///
/// Tables are created first, then the columns are added, then the indexes
/// and the comments follow. `Validate` tables report every missing table
/// and column in one `OrmError::Schema`.
pub fn plan_ddl(model: &MetaModel, existing: &DbSchema, dialect: &dyn SqlDialect) -> Result<Vec<DdlStatement>> {
    let fresh = model.tables().iter().all(|table| !existing.has_table(&table.name));
    let mut tables = Vec::new();
    let mut columns = Vec::new();
    let mut indexes = Vec::new();
    let mut comments = Vec::new();
    let mut problems = Vec::new();

    for table in model.tables() {
        let db_table = existing.table(&table.name);
        match table.policy {
            Orm2ddlPolicy::DoNothing | Orm2ddlPolicy::Inherited => continue,
            Orm2ddlPolicy::Validate => {
                match db_table {
                    None => problems.push(format!("table {} is missing", table.name)),
                    Some(db_table) => {
                        for (_, db) in table.db_columns() {
                            if !db_table.has_column(&db.name) {
                                problems.push(format!("column {}.{} is missing", table.name, db.name));
                            }
                        }
                    }
                }
                continue;
            }
            Orm2ddlPolicy::CreateDdl if !fresh => continue,
            Orm2ddlPolicy::CreateDdl | Orm2ddlPolicy::CreateOrUpdateDdl => {}
        }

        match db_table {
            None => {
                tables.push(DdlStatement::new(
                    DdlOperation::CreateTable(table.name.clone()),
                    dialect.create_table(table),
                ));
                let comment = dialect.comment_statements(table);
                comments.extend(comment.into_iter().map(|sql| {
                    DdlStatement::new(DdlOperation::Comment(table.name.clone()), sql)
                }));
            }
            Some(db_table) => {
                for (column, db) in table.db_columns() {
                    if !db_table.has_column(&db.name) {
                        columns.push(DdlStatement::new(
                            DdlOperation::AddColumn {
                                table: table.name.clone(),
                                column: db.name.clone(),
                            },
                            dialect.add_column(table, column, db),
                        ));
                    }
                }
            }
        }

        for index in table.indexes.iter().filter(|index| !existing.has_index(&index.name)) {
            indexes.push(DdlStatement::new(
                DdlOperation::CreateIndex {
                    table: table.name.clone(),
                    index: index.name.clone(),
                },
                dialect.create_index(table, index),
            ));
        }
    }

    if !problems.is_empty() {
        return Err(OrmError::Schema(format!(
            "Database does not match the meta-model: {}",
            problems.join(", ")
        )));
    }

    tables.extend(columns);
    tables.extend(indexes);
    tables.extend(comments);
    Ok(tables)
}
