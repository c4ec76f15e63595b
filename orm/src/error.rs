//! Error types for the ORM crate
//!
//! Every database failure is wrapped with its SQLSTATE code, the other
//! variants describe mapping, schema and usage errors.

use std::io;

use rusqlite::ffi;
use thiserror::Error;
use ujorm_core::CoreError;

/// Result type for the ORM
pub type Result<T> = std::result::Result<T, OrmError>;

/// SQLSTATE of a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE of a not-null constraint violation
pub const NOT_NULL_VIOLATION: &str = "23502";

/// SQLSTATE of a foreign key violation
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE of a check constraint violation
pub const CHECK_VIOLATION: &str = "23514";

/// SQLSTATE of an unclassified database error
pub const GENERAL_ERROR: &str = "HY000";

/// Error type for the ORM
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error with its SQLSTATE
    #[error("SQL error {state}: {message}")]
    Sql {
        /// SQLSTATE code
        state: String,
        /// Message of the database
        message: String,
        /// Original error
        #[source]
        source: rusqlite::Error,
    },

    /// Operation is not supported by the dialect or the meta-model
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Database schema does not match the meta-model
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid mapping of a domain type
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Requested row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query for a unique result returned more rows
    #[error("Non-unique result: {0}")]
    NonUnique(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error of the key model or of a criterion
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl OrmError {
    /// SQLSTATE of a database error
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            OrmError::Sql { state, .. } => Some(state),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for OrmError {
    fn from(source: rusqlite::Error) -> Self {
        OrmError::Sql {
            state: to_sql_state(&source).to_string(),
            message: source.to_string(),
            source,
        }
    }
}

/// Map an SQLite error to the SQLSTATE code
pub fn to_sql_state(error: &rusqlite::Error) -> &'static str {
    match error {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => UNIQUE_VIOLATION,
            ffi::SQLITE_CONSTRAINT_NOTNULL => NOT_NULL_VIOLATION,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => FOREIGN_KEY_VIOLATION,
            ffi::SQLITE_CONSTRAINT_CHECK => CHECK_VIOLATION,
            _ => GENERAL_ERROR,
        },
        _ => GENERAL_ERROR,
    }
}
