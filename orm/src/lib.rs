//! # Ujorm ORM
//!
//! Persistence of Ujo domain types in a relational database. Tables are
//! mapped by `TableModel`, the handler resolves the meta-model and applies
//! the DDL policy, and sessions insert, update, delete and query the rows.
//! Criteria of `ujorm-core` are decoded to SQL conditions by the dialect.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod decoder;
pub mod dialect;
pub mod error;
pub mod foreign_key;
pub mod handler;
pub mod meta;
pub mod query;
pub mod schema;
pub mod session;
pub mod sqlite;

#[cfg(test)]
mod test_domain;

/// Re-export common types for ease of use
pub use config::{DatabaseConfig, DialectKind, OrmConfig};
pub use error::{OrmError, Result};
pub use foreign_key::ForeignKey;
pub use handler::{OrmHandler, OrmHandlerBuilder};
pub use meta::{Column, DbType, MetaModel, MetaTable, OrmUjo, TableModel};
pub use query::Query;
pub use schema::Orm2ddlPolicy;
pub use session::Session;

/// Version of the ORM crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
