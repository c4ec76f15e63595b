//! Database schema reconciliation
//!
//! The DDL policy decides what happens with the database schema when the
//! handler starts: nothing, creation of a new schema, an additive update, or
//! a validation against the meta-model.

mod ddl;
mod reader;

pub use ddl::{plan_ddl, DdlOperation, DdlStatement};
pub use reader::{DbSchema, DbTable, SchemaReader};

use serde::{Deserialize, Serialize};

/// Schema reconciliation strategy at the handler start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orm2ddlPolicy {
    /// Leave the schema untouched
    DoNothing,

    /// Create the whole schema when no mapped table exists
    CreateDdl,

    /// Create missing tables, columns and indexes
    CreateOrUpdateDdl,

    /// Report missing tables and columns as an error
    Validate,

    /// Use the policy of the handler
    Inherited,
}

impl Default for Orm2ddlPolicy {
    fn default() -> Self {
        Orm2ddlPolicy::Inherited
    }
}

impl Orm2ddlPolicy {
    /// Replace `Inherited` by the parent policy, `CreateOrUpdateDdl` at the top
    pub fn resolve(self, parent: Orm2ddlPolicy) -> Orm2ddlPolicy {
        match (self, parent) {
            (Orm2ddlPolicy::Inherited, Orm2ddlPolicy::Inherited) => Orm2ddlPolicy::CreateOrUpdateDdl,
            (Orm2ddlPolicy::Inherited, parent) => parent,
            (policy, _) => policy,
        }
    }
}
