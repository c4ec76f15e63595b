//! # Ujorm
//!
//! Workspace crate re-exporting the subcrates:
//! - `ujorm-core`: typed keys, storage strategies and criteria
//! - `ujorm-orm`: meta-model, SQL dialects, sessions and queries

pub use ujorm_core;
pub use ujorm_orm;

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
