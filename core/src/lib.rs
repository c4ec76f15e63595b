//! # Ujorm Core
//!
//! Typed keys of domain objects and the criterion expression engine.
//! This crate provides the key metadata model, the Ujo storage strategies
//! and the criteria evaluated in memory or translated to SQL by `ujorm-orm`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod criterion;
pub mod error;
mod macros;
pub mod models;
pub mod ujo;
pub mod utils;

#[cfg(test)]
mod test_domain;

/// Re-export common types for ease of use
pub use criterion::{Criterion, CriterionProvider, Operator};
pub use error::{CoreError, Result};
pub use models::{AnyKey, Key, KeyFactory, KeyList, KeyPath, KeyValue, SortKey, Value, ValueType};
pub use ujo::{ArrayStore, FieldAccessors, MapStore, Ujo};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
