//! Key metadata model
//!
//! This module provides the runtime values, the typed keys of domain types,
//! the key factory and the property paths composed from relation keys.

mod factory;
mod key;
mod key_list;
mod path;
mod validator;
mod value;

pub use factory::KeyFactory;
pub use key::{AnyKey, Key, PropertyModifier};
pub use key_list::KeyList;
pub use path::{KeyPath, PropertyPath, SortKey};
pub use validator::Validator;
pub use value::{KeyValue, TextValue, Value, ValueType};
