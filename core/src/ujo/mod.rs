//! Ujo contract and storage strategies
//!
//! A Ujo object exposes its attributes through keys. The values may be kept
//! in an array indexed by the key index, in a map, or in ordinary struct
//! fields bound by accessor closures.

mod array;
mod field;
mod map;

pub use array::ArrayStore;
pub use field::FieldAccessors;
pub use map::MapStore;

use crate::error::Result;
use crate::models::{AnyKey, KeyList, Value};

/// Uniform read/write access to the attributes of a domain object
pub trait Ujo {
    /// Locked keys of the object type
    fn read_keys(&self) -> &KeyList;

    /// Stored value of the key, `Value::Null` if there is none
    fn read_value(&self, key: &AnyKey) -> Value;

    /// Store the value of the key
    fn write_value(&mut self, key: &AnyKey, value: Value) -> Result<()>;

    /// Loaded object of a relation key
    fn read_related(&self, _key: &AnyKey) -> Option<&dyn Ujo> {
        None
    }
}

/// Text form listing the effective value of every non-relation key
pub fn describe(ujo: &dyn Ujo) -> String {
    let keys = ujo.read_keys();
    let items: Vec<String> = keys
        .iter()
        .filter(|key| !key.is_relation())
        .map(|key| format!("{}={}", key, key.effective_value(ujo)))
        .collect();
    format!("{}[{}]", keys.domain(), items.join(", "))
}
