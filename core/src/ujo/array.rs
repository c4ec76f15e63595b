//! Array storage
//!
//! Values are kept in a vector indexed by the key index, so every access is
//! a constant time operation.

use crate::error::Result;
use crate::models::{AnyKey, KeyList, Value};
use super::Ujo;

/// Array based storage of a Ujo object
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayStore {
    /// Locked keys of the domain
    keys: KeyList,

    /// One slot for every key
    values: Vec<Value>,
}

impl ArrayStore {
    /// Create a storage where every slot is null
    pub fn new(keys: KeyList) -> Self {
        let values = vec![Value::Null; keys.len()];
        ArrayStore { keys, values }
    }

    /// Create a storage populated by the key defaults
    pub fn with_defaults(keys: KeyList) -> Self {
        let values = keys.iter().map(|key| key.default_value().clone()).collect();
        ArrayStore { keys, values }
    }

    /// Stored values in the key order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn slot(&self, key: &AnyKey) -> Option<usize> {
        if self.keys.contains(key) {
            key.index()
        } else {
            None
        }
    }
}

impl Ujo for ArrayStore {
    fn read_keys(&self) -> &KeyList {
        &self.keys
    }

    fn read_value(&self, key: &AnyKey) -> Value {
        self.slot(key)
            .and_then(|i| self.values.get(i))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn write_value(&mut self, key: &AnyKey, value: Value) -> Result<()> {
        let index = self.slot(key).ok_or_else(|| self.keys.unknown_key(key))?;
        key.check_value(&value)?;
        self.values[index] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::test_domain::{Address, Person};

    #[test]
    fn test_default_value_round_trip() {
        let keys = Person::keys();
        let mut person = Person::new();

        assert_eq!(keys.name.of(&person), Some(String::new()));
        assert!(keys.name.is_default(&person));

        keys.name.set_value(&mut person, "Pavel".to_string()).unwrap();
        assert_eq!(keys.name.of(&person), Some("Pavel".to_string()));
        assert!(!keys.name.is_default(&person));

        keys.name.clear(&mut person).unwrap();
        assert_eq!(keys.name.of(&person), Some(String::new()));
    }

    #[test]
    fn test_with_defaults() {
        let store = ArrayStore::with_defaults(Person::keys().key_list.clone());
        assert_eq!(store.values()[1], Value::Text(String::new()));
        assert_eq!(store.values()[0], Value::Null);
    }

    #[test]
    fn test_foreign_key() {
        let mut store = ArrayStore::new(Person::keys().key_list.clone());
        let city = Address::keys().city.untyped();

        assert_eq!(store.read_value(city), Value::Null);
        let err = store
            .write_value(city, Value::Text("Prague".to_string()))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownKey { .. }));
    }

    #[test]
    fn test_type_check() {
        let mut store = ArrayStore::new(Person::keys().key_list.clone());
        let id = Person::keys().id.untyped();

        assert!(store.write_value(id, Value::BigInt(1)).is_ok());
        assert!(store.write_value(id, Value::Null).is_ok());
        assert!(store.write_value(id, Value::Text("1".to_string())).is_err());
    }
}
