//! Map storage

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{AnyKey, KeyList, Value};
use super::Ujo;

/// Map based storage of a Ujo object, only non-null values take memory
#[derive(Debug, Clone)]
pub struct MapStore {
    keys: KeyList,
    values: HashMap<u64, Value>,
}

impl MapStore {
    /// Create an empty storage
    pub fn new(keys: KeyList) -> Self {
        MapStore {
            keys,
            values: HashMap::new(),
        }
    }

    /// Count of the stored non-null values
    pub fn stored_count(&self) -> usize {
        self.values.len()
    }
}

impl Ujo for MapStore {
    fn read_keys(&self) -> &KeyList {
        &self.keys
    }

    fn read_value(&self, key: &AnyKey) -> Value {
        self.values.get(&key.id()).cloned().unwrap_or(Value::Null)
    }

    fn write_value(&mut self, key: &AnyKey, value: Value) -> Result<()> {
        if !self.keys.contains(key) {
            return Err(self.keys.unknown_key(key));
        }
        key.check_value(&value)?;
        if value.is_null() {
            self.values.remove(&key.id());
        } else {
            self.values.insert(key.id(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_domain::{Address, Person};

    #[test]
    fn test_round_trip() {
        let keys = Address::keys();
        let mut address = Address::new();

        assert_eq!(keys.city.of(&address), None);
        keys.city.set_value(&mut address, "Brno".to_string()).unwrap();
        keys.id.set_value(&mut address, 7).unwrap();

        assert_eq!(keys.city.of(&address), Some("Brno".to_string()));
        assert_eq!(keys.id.of(&address), Some(7));
        assert!(keys.city.equals(&address, Some(&"Brno".to_string())));
    }

    #[test]
    fn test_null_removes_value() {
        let mut store = MapStore::new(Address::keys().key_list.clone());
        let city = Address::keys().city.untyped();

        store.write_value(city, Value::Text("Brno".to_string())).unwrap();
        assert_eq!(store.stored_count(), 1);
        store.write_value(city, Value::Null).unwrap();
        assert_eq!(store.stored_count(), 0);
        assert!(store
            .write_value(Person::keys().name.untyped(), Value::Null)
            .is_err());
    }
}
