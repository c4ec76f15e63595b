//! Locked, ordered key lists

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::slice::Iter;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use super::key::AnyKey;

struct KeyListInner {
    domain: Arc<str>,
    keys: Vec<AnyKey>,
    by_name: HashMap<Arc<str>, usize>,
}

/// Immutable ordered list of the locked keys of one domain type
///
/// The position of every key equals its index. Clones share the same list.
#[derive(Clone)]
pub struct KeyList {
    inner: Arc<KeyListInner>,
}

impl KeyList {
    pub(crate) fn new(domain: Arc<str>, keys: Vec<AnyKey>) -> Self {
        let by_name = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.name(), i))
            .collect();
        KeyList {
            inner: Arc::new(KeyListInner {
                domain,
                keys,
                by_name,
            }),
        }
    }

    /// Name of the domain type
    pub fn domain(&self) -> &str {
        &self.inner.domain
    }

    /// Key count
    pub fn len(&self) -> usize {
        self.inner.keys.len()
    }

    /// Is the list empty
    pub fn is_empty(&self) -> bool {
        self.inner.keys.is_empty()
    }

    /// Key of the index
    pub fn get(&self, index: usize) -> Option<&AnyKey> {
        self.inner.keys.get(index)
    }

    /// Key of the name
    pub fn find(&self, name: &str) -> Option<&AnyKey> {
        self.inner.by_name.get(name).map(|i| &self.inner.keys[*i])
    }

    /// Key of the name or an `UnknownKey` error
    pub fn find_required(&self, name: &str) -> Result<&AnyKey> {
        self.find(name).ok_or_else(|| CoreError::UnknownKey {
            key: name.to_string(),
            domain: self.domain().to_string(),
        })
    }

    /// Does the key belong to the list
    pub fn contains(&self, key: &AnyKey) -> bool {
        key.index()
            .and_then(|i| self.get(i))
            .map_or(false, |found| found == key)
    }

    /// Iterate the keys in the index order
    pub fn iter(&self) -> Iter<'_, AnyKey> {
        self.inner.keys.iter()
    }

    /// Keys as a slice
    pub fn as_slice(&self) -> &[AnyKey] {
        &self.inner.keys
    }

    /// Unknown key error of this list
    pub(crate) fn unknown_key(&self, key: &AnyKey) -> CoreError {
        CoreError::UnknownKey {
            key: key.name().to_string(),
            domain: self.domain().to_string(),
        }
    }
}

impl PartialEq for KeyList {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.keys == other.inner.keys
    }
}

impl Debug for KeyList {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let names: Vec<_> = self.iter().map(|key| key.name()).collect();
        f.debug_struct("KeyList")
            .field("domain", &self.domain())
            .field("keys", &names)
            .finish()
    }
}

impl<'a> IntoIterator for &'a KeyList {
    type Item = &'a AnyKey;
    type IntoIter = Iter<'a, AnyKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Key, KeyFactory};

    struct Item;

    #[test]
    fn test_lookup() {
        let mut factory = KeyFactory::<Item>::new("Item");
        let id: Key<Item, i64> = factory.new_key("id");
        let name: Key<Item, String> = factory.new_key("name");
        let keys = factory.lock().unwrap();

        assert_eq!(keys.domain(), "Item");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get(0), Some(id.untyped()));
        assert_eq!(keys.find("name"), Some(name.untyped()));
        assert!(keys.find("missing").is_none());
        assert!(keys.find_required("missing").is_err());
        assert!(keys.contains(name.untyped()));

        let names: Vec<String> = keys.iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_foreign_key_is_not_contained() {
        let mut first = KeyFactory::<Item>::new("First");
        let _a: Key<Item, i32> = first.new_key("a");
        let first = first.lock().unwrap();

        let mut second = KeyFactory::<Item>::new("Second");
        let b: Key<Item, i32> = second.new_key("a");
        let _second = second.lock().unwrap();

        assert!(!first.contains(b.untyped()));
        assert_eq!(first.clone(), first);
    }
}
