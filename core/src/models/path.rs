//! Property paths and sort items
//!
//! A property path is a chain of keys where every key except the last one
//! is a relation. `Customer.ADDRESS.add(&Address.CITY)` reads the city of the
//! address of a customer.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use crate::ujo::Ujo;
use super::key::{AnyKey, Key};
use super::value::{KeyValue, Value};

/// Untyped chain of keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    keys: Vec<AnyKey>,
}

impl PropertyPath {
    /// Path of one key
    pub fn direct(key: AnyKey) -> Self {
        PropertyPath { keys: vec![key] }
    }

    /// Append a key to a copy of the path
    pub fn join(&self, key: &AnyKey) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.clone());
        PropertyPath { keys }
    }

    /// Has the path exactly one key
    pub fn is_direct(&self) -> bool {
        self.keys.len() == 1
    }

    /// The first key, it belongs to the root domain
    pub fn first(&self) -> &AnyKey {
        &self.keys[0]
    }

    /// The last key, its value is read by the path
    pub fn last(&self) -> &AnyKey {
        &self.keys[self.keys.len() - 1]
    }

    /// All keys of the path
    pub fn keys(&self) -> &[AnyKey] {
        &self.keys
    }

    /// Relation keys leading to the last key
    pub fn relations(&self) -> &[AnyKey] {
        &self.keys[..self.keys.len() - 1]
    }

    /// Effective value of the last key, `Null` if a relation is not loaded
    pub fn read(&self, ujo: &dyn Ujo) -> Value {
        let mut current = ujo;
        for key in self.relations() {
            match current.read_related(key) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        self.last().effective_value(current)
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// Typed path from the domain `U` to a value `V`
pub struct KeyPath<U, V> {
    path: PropertyPath,
    _marker: PhantomData<fn(&U) -> V>,
}

impl<U, V> Clone for KeyPath<U, V> {
    fn clone(&self) -> Self {
        KeyPath::from_path(self.path.clone())
    }
}

impl<U, V> std::fmt::Debug for KeyPath<U, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "KeyPath({})", self.path)
    }
}

impl<U, V> Display for KeyPath<U, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.path, f)
    }
}

impl<U, V> KeyPath<U, V> {
    pub(crate) fn from_path(path: PropertyPath) -> Self {
        KeyPath {
            path,
            _marker: PhantomData,
        }
    }

    /// Untyped path
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Extend the path by a key of the related domain `V`
    pub fn add<W>(&self, next: &Key<V, W>) -> KeyPath<U, W> {
        KeyPath::from_path(self.path.join(next.untyped()))
    }

    /// Ascending sort item
    pub fn ascending(&self) -> SortKey {
        SortKey::new(self.path.clone(), false)
    }

    /// Descending sort item
    pub fn descending(&self) -> SortKey {
        SortKey::new(self.path.clone(), true)
    }
}

impl<U: Ujo, V: KeyValue> KeyPath<U, V> {
    /// Value of the last key, `None` for null or a broken path
    pub fn of(&self, ujo: &U) -> Option<V> {
        let value = self.path.read(ujo);
        if value.is_null() {
            None
        } else {
            V::from_value(value)
        }
    }
}

/// Sort item of a comparator or an `ORDER BY` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    path: PropertyPath,
    descending: bool,
}

impl SortKey {
    /// Create a sort item
    pub fn new(path: PropertyPath, descending: bool) -> Self {
        SortKey { path, descending }
    }

    /// Sorted path
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Is the order descending
    pub fn is_descending(&self) -> bool {
        self.descending
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let direction = if self.descending { "DESC" } else { "ASC" };
        write!(f, "{} {}", self.path, direction)
    }
}
