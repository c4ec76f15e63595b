//! Key descriptors
//!
//! A key is an immutable, typed token standing in for one named attribute of
//! a domain type. The untyped `AnyKey` is shared by reference between all
//! typed views; `Key<U, V>` adds the domain and value types.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::warn;

use crate::error::{CoreError, Result};
use crate::ujo::Ujo;
use super::path::{KeyPath, PropertyPath, SortKey};
use super::validator::Validator;
use super::value::{KeyValue, Value, ValueType};

/// Source of process-unique key identifiers
static KEY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Metadata which may change until the key is locked
struct PendingMeta {
    name: Arc<str>,
    index: Option<usize>,
}

/// Metadata of a locked key
struct FrozenMeta {
    name: Arc<str>,
    index: usize,
}

struct KeyCell {
    id: u64,
    domain: Arc<str>,
    value_type: ValueType,
    default: Value,
    validator: Option<Validator>,
    pending: Mutex<PendingMeta>,
    frozen: OnceLock<FrozenMeta>,
}

/// Untyped key handle
#[derive(Clone)]
pub struct AnyKey {
    cell: Arc<KeyCell>,
}

impl AnyKey {
    pub(crate) fn new(
        domain: Arc<str>,
        name: &str,
        value_type: ValueType,
        default: Value,
        validator: Option<Validator>,
    ) -> Self {
        AnyKey {
            cell: Arc::new(KeyCell {
                id: KEY_SEQUENCE.fetch_add(1, Ordering::Relaxed),
                domain,
                value_type,
                default,
                validator,
                pending: Mutex::new(PendingMeta {
                    name: Arc::from(name),
                    index: None,
                }),
                frozen: OnceLock::new(),
            }),
        }
    }

    fn pending(&self) -> MutexGuard<'_, PendingMeta> {
        self.cell
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Process-unique identifier of the key
    pub fn id(&self) -> u64 {
        self.cell.id
    }

    /// Name of the key
    pub fn name(&self) -> Arc<str> {
        match self.cell.frozen.get() {
            Some(meta) => meta.name.clone(),
            None => self.pending().name.clone(),
        }
    }

    /// Ordinal position in the key list, final after the lock
    pub fn index(&self) -> Option<usize> {
        match self.cell.frozen.get() {
            Some(meta) => Some(meta.index),
            None => self.pending().index,
        }
    }

    /// Is the metadata frozen
    pub fn is_locked(&self) -> bool {
        self.cell.frozen.get().is_some()
    }

    /// Name of the declaring domain type
    pub fn domain(&self) -> &str {
        &self.cell.domain
    }

    /// Type token of the key
    pub fn value_type(&self) -> ValueType {
        self.cell.value_type
    }

    /// Default value, `Value::Null` if the key has none
    pub fn default_value(&self) -> &Value {
        &self.cell.default
    }

    /// Validator of the key
    pub fn validator(&self) -> Option<&Validator> {
        self.cell.validator.as_ref()
    }

    /// Does the key reference a related domain object
    pub fn is_relation(&self) -> bool {
        self.cell.value_type == ValueType::Relation
    }

    /// Compare the key name
    pub fn equals_name(&self, name: &str) -> bool {
        &*self.name() == name
    }

    /// Stored value of the object, a null value is replaced by the key default
    pub fn effective_value(&self, ujo: &dyn Ujo) -> Value {
        let value = ujo.read_value(self);
        if value.is_null() {
            self.cell.default.clone()
        } else {
            value
        }
    }

    /// Check the value type against the key type token
    pub fn check_value(&self, value: &Value) -> Result<()> {
        let actual = value.value_type();
        if actual == ValueType::Null || self.is_relation() || actual == self.cell.value_type {
            Ok(())
        } else {
            Err(CoreError::TypeMismatch {
                key: self.name().to_string(),
                expected: self.cell.value_type.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    /// Direct property path of the key
    pub fn path(&self) -> PropertyPath {
        PropertyPath::direct(self.clone())
    }
}

impl PartialEq for AnyKey {
    fn eq(&self, other: &Self) -> bool {
        self.cell.id == other.cell.id
    }
}

impl Eq for AnyKey {}

impl Hash for AnyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.id.hash(state);
    }
}

impl Display for AnyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.name())
    }
}

impl Debug for AnyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Key")
            .field("domain", &self.domain())
            .field("name", &self.name())
            .field("index", &self.index())
            .field("type", &self.value_type())
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Write access to the key metadata before the key is locked
///
/// Every modification of a locked key is ignored and reported by `false`.
#[derive(Debug)]
pub struct PropertyModifier;

impl PropertyModifier {
    /// Rename an unlocked key
    pub fn set_name(key: &AnyKey, name: &str) -> bool {
        if key.is_locked() {
            warn!("Key {} is locked, the new name '{}' is ignored", key, name);
            return false;
        }
        key.pending().name = Arc::from(name);
        true
    }

    /// Assign the index of an unlocked key
    pub fn set_index(key: &AnyKey, index: usize) -> bool {
        if key.is_locked() {
            warn!("Key {} is locked, the new index {} is ignored", key, index);
            return false;
        }
        key.pending().index = Some(index);
        true
    }

    /// Freeze the name and index of the key
    pub fn lock(key: &AnyKey) -> Result<()> {
        if key.is_locked() {
            return Ok(());
        }
        let pending = key.pending();
        let index = pending.index.ok_or_else(|| {
            CoreError::IllegalState(format!("Key {} has no index", pending.name))
        })?;
        let frozen = FrozenMeta {
            name: pending.name.clone(),
            index,
        };
        drop(pending);
        let _ = key.cell.frozen.set(frozen);
        Ok(())
    }
}

/// Typed key of the domain `U` with the value `V`
pub struct Key<U, V> {
    key: AnyKey,
    _marker: PhantomData<fn(&U) -> V>,
}

impl<U, V> Clone for Key<U, V> {
    fn clone(&self) -> Self {
        Key {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<U, V> Debug for Key<U, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.key, f)
    }
}

impl<U, V> Display for Key<U, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.key, f)
    }
}

impl<U, V> PartialEq for Key<U, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<U, V> Eq for Key<U, V> {}

impl<U, V> Key<U, V> {
    pub(crate) fn from_any(key: AnyKey) -> Self {
        Key {
            key,
            _marker: PhantomData,
        }
    }

    /// Untyped handle of the key
    pub fn untyped(&self) -> &AnyKey {
        &self.key
    }

    /// Name of the key
    pub fn name(&self) -> Arc<str> {
        self.key.name()
    }

    /// Index of the key, final after the lock
    pub fn index(&self) -> Option<usize> {
        self.key.index()
    }

    /// Type token of the key
    pub fn value_type(&self) -> ValueType {
        self.key.value_type()
    }

    /// Direct property path of the key
    pub fn path(&self) -> PropertyPath {
        self.key.path()
    }

    /// Ascending sort item
    pub fn ascending(&self) -> SortKey {
        SortKey::new(self.path(), false)
    }

    /// Descending sort item
    pub fn descending(&self) -> SortKey {
        SortKey::new(self.path(), true)
    }

    /// Compose a property path through the related domain `V`
    pub fn add<W>(&self, next: &Key<V, W>) -> KeyPath<U, W> {
        KeyPath::from_path(self.path().join(next.untyped()))
    }
}

impl<U, V: KeyValue> Key<U, V> {
    /// Typed default value
    pub fn default_value(&self) -> Option<V> {
        V::from_value(self.key.default_value().clone())
    }
}

impl<U: Ujo, V: KeyValue> Key<U, V> {
    /// Value of the object, a null value is replaced by the key default
    pub fn of(&self, ujo: &U) -> Option<V> {
        let value = self.key.effective_value(ujo);
        if value.is_null() {
            None
        } else {
            V::from_value(value)
        }
    }

    /// Alias of the method `of`
    pub fn get_value(&self, ujo: &U) -> Option<V> {
        self.of(ujo)
    }

    /// Write the value after the key validation
    pub fn set_value(&self, ujo: &mut U, value: V) -> Result<()> {
        self.write(ujo, value.into_value())
    }

    /// Write an optional value, `None` writes null
    pub fn set_option(&self, ujo: &mut U, value: Option<V>) -> Result<()> {
        self.write(ujo, value.map_or(Value::Null, KeyValue::into_value))
    }

    /// Write null, so the next read returns the default
    pub fn clear(&self, ujo: &mut U) -> Result<()> {
        self.write(ujo, Value::Null)
    }

    /// Is the effective value equal to the default
    pub fn is_default(&self, ujo: &U) -> bool {
        self.key
            .effective_value(ujo)
            .loose_eq(self.key.default_value())
    }

    /// Compare the effective value with the parameter, `None` means null
    pub fn equals(&self, ujo: &U, value: Option<&V>) -> bool {
        let actual = self.key.effective_value(ujo);
        match value {
            Some(value) => actual.loose_eq(&value.clone().into_value()),
            None => actual.is_null(),
        }
    }

    /// Copy the stored value between two objects
    pub fn copy(&self, from: &U, to: &mut U) -> Result<()> {
        let value = from.read_value(&self.key);
        to.write_value(&self.key, value)
    }

    fn write(&self, ujo: &mut U, value: Value) -> Result<()> {
        if let Some(validator) = self.key.validator() {
            validator.validate(&self.key.name(), &value)?;
        }
        ujo.write_value(&self.key, value)
    }
}

impl<U: Ujo, R: Ujo> Key<U, R> {
    /// Stored reference (a foreign key value) of the relation
    pub fn reference(&self, ujo: &U) -> Value {
        ujo.read_value(&self.key)
    }

    /// Store the reference (a foreign key value) of the relation
    pub fn set_reference(&self, ujo: &mut U, value: impl Into<Value>) -> Result<()> {
        ujo.write_value(&self.key, value.into())
    }

    /// Related object if it is loaded
    pub fn related<'a>(&self, ujo: &'a U) -> Option<&'a dyn Ujo> {
        ujo.read_related(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::factory::KeyFactory;
    use crate::ujo::MapStore;

    struct Item;

    #[test]
    fn test_modifier_is_ignored_after_lock() {
        let mut factory = KeyFactory::<Item>::new("Item");
        let name: Key<Item, String> = factory.new_key("name");
        let key = name.untyped().clone();

        assert!(!key.is_locked());
        assert!(PropertyModifier::set_name(&key, "title"));
        assert_eq!(&*key.name(), "title");

        factory.lock().unwrap();
        assert!(key.is_locked());
        assert!(!PropertyModifier::set_name(&key, "label"));
        assert!(!PropertyModifier::set_index(&key, 7));
        assert_eq!(&*key.name(), "title");
        assert_eq!(key.index(), Some(0));
    }

    #[test]
    fn test_check_value() {
        let mut factory = KeyFactory::<Item>::new("Item");
        let id: Key<Item, i64> = factory.new_key("id");
        factory.lock().unwrap();

        assert!(id.untyped().check_value(&Value::BigInt(1)).is_ok());
        assert!(id.untyped().check_value(&Value::Null).is_ok());
        assert!(matches!(
            id.untyped().check_value(&Value::Text("1".to_string())),
            Err(CoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_key_identity() {
        let mut factory = KeyFactory::<Item>::new("Item");
        let a: Key<Item, i32> = factory.new_key("a");
        let b: Key<Item, i32> = factory.new_key("b");
        let keys = factory.lock().unwrap();

        assert_eq!(a, a.clone());
        assert_ne!(a.untyped(), b.untyped());
        assert_eq!(keys.find("b"), Some(b.untyped()));
        assert_eq!(a.to_string(), "a");

        // Typed access requires a Ujo object
        let store = MapStore::new(keys);
        assert_eq!(store.read_keys().len(), 2);
    }
}
