//! Key factory
//!
//! The factory creates the keys of one domain type, assigns their indices
//! and locks them into a `KeyList`. Keys are usable right after creation,
//! their name and index become final by the call `lock()`.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use log::debug;

use crate::error::{CoreError, Result};
use crate::ujo::Ujo;
use crate::utils::StringUtils;
use super::key::{AnyKey, Key, PropertyModifier};
use super::key_list::KeyList;
use super::validator::Validator;
use super::value::{KeyValue, Value, ValueType};

/// Factory of the keys of the domain `U`
pub struct KeyFactory<U> {
    /// Domain name
    domain: Arc<str>,

    /// Convert constant style names to the camel case
    camel_case: bool,

    /// Locked keys of the parent domain
    parent: Option<KeyList>,

    /// Keys in the declaration order
    keys: Vec<AnyKey>,

    _marker: PhantomData<fn(&U)>,
}

impl<U> KeyFactory<U> {
    /// Create a factory of a domain type
    pub fn new(domain: &str) -> Self {
        KeyFactory {
            domain: Arc::from(domain),
            camel_case: false,
            parent: None,
            keys: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Create a factory of a child domain, indices start at the parent size
    pub fn inherit(domain: &str, parent: &KeyList) -> Self {
        KeyFactory {
            parent: Some(parent.clone()),
            ..Self::new(domain)
        }
    }

    /// Convert names like `FIRST_NAME` to `firstName`
    pub fn camel_case(mut self) -> Self {
        self.camel_case = true;
        self
    }

    /// Key count including the parent keys
    pub fn size(&self) -> usize {
        self.offset() + self.keys.len()
    }

    fn offset(&self) -> usize {
        self.parent.as_ref().map_or(0, KeyList::len)
    }

    fn create(
        &mut self,
        name: &str,
        value_type: ValueType,
        default: Value,
        validator: Option<Validator>,
    ) -> AnyKey {
        let name = if self.camel_case {
            StringUtils::constant_to_camel(name)
        } else {
            name.to_string()
        };
        let key = AnyKey::new(self.domain.clone(), &name, value_type, default, validator);
        PropertyModifier::set_index(&key, self.size());
        self.keys.push(key.clone());
        key
    }

    /// Create a key without a default value
    pub fn new_key<V: KeyValue>(&mut self, name: &str) -> Key<U, V> {
        Key::from_any(self.create(name, V::VALUE_TYPE, Value::Null, None))
    }

    /// Create a key with a default value
    pub fn new_key_default<V: KeyValue>(&mut self, name: &str, default: V) -> Key<U, V> {
        Key::from_any(self.create(name, V::VALUE_TYPE, default.into_value(), None))
    }

    /// Create a key with a validator and an optional default value
    pub fn new_key_validated<V: KeyValue>(
        &mut self,
        name: &str,
        default: Option<V>,
        validator: Validator,
    ) -> Key<U, V> {
        let default = default.map_or(Value::Null, KeyValue::into_value);
        Key::from_any(self.create(name, V::VALUE_TYPE, default, Some(validator)))
    }

    /// Create a relation key to the domain `R`
    pub fn new_relation<R: Ujo>(&mut self, name: &str) -> Key<U, R> {
        Key::from_any(self.create(name, ValueType::Relation, Value::Null, None))
    }

    /// Re-expose a parent key as a key of the child domain
    pub fn inherit_key<P, V>(&self, key: &Key<P, V>) -> Result<Key<U, V>> {
        match &self.parent {
            Some(parent) if parent.contains(key.untyped()) => {
                Ok(Key::from_any(key.untyped().clone()))
            }
            _ => Err(CoreError::UnknownKey {
                key: key.name().to_string(),
                domain: self.domain.to_string(),
            }),
        }
    }

    /// Assign the final indices, check the names and freeze all keys
    pub fn lock(self) -> Result<KeyList> {
        let offset = self.offset();
        let mut all: Vec<AnyKey> = match &self.parent {
            Some(parent) => parent.iter().cloned().collect(),
            None => Vec::new(),
        };
        let mut names: HashSet<Arc<str>> = all.iter().map(AnyKey::name).collect();

        for (position, key) in self.keys.iter().enumerate() {
            let name = key.name();
            if name.trim().is_empty() {
                return Err(CoreError::InvalidArgument(format!(
                    "Key name of the domain {} must not be empty",
                    self.domain
                )));
            }
            if !names.insert(name.clone()) {
                return Err(CoreError::Duplicate(format!("{}.{}", self.domain, name)));
            }
            PropertyModifier::set_index(key, offset + position);
        }

        for key in &self.keys {
            PropertyModifier::lock(key)?;
        }
        all.extend(self.keys);

        debug!("Locked {} keys of the domain {}", all.len(), self.domain);
        Ok(KeyList::new(self.domain, all))
    }
}
