//! Field storage
//!
//! The values live in ordinary struct fields. Every key is bound to a getter
//! and a setter closure, the accessors are built once per domain type.

use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::models::{AnyKey, Key, KeyList, KeyValue, Value};

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

struct Accessor<T> {
    get: Getter<T>,
    set: Setter<T>,
}

/// Field accessors of the domain `T` ordered by the key index
pub struct FieldAccessors<T> {
    keys: KeyList,
    accessors: Vec<Option<Accessor<T>>>,
}

impl<T> FieldAccessors<T> {
    /// Create accessors with no bound key
    pub fn new(keys: KeyList) -> Self {
        let accessors = keys.iter().map(|_| None).collect();
        FieldAccessors { keys, accessors }
    }

    /// Bind a key to a struct field
    pub fn bind<V, G, S>(mut self, key: &Key<T, V>, get: G, set: S) -> Result<Self>
    where
        V: KeyValue + 'static,
        G: Fn(&T) -> Option<V> + Send + Sync + 'static,
        S: Fn(&mut T, Option<V>) + Send + Sync + 'static,
    {
        let key = key.untyped();
        let index = self.slot(key)?;
        let name: Arc<str> = key.name();
        let value_type = V::VALUE_TYPE;

        let accessor = Accessor {
            get: Box::new(move |target: &T| get(target).map_or(Value::Null, KeyValue::into_value)),
            set: Box::new(move |target: &mut T, value: Value| {
                if value.is_null() {
                    set(target, None);
                    return Ok(());
                }
                let actual = value.value_type();
                match V::from_value(value) {
                    Some(typed) => {
                        set(target, Some(typed));
                        Ok(())
                    }
                    None => Err(CoreError::TypeMismatch {
                        key: name.to_string(),
                        expected: value_type.to_string(),
                        actual: actual.to_string(),
                    }),
                }
            }),
        };
        self.accessors[index] = Some(accessor);
        Ok(self)
    }

    /// Locked keys of the domain
    pub fn keys(&self) -> &KeyList {
        &self.keys
    }

    /// Read the field bound to the key
    pub fn read(&self, target: &T, key: &AnyKey) -> Value {
        match self.accessor(key) {
            Some(accessor) => (accessor.get)(target),
            None => Value::Null,
        }
    }

    /// Write the field bound to the key
    pub fn write(&self, target: &mut T, key: &AnyKey, value: Value) -> Result<()> {
        let accessor = self.accessor(key).ok_or_else(|| self.keys.unknown_key(key))?;
        key.check_value(&value)?;
        (accessor.set)(target, value)
    }

    fn slot(&self, key: &AnyKey) -> Result<usize> {
        match key.index() {
            Some(index) if self.keys.contains(key) => Ok(index),
            _ => Err(self.keys.unknown_key(key)),
        }
    }

    fn accessor(&self, key: &AnyKey) -> Option<&Accessor<T>> {
        let index = self.slot(key).ok()?;
        self.accessors.get(index)?.as_ref()
    }
}
