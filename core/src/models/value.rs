//! Runtime values stored by Ujo objects
//!
//! This module provides the closed value type kept in every storage strategy
//! and the `KeyValue` bridge between Rust types and runtime values.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Runtime type token of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Integer (32-bit)
    Integer,

    /// Big integer (64-bit)
    BigInt,

    /// Floating point (64-bit)
    Float,

    /// Text string
    Text,

    /// Binary data
    Binary,

    /// Boolean
    Boolean,

    /// UUID
    Uuid,

    /// Timestamp
    Timestamp,

    /// JSON data
    Json,

    /// Ordered list of values
    List,

    /// Reference to a related domain object
    Relation,

    /// Null value
    Null,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(self, f)
    }
}

/// Value of a key
#[derive(Clone, Serialize, Deserialize)]
pub enum Value {
    /// Integer (32-bit)
    Integer(i32),

    /// Big integer (64-bit)
    BigInt(i64),

    /// Floating point (64-bit)
    Float(f64),

    /// Text string
    Text(String),

    /// Binary data
    Binary(Vec<u8>),

    /// Boolean
    Boolean(bool),

    /// UUID
    Uuid(Uuid),

    /// Timestamp (as milliseconds since Unix epoch)
    Timestamp(i64),

    /// JSON data
    Json(String),

    /// Ordered list, used by IN operands and composite foreign keys
    List(Vec<Value>),

    /// Null value
    Null,
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Integer(v) => write!(f, "Integer({})", v),
            Value::BigInt(v) => write!(f, "BigInt({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Text(v) => {
                if v.chars().count() > 20 {
                    let head: String = v.chars().take(20).collect();
                    write!(f, "Text(\"{}...\")", head)
                } else {
                    write!(f, "Text(\"{}\")", v)
                }
            }
            Value::Binary(v) => {
                if v.len() > 10 {
                    write!(f, "Binary({} bytes)", v.len())
                } else {
                    write!(f, "Binary({:?})", v)
                }
            }
            Value::Boolean(v) => write!(f, "Boolean({})", v),
            Value::Uuid(v) => write!(f, "Uuid({})", v),
            Value::Timestamp(v) => write!(f, "Timestamp({})", v),
            Value::Json(v) => write!(f, "Json({})", v),
            Value::List(v) => f.debug_list().entries(v.iter()).finish(),
            Value::Null => write!(f, "Null"),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Text(v) => write!(f, "\"{}\"", v),
            Value::Binary(v) => write!(f, "[{} bytes]", v.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "null"),
            other => match other.as_text() {
                Some(text) => write!(f, "{}", text),
                None => write!(f, "null"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                // Special handling for NaN
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Get the type of the value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Binary(_) => ValueType::Binary,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Json(_) => ValueType::Json,
            Value::List(_) => ValueType::List,
            Value::Null => ValueType::Null,
        }
    }

    /// Is the value null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value, both widths included
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view of any numeric value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(f64::from(*v)),
            Value::BigInt(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Plain text form of a scalar value, `None` for null and lists
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Text(v) | Value::Json(v) => Some(Cow::Borrowed(v.as_str())),
            Value::Integer(v) => Some(Cow::Owned(v.to_string())),
            Value::BigInt(v) => Some(Cow::Owned(v.to_string())),
            Value::Float(v) => Some(Cow::Owned(v.to_string())),
            Value::Boolean(v) => Some(Cow::Owned(v.to_string())),
            Value::Uuid(v) => Some(Cow::Owned(v.hyphenated().to_string())),
            Value::Timestamp(v) => Some(Cow::Owned(v.to_string())),
            Value::Binary(v) => Some(String::from_utf8_lossy(v)),
            Value::List(_) | Value::Null => None,
        }
    }

    /// Equality where numeric values compare across their widths
    pub fn loose_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return a == b;
        }
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a == b || (a.is_nan() && b.is_nan()),
                    _ => false,
                }
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            _ => self == other,
        }
    }

    /// Ordering of two comparable values, `None` for null or incomparable values
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Json(a), Value::Json(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Binary(a), Value::Binary(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert the value to the target type, used for values read from a database
    pub fn coerce(self, target: ValueType) -> Result<Value> {
        let actual = self.value_type();
        if actual == target
            || actual == ValueType::Null
            || target == ValueType::Relation
        {
            return Ok(self);
        }

        let converted = match (target, &self) {
            (ValueType::Integer, _) => self
                .as_i64()
                .or_else(|| self.as_bool_number())
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Integer),
            (ValueType::BigInt, Value::Timestamp(v)) => Some(Value::BigInt(*v)),
            (ValueType::BigInt, _) => self
                .as_i64()
                .or_else(|| self.as_bool_number())
                .map(Value::BigInt),
            (ValueType::Float, _) => self.as_f64().map(Value::Float),
            (ValueType::Boolean, _) => self.as_i64().map(|v| Value::Boolean(v != 0)),
            (ValueType::Text, Value::Json(v)) => Some(Value::Text(v.clone())),
            (ValueType::Json, Value::Text(v)) => Some(Value::Json(v.clone())),
            (ValueType::Uuid, Value::Text(v)) => Uuid::parse_str(v).ok().map(Value::Uuid),
            (ValueType::Uuid, Value::Binary(v)) => Uuid::from_slice(v).ok().map(Value::Uuid),
            (ValueType::Timestamp, _) => self.as_i64().map(Value::Timestamp),
            (ValueType::Binary, Value::Text(v)) => Some(Value::Binary(v.as_bytes().to_vec())),
            _ => None,
        };

        converted.ok_or_else(|| {
            CoreError::InvalidArgument(format!("Cannot convert {:?} to {}", self, target))
        })
    }

    fn as_bool_number(&self) -> Option<i64> {
        match self {
            Value::Boolean(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.timestamp_millis())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A Rust type which can be stored under a key
pub trait KeyValue: Sized + Clone {
    /// Type token of the stored value
    const VALUE_TYPE: ValueType;

    /// Convert to a runtime value
    fn into_value(self) -> Value;

    /// Convert from a runtime value, `None` for null or a foreign type
    fn from_value(value: Value) -> Option<Self>;
}

/// Marker of values accepted by text operators (STARTS, CONTAINS, ...)
pub trait TextValue: KeyValue {}

impl TextValue for String {}

impl KeyValue for i32 {
    const VALUE_TYPE: ValueType = ValueType::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl KeyValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::BigInt;

    fn into_value(self) -> Value {
        Value::BigInt(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl KeyValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl KeyValue for String {
    const VALUE_TYPE: ValueType = ValueType::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl KeyValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Boolean;

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Boolean(v) => Some(v),
            _ => None,
        }
    }
}

impl KeyValue for Uuid {
    const VALUE_TYPE: ValueType = ValueType::Uuid;

    fn into_value(self) -> Value {
        Value::Uuid(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Uuid(v) => Some(v),
            Value::Text(v) => Uuid::parse_str(&v).ok(),
            _ => None,
        }
    }
}

impl KeyValue for Vec<u8> {
    const VALUE_TYPE: ValueType = ValueType::Binary;

    fn into_value(self) -> Value {
        Value::Binary(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }
}

impl KeyValue for DateTime<Utc> {
    const VALUE_TYPE: ValueType = ValueType::Timestamp;

    fn into_value(self) -> Value {
        Value::Timestamp(self.timestamp_millis())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Timestamp(millis) => Utc.timestamp_millis_opt(millis).single(),
            _ => None,
        }
    }
}

impl KeyValue for serde_json::Value {
    const VALUE_TYPE: ValueType = ValueType::Json;

    fn into_value(self) -> Value {
        Value::Json(self.to_string())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Json(v) => serde_json::from_str(&v).ok(),
            _ => None,
        }
    }
}
