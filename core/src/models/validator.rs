//! Key value validators
//!
//! A validator is attached to a key by the factory and checked on every
//! typed write of the key.

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{CoreError, Result};
use super::value::Value;

/// Value validator of a key
#[derive(Debug, Clone)]
pub enum Validator {
    /// The value must not be null
    NotNull,

    /// The value must lie in the closed interval (null passes)
    Range {
        /// Lower bound
        min: Option<Value>,
        /// Upper bound
        max: Option<Value>,
    },

    /// Text length in characters must not exceed the limit (null passes)
    MaxLength(usize),

    /// Text form must match the whole pattern (null passes)
    Pattern(Regex),

    /// All validators must pass
    All(Vec<Validator>),
}

impl Validator {
    /// Range validator with both bounds
    pub fn range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Validator::Range {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    /// Lower bound validator
    pub fn min(min: impl Into<Value>) -> Self {
        Validator::Range {
            min: Some(min.into()),
            max: None,
        }
    }

    /// Pattern validator, the pattern must match the whole text
    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Validator::Pattern(regex))
    }

    /// Combine with another validator
    pub fn and(self, other: Validator) -> Self {
        match self {
            Validator::All(mut items) => {
                items.push(other);
                Validator::All(items)
            }
            first => Validator::All(vec![first, other]),
        }
    }

    /// Check the value, the error contains a human readable message
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            Validator::NotNull => {
                if value.is_null() {
                    Err("value must not be null".to_string())
                } else {
                    Ok(())
                }
            }
            Validator::Range { min, max } => {
                if value.is_null() {
                    return Ok(());
                }
                if let Some(min) = min {
                    match value.compare(min) {
                        Some(Ordering::Less) => return Err(format!("{} is less than {}", value, min)),
                        None => return Err(format!("{} is not comparable with {}", value, min)),
                        _ => {}
                    }
                }
                if let Some(max) = max {
                    match value.compare(max) {
                        Some(Ordering::Greater) => {
                            return Err(format!("{} is greater than {}", value, max))
                        }
                        None => return Err(format!("{} is not comparable with {}", value, max)),
                        _ => {}
                    }
                }
                Ok(())
            }
            Validator::MaxLength(limit) => match value.as_text() {
                Some(text) if text.chars().count() > *limit => {
                    Err(format!("text is longer than {} characters", limit))
                }
                _ => Ok(()),
            },
            Validator::Pattern(regex) => match value.as_text() {
                Some(text) if !regex.is_match(&text) => {
                    Err(format!("{} does not match the pattern {}", value, regex.as_str()))
                }
                _ => Ok(()),
            },
            Validator::All(items) => items.iter().try_for_each(|item| item.check(value)),
        }
    }

    /// Validate a value of the named key
    pub fn validate(&self, key: &str, value: &Value) -> Result<()> {
        self.check(value).map_err(|message| CoreError::Validation {
            key: key.to_string(),
            message,
        })
    }
}
