//! Error types for the core crate
//!
//! This module provides a consolidated error type for key metadata,
//! Ujo storage and criterion evaluation.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Null or otherwise invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation is not allowed in the current state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Operation is not supported
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The key does not belong to the key list of the object
    #[error("Unknown key '{key}' for the domain {domain}")]
    UnknownKey {
        /// Key name
        key: String,
        /// Domain name of the object
        domain: String,
    },

    /// Value type does not match the key type
    #[error("Type mismatch for the key '{key}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Key name
        key: String,
        /// Expected type
        expected: String,
        /// Actual type
        actual: String,
    },

    /// Value rejected by a key validator
    #[error("Validation of the key '{key}' failed: {message}")]
    Validation {
        /// Key name
        key: String,
        /// Validator message
        message: String,
    },

    /// Duplicate key name
    #[error("Duplicate key name '{0}'")]
    Duplicate(String),

    /// Regular expression error
    #[error("Regular expression error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, CoreError>;

/// Convert a displayable error to an InvalidArgument
pub fn to_invalid_argument<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::InvalidArgument(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let core_err: CoreError = json_err.into();
        assert!(matches!(core_err, CoreError::Json(_)));

        let regex_err = regex::Regex::new("(").unwrap_err();
        let core_err: CoreError = regex_err.into();
        assert!(matches!(core_err, CoreError::Regex(_)));

        match to_invalid_argument("empty name") {
            CoreError::InvalidArgument(msg) => assert_eq!(msg, "empty name"),
            _ => panic!("Expected InvalidArgument variant"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::UnknownKey {
            key: "name".to_string(),
            domain: "Person".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown key 'name' for the domain Person");

        let err = CoreError::TypeMismatch {
            key: "id".to_string(),
            expected: "BigInt".to_string(),
            actual: "Text".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for the key 'id': expected BigInt, got Text"
        );
    }
}
