//! Error types for the object model
//!
//! `JsError` is the `Throw` case of every fallible operation. Engine-raised
//! errors stay lightweight (`TypeError`/`RangeError` carry only a message) until
//! they become observable to script, at which point
//! [`Interpreter::error_to_value`](crate::Interpreter::error_to_value) turns them
//! into realm-constructed Error objects.

use thiserror::Error;

use crate::value::JsValue;

/// Main error type
#[derive(Debug, Clone, Error)]
pub enum JsError {
    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// A script value was thrown (already materialized)
    #[error("Uncaught {0:?}")]
    Thrown(JsValue),

    /// An engine invariant was violated (stale handle, double initialization)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsError {
    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown(value)
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, JsError::TypeError { .. })
    }

    pub fn is_range_error(&self) -> bool {
        matches!(self, JsError::RangeError { .. })
    }
}
