//! Completion records
//!
//! Every fallible operation returns [`ThrowCompletionOr`]; its `Err` arm is the
//! `Throw` completion and is propagated with `?` before any further side effect.
//! [`Completion`] is the three-way record handed across the host boundary.

use crate::error::JsError;
use crate::value::JsValue;

/// `T | Throw(value)`
pub type ThrowCompletionOr<T> = Result<T, JsError>;

/// Completion record for host-facing results
#[derive(Debug, Clone)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Throw(JsValue),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    pub fn is_throw(&self) -> bool {
        matches!(self, Completion::Throw(_))
    }

    pub fn value(&self) -> &JsValue {
        match self {
            Completion::Normal(v) | Completion::Return(v) | Completion::Throw(v) => v,
        }
    }

    /// `Normal` and `Return` both deliver their value to the caller
    pub fn into_result(self) -> ThrowCompletionOr<JsValue> {
        match self {
            Completion::Normal(v) | Completion::Return(v) => Ok(v),
            Completion::Throw(v) => Err(JsError::Thrown(v)),
        }
    }
}

impl TryFrom<ThrowCompletionOr<JsValue>> for Completion {
    type Error = JsError;

    /// Accepts values and thrown script values. Engine errors are handed back
    /// so the caller can materialize them with `Interpreter::error_to_value`.
    fn try_from(result: ThrowCompletionOr<JsValue>) -> Result<Self, Self::Error> {
        match result {
            Ok(value) => Ok(Completion::Normal(value)),
            Err(JsError::Thrown(value)) => Ok(Completion::Throw(value)),
            Err(err) => Err(err),
        }
    }
}
