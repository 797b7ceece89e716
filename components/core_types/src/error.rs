//! JavaScript error values.
//!
//! Errors raised by the promise machinery itself (cycle detection, bad
//! arguments, aggregate failures) are carried as [`JsError`] and travel as
//! ordinary rejection reasons once converted into a [`Value`].

use crate::Value;
use std::fmt;
use thiserror::Error;

/// The kind of JavaScript error.
///
/// These correspond to the built-in error constructors the promise
/// machinery can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain `Error`, used for failures reported by host operations
    Error,
    /// Type error (e.g., a non-callable executor or a chaining cycle)
    TypeError,
    /// Value out of allowed range
    RangeError,
    /// Several failures reported together (`Promise.any`)
    AggregateError,
    /// Internal engine error
    InternalError,
}

impl ErrorKind {
    /// Returns the constructor name of this error kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::AggregateError => "AggregateError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JavaScript error with a message.
///
/// Aggregate errors additionally carry the individual reasons in
/// [`JsError::errors`], in the order of the inputs that produced them.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError};
///
/// let error = JsError::type_error("undefined is not a function");
/// assert_eq!(error.kind, ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Reasons collected by an aggregate error; empty for every other kind
    pub errors: Vec<Value>,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates a `RangeError`.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    /// Creates an `InternalError`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Creates an `AggregateError` carrying `errors` in order.
    pub fn aggregate(errors: Vec<Value>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::AggregateError,
            message: message.into(),
            errors,
        }
    }
}

impl From<JsError> for Value {
    fn from(error: JsError) -> Self {
        Value::Error(error)
    }
}
