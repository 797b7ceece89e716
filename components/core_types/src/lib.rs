//! Core JavaScript value types and error handling.
//!
//! This crate provides the dynamic values that flow through promises:
//! settlement payloads, handler arguments and rejection reasons.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`Function`] - Callable values backed by Rust closures
//! - [`Object`] - Property bags, including foreign thenables
//! - [`JsError`] - JavaScript errors
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let error: Value = JsError::type_error("undefined is not a function").into();
//! assert!(matches!(error, Value::Error(ref e) if e.kind == ErrorKind::TypeError));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod value;

pub use error::{ErrorKind, JsError};
pub use function::{Completion, Function, Object, Property};
pub use value::Value;
