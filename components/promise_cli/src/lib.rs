//! Promise demo CLI library
//!
//! Provides the argument parser, the scenario [`Runtime`] and the error type
//! behind the `promise-demo` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runtime;

pub use cli::{Cli, Scenario};
pub use error::{CliError, CliResult};
pub use runtime::{Outcome, Runtime, Status};
