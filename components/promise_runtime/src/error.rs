//! Error types for the event loop.

use core_types::Value;
use thiserror::Error;

/// Failures that stop [`EventLoop::run_until_done`](crate::EventLoop::run_until_done).
///
/// Rejected promises are not errors at this level; they are values carried
/// by the promise and reported separately when left unhandled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A macrotask (timer callback, I/O completion, queued task) threw.
    #[error("Uncaught exception: {0}")]
    UncaughtException(Value),

    /// A blocking job panicked on its worker thread.
    #[error("blocking I/O job {0} panicked")]
    IoJobPanicked(u64),
}
