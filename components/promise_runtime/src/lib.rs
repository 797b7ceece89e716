//! Promise runtime: deferred values on a single-threaded event loop.
//!
//! This crate provides:
//! - [`Promise`] - a Promise/A+ deferred value with `then`, `catch` and `finally`
//! - The resolution procedure, including adoption of foreign thenables
//! - The [`combinators`] `all`, `race`, `all_settled` and `any`
//! - [`EventLoop`] - task and microtask queues, timers and blocking I/O
//!
//! # Overview
//!
//! Promises never run handlers synchronously. Every reaction is handed to a
//! [`Scheduler`]; the event loop's [`MicrotaskQueue`] is the usual one, but
//! anything implementing the trait can be injected.
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use promise_runtime::{EventLoop, Task};
//!
//! let mut event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| Ok(())));
//! event_loop.run_until_done().unwrap();
//! ```
//!
//! ## Combinators
//!
//! ```
//! use promise_runtime::{combinators, EventLoop, Promise};
//! use core_types::Value;
//!
//! let mut event_loop = EventLoop::new();
//! let scheduler = event_loop.scheduler();
//! let all = combinators::all(
//!     &scheduler,
//!     vec![Value::Smi(1), Promise::resolved(&scheduler, Value::Smi(2)).into()],
//! );
//! event_loop.run_until_done().unwrap();
//! assert_eq!(all.value(), Some(Value::Array(vec![Value::Smi(1), Value::Smi(2)])));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod constructor;
pub mod error;
pub mod event_loop;
pub mod io;
pub mod promise;
pub mod resolution;
pub mod scheduler;
pub mod task_queue;
pub mod timer;

// Re-export main types at crate root
pub use constructor::{is_promise, PromiseConstructor, PromisePrototype};
pub use error::RuntimeError;
pub use event_loop::{EventLoop, EventLoopConfig, UnhandledRejectionHook};
pub use io::IoHandle;
pub use promise::{Promise, PromiseState, ResolvingFunctions};
pub use resolution::{resolve_promise, ResolutionTarget};
pub use scheduler::{RejectionOperation, Scheduler};
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
pub use timer::{Clock, ClockMode, TimerId, Timers};
