//! The capability promises use to defer work.
//!
//! A promise never runs a reaction itself; it hands a [`MicroTask`] to the
//! scheduler it was created with. Whoever drives the event loop owns the
//! scheduler, so tests can inject a queue and step it by hand.

use crate::promise::Promise;
use crate::task_queue::MicroTask;

/// What happened to a promise with respect to rejection tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// The promise was rejected while nothing was subscribed to it.
    Reject,
    /// A reaction was attached to a promise previously reported as `Reject`.
    Handle,
}

/// Deferred-invocation queue seen by promises.
pub trait Scheduler {
    /// Queues `task` to run after the current synchronous work completes.
    fn schedule(&self, task: MicroTask);

    /// Observes rejections that have no handler yet. The default ignores them.
    fn track_rejection(&self, _promise: &Promise, _operation: RejectionOperation) {}
}
