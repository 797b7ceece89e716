//! Task and microtask queue management.
//!
//! This module provides the task and microtask queues used by the event loop.
//! Tasks are executed one at a time, with all microtasks draining after each task.

use crate::promise::Promise;
use crate::scheduler::{RejectionOperation, Scheduler};
use core_types::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

/// A task to be executed by the event loop.
///
/// Tasks represent work to be done in a later iteration of the event loop,
/// such as timer callbacks and I/O completions. A task that fails reports an
/// uncaught exception.
pub struct Task {
    callback: Box<dyn FnOnce() -> Result<(), Value>>,
}

impl Task {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    ///
    /// `Err` carries the value the task threw.
    pub fn run(self) -> Result<(), Value> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A microtask to be executed by the event loop.
///
/// Promise reactions are microtasks. They cannot fail: a handler that throws
/// has already been turned into a rejection by the time the task finishes.
pub struct MicroTask {
    callback: Box<dyn FnOnce()>,
}

impl MicroTask {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the microtask.
    pub fn run(self) {
        (self.callback)()
    }
}

impl std::fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MicroTask {{ ... }}")
    }
}

/// A queue for tasks.
///
/// Tasks are processed in FIFO order, one at a time.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a task to the end of the queue.
    pub fn enqueue(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// A queue for microtasks, and the default [`Scheduler`].
///
/// The queue is shared (`Rc<MicrotaskQueue>`) between the event loop and every
/// promise created against it, so all methods take `&self`. Microtasks queued
/// while the queue drains run in the same drain.
///
/// It also records promises rejected without a handler so the event loop can
/// report them after each checkpoint.
#[derive(Debug, Default)]
pub struct MicrotaskQueue {
    queue: RefCell<VecDeque<MicroTask>>,
    rejections: RefCell<Vec<Promise>>,
}

impl MicrotaskQueue {
    /// Creates a new empty MicrotaskQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a microtask to the end of the queue.
    pub fn enqueue(&self, microtask: MicroTask) {
        self.queue.borrow_mut().push_back(microtask);
    }

    /// Removes and returns the next microtask from the queue.
    pub fn dequeue(&self) -> Option<MicroTask> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns the number of microtasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs microtasks until the queue is empty and returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        // The borrow ends with the statement, so the task may enqueue more.
        while let Some(microtask) = self.dequeue() {
            microtask.run();
            ran += 1;
        }
        ran
    }

    /// Drops every queued microtask and pending rejection without running
    /// anything.
    ///
    /// Queued reactions and tracked rejections keep their promises alive,
    /// and every promise keeps its scheduler alive, until drained or cleared.
    pub fn clear(&self) {
        let queued = std::mem::take(&mut *self.queue.borrow_mut());
        let rejections = std::mem::take(&mut *self.rejections.borrow_mut());
        drop((queued, rejections));
    }

    /// Takes the promises reported as rejected-without-handler since the
    /// last call.
    pub fn take_pending_rejections(&self) -> Vec<Promise> {
        std::mem::take(&mut *self.rejections.borrow_mut())
    }
}

impl Scheduler for MicrotaskQueue {
    fn schedule(&self, task: MicroTask) {
        self.enqueue(task);
    }

    fn track_rejection(&self, promise: &Promise, operation: RejectionOperation) {
        let mut rejections = self.rejections.borrow_mut();
        match operation {
            RejectionOperation::Reject => rejections.push(promise.clone()),
            RejectionOperation::Handle => rejections.retain(|p| !p.ptr_eq(promise)),
        }
    }
}
