//! Event loop implementation.
//!
//! This module provides the main event loop that coordinates task and microtask
//! execution following the JavaScript event loop model, together with the
//! timers and blocking I/O that feed it tasks.

use crate::error::RuntimeError;
use crate::io::IoHandle;
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
use crate::timer::{ClockMode, Timers};
use core_types::Value;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

/// Callback invoked for each rejection still unhandled after a microtask
/// checkpoint.
pub type UnhandledRejectionHook = Box<dyn FnMut(&Promise, &Value)>;

/// Runtime configuration for an [`EventLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventLoopConfig {
    /// How timers measure time.
    pub clock: ClockMode,
}

impl EventLoopConfig {
    /// Virtual time: timers fire in deadline order without sleeping.
    pub fn virtual_time() -> Self {
        Self {
            clock: ClockMode::Virtual,
        }
    }

    /// Wall-clock time: the loop sleeps until timers are due.
    pub fn real_time() -> Self {
        Self {
            clock: ClockMode::Real,
        }
    }

    /// Replaces the clock mode.
    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }
}

/// The JavaScript event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks, including ones queued during the drain
/// 3. Reports promises that were rejected and are still unhandled
/// 4. Repeats
///
/// When no task is ready, due timers and finished I/O jobs become tasks.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Promise};
/// use core_types::Value;
/// use std::time::Duration;
///
/// let mut event_loop = EventLoop::new();
/// let timers = event_loop.timers();
/// let promise = Promise::new(&event_loop.scheduler(), move |resolvers| {
///     timers.set_timeout(Duration::from_millis(10), move || {
///         resolvers.resolve(Value::Smi(1));
///         Ok(())
///     });
///     Ok(())
/// });
///
/// event_loop.run_until_done().unwrap();
/// assert_eq!(promise.value(), Some(Value::Smi(1)));
/// assert_eq!(event_loop.now(), Duration::from_millis(10));
/// ```
pub struct EventLoop {
    task_queue: TaskQueue,
    microtasks: Rc<MicrotaskQueue>,
    timers: Timers,
    io: IoHandle,
    unhandled_hook: Option<UnhandledRejectionHook>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues on a virtual clock.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given configuration.
    pub fn with_config(config: EventLoopConfig) -> Self {
        Self {
            task_queue: TaskQueue::new(),
            microtasks: Rc::new(MicrotaskQueue::new()),
            timers: Timers::new(config.clock),
            io: IoHandle::new(),
            unhandled_hook: None,
        }
    }

    /// The scheduler promises created for this loop should use.
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        self.microtasks.clone()
    }

    /// A handle to this loop's timers.
    pub fn timers(&self) -> Timers {
        self.timers.clone()
    }

    /// A handle for handing blocking jobs to worker threads.
    pub fn io(&self) -> IoHandle {
        self.io.clone()
    }

    /// Time elapsed on the loop clock.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Installs a callback for rejections left unhandled after a microtask
    /// checkpoint. Such rejections are always logged at `warn` as well.
    pub fn on_unhandled_rejection<F>(&mut self, hook: F)
    where
        F: FnMut(&Promise, &Value) + 'static,
    {
        self.unhandled_hook = Some(Box::new(hook));
    }

    /// Runs the event loop until no task, microtask, timer or I/O job remains.
    ///
    /// # Returns
    ///
    /// `Ok(())` once idle, or the first error a task threw. Rejected promises
    /// are not errors here.
    pub fn run_until_done(&mut self) -> Result<(), RuntimeError> {
        loop {
            self.run_all_microtasks();
            for task in self.io.take_ready()? {
                self.task_queue.enqueue(task);
            }

            if let Some(task) = self.task_queue.dequeue() {
                self.run_task(task)?;
                continue;
            }

            let due = self.timers.take_due();
            if !due.is_empty() {
                for task in due {
                    self.task_queue.enqueue(task);
                }
                continue;
            }

            match (self.timers.next_deadline(), self.io.has_pending()) {
                (None, false) => {
                    debug!(now_ms = self.now().as_millis() as u64, "event loop idle");
                    return Ok(());
                }
                (None, true) => self.wait_for_io(None)?,
                (Some(deadline), false) => {
                    debug!(deadline_ms = deadline.as_millis() as u64, "advancing to next timer");
                    self.timers.advance_to(deadline);
                }
                (Some(deadline), true) => match self.timers.clock_mode() {
                    // I/O takes no virtual time, so it always finishes first.
                    ClockMode::Virtual => self.wait_for_io(None)?,
                    ClockMode::Real => {
                        let timeout = deadline.saturating_sub(self.now());
                        self.wait_for_io(Some(timeout))?;
                    }
                },
            }
        }
    }

    fn wait_for_io(&mut self, timeout: Option<Duration>) -> Result<(), RuntimeError> {
        if let Some(task) = self.io.wait(timeout)? {
            self.task_queue.enqueue(task);
        }
        Ok(())
    }

    fn run_task(&mut self, task: Task) -> Result<(), RuntimeError> {
        task.run().map_err(|thrown| {
            warn!(error = %thrown, "uncaught exception in task");
            RuntimeError::UncaughtException(thrown)
        })
    }

    /// Adds a task to the task queue.
    ///
    /// The task will be executed in the next available iteration of the event loop.
    pub fn enqueue_task(&mut self, task: Task) {
        self.task_queue.enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    ///
    /// The microtask will be executed after the current task completes.
    pub fn enqueue_microtask(&mut self, microtask: MicroTask) {
        self.microtasks.enqueue(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.microtasks.is_empty()
    }

    /// Runs all microtasks in the queue until empty, then reports unhandled
    /// rejections.
    ///
    /// New microtasks added during execution will also be processed before
    /// this method returns.
    pub fn run_all_microtasks(&mut self) {
        let ran = self.microtasks.run_until_idle();
        if ran > 0 {
            debug!(microtasks = ran, "microtask checkpoint");
        }
        self.report_unhandled_rejections();
    }

    fn report_unhandled_rejections(&mut self) {
        for promise in self.microtasks.take_pending_rejections() {
            if promise.is_handled() {
                continue;
            }
            let reason = promise.reason().unwrap_or(Value::Undefined);
            warn!(promise_id = promise.id(), reason = %reason, "unhandled promise rejection");
            if let Some(hook) = self.unhandled_hook.as_mut() {
                hook(&promise, &reason);
            }
        }
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    ///
    /// This represents one iteration of the event loop. Timers and I/O are
    /// not polled.
    pub fn process_one_cycle(&mut self) -> Result<(), RuntimeError> {
        if let Some(task) = self.task_queue.dequeue() {
            self.run_task(task)?;
        }
        self.run_all_microtasks();
        Ok(())
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        let (microtasks, timers) = (self.microtasks.len(), self.timers.len());
        if microtasks > 0 || timers > 0 || self.io.has_pending() {
            debug!(microtasks, timers, io = self.io.pending_count(), "dropping unfinished work");
        }
        // Promises hold the scheduler, so anything left queued would keep the
        // whole graph alive.
        self.microtasks.clear();
        self.timers.clear();
        self.io.clear();
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("tasks", &self.task_queue.len())
            .field("microtasks", &self.microtasks.len())
            .field("timers", &self.timers)
            .field("io", &self.io)
            .finish()
    }
}
