//! Blocking work handed off to worker threads.
//!
//! Promise state lives on the loop thread only. A blocking job runs on its
//! own thread and sends its result back over a `crossbeam` channel; the
//! completion callback then runs on the loop thread as an ordinary task.

use crate::error::RuntimeError;
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use crate::task_queue::Task;
use core_types::{ErrorKind, JsError, Value};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

type JobOutput = Box<dyn Any + Send>;
type Completion = (u64, thread::Result<JobOutput>);
type CompletionHandler = Box<dyn FnOnce(JobOutput) -> Result<(), Value>>;

struct IoDriver {
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    pending: RefCell<HashMap<u64, CompletionHandler>>,
    next_id: Cell<u64>,
}

/// Handle for starting blocking jobs whose completions feed the event loop.
#[derive(Clone)]
pub struct IoHandle {
    driver: Rc<IoDriver>,
}

impl IoHandle {
    /// Creates a handle with no outstanding jobs.
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            driver: Rc::new(IoDriver {
                sender,
                receiver,
                pending: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Runs `job` on a worker thread; once it returns, `on_complete` runs on
    /// the loop thread with its result. Returns the job id.
    pub fn spawn_blocking<T, J, C>(&self, job: J, on_complete: C) -> u64
    where
        T: Send + 'static,
        J: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) -> Result<(), Value> + 'static,
    {
        let id = self.driver.next_id.get();
        self.driver.next_id.set(id + 1);

        let handler: CompletionHandler = Box::new(move |output: JobOutput| match output.downcast::<T>() {
            Ok(result) => on_complete(*result),
            Err(_) => Err(JsError::internal(format!("job {} produced an unexpected type", id)).into()),
        });
        self.driver.pending.borrow_mut().insert(id, handler);

        let sender = self.driver.sender.clone();
        thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job))
                .map(|result| Box::new(result) as JobOutput);
            // The receiver only goes away with the loop; nobody is left to tell.
            let _ = sender.send((id, outcome));
        });
        debug!(job_id = id, "blocking job started");
        id
    }

    /// Reads a file to a string on a worker thread.
    ///
    /// The returned promise fulfills with the contents, or rejects with an
    /// `Error` naming the path.
    pub fn read_to_string(&self, scheduler: &Rc<dyn Scheduler>, path: impl Into<PathBuf>) -> Promise {
        let path = path.into();
        let display = path.display().to_string();
        let (promise, resolvers) = Promise::pending(scheduler);
        self.spawn_blocking(
            move || std::fs::read_to_string(&path).map_err(|err| err.to_string()),
            move |result: Result<String, String>| {
                match result {
                    Ok(contents) => resolvers.resolve(contents),
                    Err(message) => resolvers.reject(JsError::new(
                        ErrorKind::Error,
                        format!("failed to read {}: {}", display, message),
                    )),
                }
                Ok(())
            },
        );
        promise
    }

    /// Returns true while any job has not been turned into a task yet.
    pub fn has_pending(&self) -> bool {
        !self.driver.pending.borrow().is_empty()
    }

    /// Number of outstanding jobs.
    pub fn pending_count(&self) -> usize {
        self.driver.pending.borrow().len()
    }

    /// Forgets every outstanding job; results that arrive later are
    /// discarded.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.driver.pending.borrow_mut());
        drop(dropped);
    }

    /// Collects every completion that has already arrived, without blocking.
    pub fn take_ready(&self) -> Result<Vec<Task>, RuntimeError> {
        let mut ready = Vec::new();
        while let Ok(completion) = self.driver.receiver.try_recv() {
            if let Some(task) = self.complete(completion)? {
                ready.push(task);
            }
        }
        Ok(ready)
    }

    /// Blocks until one completion arrives or `timeout` elapses.
    ///
    /// Returns `Ok(None)` immediately when no job is outstanding.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Option<Task>, RuntimeError> {
        if !self.has_pending() {
            return Ok(None);
        }
        let completion = match timeout {
            Some(timeout) => match self.driver.receiver.recv_timeout(timeout) {
                Ok(completion) => completion,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(None)
                }
            },
            None => match self.driver.receiver.recv() {
                Ok(completion) => completion,
                Err(_) => return Ok(None),
            },
        };
        self.complete(completion)
    }

    fn complete(&self, (id, outcome): Completion) -> Result<Option<Task>, RuntimeError> {
        let handler = match self.driver.pending.borrow_mut().remove(&id) {
            Some(handler) => handler,
            None => return Ok(None),
        };
        match outcome {
            Ok(output) => {
                debug!(job_id = id, "blocking job completed");
                Ok(Some(Task::new(move || handler(output))))
            }
            Err(_) => {
                warn!(job_id = id, "blocking job panicked");
                Err(RuntimeError::IoJobPanicked(id))
            }
        }
    }
}

impl Default for IoHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoHandle")
            .field("pending", &self.pending_count())
            .finish()
    }
}
