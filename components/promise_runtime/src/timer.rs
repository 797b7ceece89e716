//! Timers and the loop clock.
//!
//! Timers are kept ordered by deadline, ties broken by the order they were
//! set. The clock is either virtual, jumping straight to the next deadline
//! when the loop has nothing else to do, or real.

use crate::task_queue::Task;
use core_types::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::trace;

/// How the event loop measures time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Time only moves when the loop is idle and a timer is due.
    #[default]
    Virtual,
    /// Monotonic wall-clock time; the loop sleeps until deadlines.
    Real,
}

/// Elapsed time since the loop started.
#[derive(Debug)]
pub struct Clock {
    mode: ClockMode,
    origin: Instant,
    virtual_now: Cell<Duration>,
}

impl Clock {
    /// Creates a clock starting at zero.
    pub fn new(mode: ClockMode) -> Self {
        Self {
            mode,
            origin: Instant::now(),
            virtual_now: Cell::new(Duration::ZERO),
        }
    }

    /// The clock mode.
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Time elapsed since the clock was created.
    pub fn now(&self) -> Duration {
        match self.mode {
            ClockMode::Virtual => self.virtual_now.get(),
            ClockMode::Real => self.origin.elapsed(),
        }
    }

    /// Moves time forward to `deadline`: instantly for a virtual clock,
    /// by sleeping for a real one. Never moves time backwards.
    pub fn advance_to(&self, deadline: Duration) {
        match self.mode {
            ClockMode::Virtual => {
                if deadline > self.virtual_now.get() {
                    self.virtual_now.set(deadline);
                }
            }
            ClockMode::Real => {
                let now = self.origin.elapsed();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
            }
        }
    }
}

/// Identifies a timer so it can be cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type TimerCallback = Box<dyn FnOnce() -> Result<(), Value>>;

struct TimerQueue {
    clock: Clock,
    next_id: Cell<u64>,
    // Keyed by (deadline, id): iteration order is firing order.
    entries: RefCell<BTreeMap<(Duration, u64), TimerCallback>>,
}

/// Shared handle to the loop's timers.
///
/// Handles are cheap to clone, so executors and callbacks can keep one and
/// set further timers without borrowing the event loop.
#[derive(Clone)]
pub struct Timers {
    queue: Rc<TimerQueue>,
}

impl Timers {
    /// Creates an empty timer set on a fresh clock.
    pub fn new(mode: ClockMode) -> Self {
        Self {
            queue: Rc::new(TimerQueue {
                clock: Clock::new(mode),
                next_id: Cell::new(0),
                entries: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Runs `callback` as a task once `delay` has elapsed.
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() -> Result<(), Value> + 'static,
    {
        let id = self.queue.next_id.get();
        self.queue.next_id.set(id + 1);
        // Saturates rather than overflowing.
        let deadline = self.queue.clock.now().checked_add(delay).unwrap_or(Duration::MAX);
        self.queue
            .entries
            .borrow_mut()
            .insert((deadline, id), Box::new(callback));
        trace!(timer_id = id, deadline_ms = deadline.as_millis() as u64, "timer set");
        TimerId(id)
    }

    /// Cancels a timer. Returns false if it already fired or was cleared.
    pub fn clear_timeout(&self, timer: TimerId) -> bool {
        let mut entries = self.queue.entries.borrow_mut();
        let key = entries.keys().find(|(_, id)| *id == timer.0).copied();
        match key {
            Some(key) => entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// The current loop time.
    pub fn now(&self) -> Duration {
        self.queue.clock.now()
    }

    /// The clock mode.
    pub fn clock_mode(&self) -> ClockMode {
        self.queue.clock.mode()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue
            .entries
            .borrow()
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    /// Moves the clock to `deadline`.
    pub fn advance_to(&self, deadline: Duration) {
        self.queue.clock.advance_to(deadline);
    }

    /// Removes every timer due at the current time, in firing order.
    pub fn take_due(&self) -> Vec<Task> {
        let now = self.now();
        let mut entries = self.queue.entries.borrow_mut();
        let mut due = Vec::new();
        while let Some(entry) = entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(Task::new(entry.remove()));
        }
        due
    }

    /// Drops every pending timer without running it.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.queue.entries.borrow_mut());
        drop(dropped);
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.queue.entries.borrow().len()
    }

    /// Returns true if no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.entries.borrow().is_empty()
    }
}

impl fmt::Debug for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timers")
            .field("clock", &self.queue.clock)
            .field("pending", &self.len())
            .finish()
    }
}
