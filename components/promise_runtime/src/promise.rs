//! Promise implementation following the Promise/A+ specification.
//!
//! A [`Promise`] is a cheap handle onto shared state. The state only changes
//! through the [`ResolvingFunctions`] handed out at construction, or through
//! the resolution procedure acting on a promise derived by [`Promise::then`].
//! Every handler runs as a microtask on the promise's [`Scheduler`], never
//! inside the call that registered or triggered it.

use crate::resolution::resolve_promise;
use crate::scheduler::{RejectionOperation, Scheduler};
use crate::task_queue::MicroTask;
use core_types::{Function, Value};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// The state of a Promise.
///
/// Promises transition through states according to the Promise/A+ specification.
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactionKind {
    Fulfill,
    Reject,
}

/// A reaction to be triggered when a Promise settles.
///
/// `then` registers one reaction per queue; both point at the same derived
/// promise, and only the one matching the settlement ever runs.
#[derive(Clone)]
pub(crate) struct PromiseReaction {
    kind: ReactionKind,
    handler: Option<Function>,
    capability: ResolvingFunctions,
}

impl PromiseReaction {
    fn run(self, argument: Value) {
        match self.handler {
            Some(handler) => match handler.call(vec![argument]) {
                Ok(next) => self.capability.resolve(next),
                Err(thrown) => self.capability.reject(thrown),
            },
            // Missing handlers pass the settlement one hop forward.
            None => match self.kind {
                ReactionKind::Fulfill => self.capability.resolve(argument),
                ReactionKind::Reject => self.capability.reject(argument),
            },
        }
    }
}

struct PromiseInner {
    state: PromiseState,
    result: Option<Value>,
    fulfill_reactions: Vec<PromiseReaction>,
    reject_reactions: Vec<PromiseReaction>,
    handled: bool,
}

struct PromiseCell {
    id: u64,
    scheduler: Rc<dyn Scheduler>,
    inner: RefCell<PromiseInner>,
}

impl Drop for PromiseCell {
    // A pending reaction owns the promise it settles, and that promise owns
    // the next link's reactions. Chains are unlinked iteratively.
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        let mut worklist = std::mem::take(&mut inner.fulfill_reactions);
        worklist.append(&mut inner.reject_reactions);

        while let Some(reaction) = worklist.pop() {
            let PromiseReaction {
                handler,
                capability,
                ..
            } = reaction;
            drop(handler);
            if let Ok(mut cell) = Rc::try_unwrap(capability.promise.cell) {
                let inner = cell.inner.get_mut();
                worklist.append(&mut inner.fulfill_reactions);
                worklist.append(&mut inner.reject_reactions);
            }
        }
    }
}

/// A JavaScript Promise.
///
/// Promises represent the eventual completion (or failure) of an asynchronous
/// operation and its resulting value. Cloning a `Promise` clones the handle,
/// not the promise.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Promise, PromiseState};
/// use core_types::{Function, Value};
///
/// let mut event_loop = EventLoop::new();
/// let promise = Promise::new(&event_loop.scheduler(), |resolvers| {
///     resolvers.resolve(Value::Smi(41));
///     Ok(())
/// });
/// let next = promise.then(
///     Some(Function::new(|args| match args.first() {
///         Some(Value::Smi(n)) => Ok(Value::Smi(n + 1)),
///         _ => Ok(Value::Undefined),
///     })),
///     None,
/// );
///
/// // Handlers never run synchronously.
/// assert_eq!(next.state(), PromiseState::Pending);
/// event_loop.run_all_microtasks();
/// assert_eq!(next.value(), Some(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Promise {
    cell: Rc<PromiseCell>,
}

impl Promise {
    /// Creates a promise and synchronously runs `executor` with its resolving
    /// functions.
    ///
    /// If the executor returns `Err(reason)`, the promise is rejected with
    /// `reason` unless the executor already resolved it.
    pub fn new<F>(scheduler: &Rc<dyn Scheduler>, executor: F) -> Promise
    where
        F: FnOnce(ResolvingFunctions) -> Result<(), Value>,
    {
        let (promise, resolvers) = Promise::pending(scheduler);
        if let Err(reason) = executor(resolvers.clone()) {
            resolvers.reject(reason);
        }
        promise
    }

    /// Creates a pending promise together with its resolving functions.
    pub fn pending(scheduler: &Rc<dyn Scheduler>) -> (Promise, ResolvingFunctions) {
        let promise = Promise {
            cell: Rc::new(PromiseCell {
                id: NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed),
                scheduler: Rc::clone(scheduler),
                inner: RefCell::new(PromiseInner {
                    state: PromiseState::Pending,
                    result: None,
                    fulfill_reactions: Vec::new(),
                    reject_reactions: Vec::new(),
                    handled: false,
                }),
            }),
        };
        let resolvers = ResolvingFunctions::new(promise.clone());
        (promise, resolvers)
    }

    /// Returns `value` itself if it already is a promise; otherwise a promise
    /// resolved with `value` (adopting it if it is a thenable).
    pub fn resolved(scheduler: &Rc<dyn Scheduler>, value: impl Into<Value>) -> Promise {
        let value = value.into();
        if let Some(promise) = Promise::from_value(&value) {
            return promise;
        }
        let (promise, resolvers) = Promise::pending(scheduler);
        resolvers.resolve(value);
        promise
    }

    /// Returns a promise rejected with `reason`.
    pub fn rejected(scheduler: &Rc<dyn Scheduler>, reason: impl Into<Value>) -> Promise {
        let (promise, resolvers) = Promise::pending(scheduler);
        resolvers.reject(reason);
        promise
    }

    /// Recovers the promise stored in a value by `From<Promise> for Value`.
    pub fn from_value(value: &Value) -> Option<Promise> {
        match value {
            Value::NativeObject(object) => Rc::clone(object)
                .downcast::<PromiseCell>()
                .ok()
                .map(|cell| Promise { cell }),
            _ => None,
        }
    }

    /// Process-unique identifier, used in log fields and error messages.
    pub fn id(&self) -> u64 {
        self.cell.id
    }

    /// The scheduler this promise queues its reactions on.
    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.cell.scheduler
    }

    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        self.cell.inner.borrow().state
    }

    /// Returns true while the promise is pending.
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// The settled value: the result if fulfilled, the reason if rejected.
    pub fn result(&self) -> Option<Value> {
        self.cell.inner.borrow().result.clone()
    }

    /// The result, if fulfilled.
    pub fn value(&self) -> Option<Value> {
        let inner = self.cell.inner.borrow();
        match inner.state {
            PromiseState::Fulfilled => inner.result.clone(),
            _ => None,
        }
    }

    /// The reason, if rejected.
    pub fn reason(&self) -> Option<Value> {
        let inner = self.cell.inner.borrow();
        match inner.state {
            PromiseState::Rejected => inner.result.clone(),
            _ => None,
        }
    }

    /// Returns true once any reaction has been attached.
    pub fn is_handled(&self) -> bool {
        self.cell.inner.borrow().handled
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Checks if there are pending reactions.
    pub fn has_pending_reactions(&self) -> bool {
        let inner = self.cell.inner.borrow();
        !inner.fulfill_reactions.is_empty() || !inner.reject_reactions.is_empty()
    }

    /// Moves a pending promise to `Fulfilled` and schedules its fulfill
    /// reactions in registration order. No-op once settled.
    pub(crate) fn fulfill(&self, value: Value) {
        let reactions = {
            let mut inner = self.cell.inner.borrow_mut();
            if inner.state != PromiseState::Pending {
                return;
            }
            inner.state = PromiseState::Fulfilled;
            inner.result = Some(value.clone());
            inner.reject_reactions.clear();
            std::mem::take(&mut inner.fulfill_reactions)
        };
        trace!(promise_id = self.id(), reactions = reactions.len(), "promise fulfilled");
        for reaction in reactions {
            self.enqueue_reaction(reaction, value.clone());
        }
    }

    /// Moves a pending promise to `Rejected` and schedules its reject
    /// reactions in registration order. No-op once settled.
    pub(crate) fn reject(&self, reason: Value) {
        let (reactions, handled) = {
            let mut inner = self.cell.inner.borrow_mut();
            if inner.state != PromiseState::Pending {
                return;
            }
            inner.state = PromiseState::Rejected;
            inner.result = Some(reason.clone());
            inner.fulfill_reactions.clear();
            (std::mem::take(&mut inner.reject_reactions), inner.handled)
        };
        trace!(promise_id = self.id(), reactions = reactions.len(), "promise rejected");
        if !handled {
            self.cell
                .scheduler
                .track_rejection(self, RejectionOperation::Reject);
        }
        for reaction in reactions {
            self.enqueue_reaction(reaction, reason.clone());
        }
    }

    fn enqueue_reaction(&self, reaction: PromiseReaction, argument: Value) {
        self.cell
            .scheduler
            .schedule(MicroTask::new(move || reaction.run(argument)));
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new Promise resolved with whatever the invoked handler
    /// returns, or rejected with whatever it throws. A missing handler
    /// forwards the settlement unchanged.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        let (derived, capability) = Promise::pending(&self.cell.scheduler);
        let fulfill = PromiseReaction {
            kind: ReactionKind::Fulfill,
            handler: on_fulfilled,
            capability: capability.clone(),
        };
        let reject = PromiseReaction {
            kind: ReactionKind::Reject,
            handler: on_rejected,
            capability,
        };

        let (ready, newly_handled) = {
            let mut inner = self.cell.inner.borrow_mut();
            let was_handled = std::mem::replace(&mut inner.handled, true);
            let settled = inner.result.clone().unwrap_or(Value::Undefined);
            match inner.state {
                PromiseState::Pending => {
                    inner.fulfill_reactions.push(fulfill);
                    inner.reject_reactions.push(reject);
                    (None, false)
                }
                PromiseState::Fulfilled => (Some((fulfill, settled)), false),
                PromiseState::Rejected => (Some((reject, settled)), !was_handled),
            }
        };

        if newly_handled {
            self.cell
                .scheduler
                .track_rejection(self, RejectionOperation::Handle);
        }
        if let Some((reaction, argument)) = ready {
            self.enqueue_reaction(reaction, argument);
        }
        trace!(promise_id = self.id(), derived_id = derived.id(), "reaction registered");
        derived
    }

    /// Sugar for `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Function) -> Promise {
        self.then(None, Some(on_rejected))
    }

    /// Runs `on_finally` with no argument once the promise settles either way,
    /// then forwards the original value or reason.
    ///
    /// If `on_finally` throws, or returns something that resolves to a
    /// rejection, that failure replaces the original outcome.
    pub fn finally(&self, on_finally: Function) -> Promise {
        let scheduler = Rc::clone(&self.cell.scheduler);

        let on_fulfilled = {
            let (callback, scheduler) = (on_finally.clone(), scheduler.clone());
            Function::new(move |args| {
                let value = first_argument(args);
                let outcome = callback.call(Vec::new())?;
                let forward = Function::new(move |_| Ok(value.clone()));
                Ok(Promise::resolved(&scheduler, outcome)
                    .then(Some(forward), None)
                    .into())
            })
        };
        let on_rejected = Function::new(move |args| {
            let reason = first_argument(args);
            let outcome = on_finally.call(Vec::new())?;
            let forward = Function::new(move |_| Err(reason.clone()));
            Ok(Promise::resolved(&scheduler, outcome)
                .then(Some(forward), None)
                .into())
        });

        self.then(Some(on_fulfilled), Some(on_rejected))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.cell.inner.borrow();
        f.debug_struct("Promise")
            .field("id", &self.cell.id)
            .field("state", &inner.state)
            .field("result", &inner.result)
            .finish()
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::NativeObject(promise.cell as Rc<dyn Any>)
    }
}

/// The pair of settlement capabilities bound to one promise.
///
/// Both functions share a single latch: whichever is called first wins and
/// every later call, of either function, is ignored. `resolve` runs the
/// resolution procedure, so resolving with a promise or thenable adopts its
/// eventual state.
#[derive(Clone)]
pub struct ResolvingFunctions {
    promise: Promise,
    already_resolved: Rc<Cell<bool>>,
}

impl ResolvingFunctions {
    fn new(promise: Promise) -> Self {
        Self {
            promise,
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    /// The promise these functions settle.
    pub fn promise(&self) -> &Promise {
        &self.promise
    }

    /// Returns true once either function has been called.
    pub fn is_resolved(&self) -> bool {
        self.already_resolved.get()
    }

    /// Resolves the promise with `value`.
    pub fn resolve(&self, value: impl Into<Value>) {
        if self.already_resolved.replace(true) {
            return;
        }
        resolve_promise(&self.promise, value.into());
    }

    /// Rejects the promise with `reason`.
    pub fn reject(&self, reason: impl Into<Value>) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.promise.reject(reason.into());
    }

    /// Exposes the pair as callable values `(resolve, reject)`, for handing to
    /// script executors and foreign `then` methods.
    pub fn into_functions(self) -> (Function, Function) {
        let resolve = {
            let this = self.clone();
            Function::new(move |args| {
                this.resolve(first_argument(args));
                Ok(Value::Undefined)
            })
        };
        let reject = Function::new(move |args| {
            self.reject(first_argument(args));
            Ok(Value::Undefined)
        });
        (resolve, reject)
    }
}

impl fmt::Debug for ResolvingFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvingFunctions")
            .field("promise", &self.promise.id())
            .field("already_resolved", &self.already_resolved.get())
            .finish()
    }
}

/// The first call argument, or `undefined` when called with none.
pub(crate) fn first_argument(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Undefined)
}
