//! The promise resolution procedure.
//!
//! Turns the value a handler returned (or an executor resolved with) into the
//! settlement of the promise waiting on it. Plain values fulfill directly;
//! own promises and foreign thenables are adopted, recursively, so the target
//! ends up in whatever state the innermost value reaches.

use crate::promise::{first_argument, Promise};
use core_types::{Function, JsError, Value};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// What a value turns out to be when probed for a callable `then`.
#[derive(Debug)]
pub enum ResolutionTarget {
    /// Anything without a callable `then`, including `null` and primitives.
    PlainValue(Value),
    /// A promise created by this runtime.
    OwnDeferred(Promise),
    /// A foreign object exposing a callable `then`.
    ForeignThenable {
        /// The object itself
        thenable: Value,
        /// Its `then` member, read exactly once
        then: Function,
    },
}

impl ResolutionTarget {
    /// Classifies `value`, reading `then` at most once.
    ///
    /// Fails with the thrown value when reading `then` throws.
    pub fn probe(value: Value) -> Result<ResolutionTarget, Value> {
        if let Some(promise) = Promise::from_value(&value) {
            return Ok(ResolutionTarget::OwnDeferred(promise));
        }
        if let Value::Object(object) = &value {
            if let Value::Function(then) = object.get("then")? {
                return Ok(ResolutionTarget::ForeignThenable {
                    thenable: value,
                    then,
                });
            }
        }
        Ok(ResolutionTarget::PlainValue(value))
    }
}

/// Resolves `promise` with `x`.
///
/// - `x` is `promise` itself: rejects with a chaining-cycle `TypeError`.
/// - `x` is another promise: adopts its eventual state.
/// - `x` has a callable `then`: calls it with one-shot callbacks.
/// - otherwise: fulfills with `x`.
pub fn resolve_promise(promise: &Promise, x: Value) {
    if let Some(other) = Promise::from_value(&x) {
        if other.ptr_eq(promise) {
            debug!(promise_id = promise.id(), "chaining cycle detected");
            promise.reject(
                JsError::type_error(format!(
                    "Chaining cycle detected for promise #{}",
                    promise.id()
                ))
                .into(),
            );
            return;
        }
    }

    match ResolutionTarget::probe(x) {
        Ok(ResolutionTarget::PlainValue(value)) => promise.fulfill(value),
        Ok(ResolutionTarget::OwnDeferred(other)) => adopt_promise(promise, &other),
        Ok(ResolutionTarget::ForeignThenable { then, .. }) => adopt_thenable(promise, &then),
        Err(thrown) => promise.reject(thrown),
    }
}

fn adopt_promise(promise: &Promise, other: &Promise) {
    debug!(
        promise_id = promise.id(),
        source_id = other.id(),
        "adopting promise"
    );
    let on_fulfilled = {
        let target = promise.clone();
        Function::new(move |args| {
            resolve_promise(&target, first_argument(args));
            Ok(Value::Undefined)
        })
    };
    let on_rejected = {
        let target = promise.clone();
        Function::new(move |args| {
            target.reject(first_argument(args));
            Ok(Value::Undefined)
        })
    };
    other.then(Some(on_fulfilled), Some(on_rejected));
}

fn adopt_thenable(promise: &Promise, then: &Function) {
    debug!(promise_id = promise.id(), "adopting foreign thenable");
    let called = Rc::new(Cell::new(false));

    let on_fulfill = {
        let (target, called) = (promise.clone(), called.clone());
        Function::new(move |args| {
            if !called.replace(true) {
                resolve_promise(&target, first_argument(args));
            }
            Ok(Value::Undefined)
        })
    };
    let on_reject = {
        let (target, called) = (promise.clone(), called.clone());
        Function::new(move |args| {
            if !called.replace(true) {
                target.reject(first_argument(args));
            }
            Ok(Value::Undefined)
        })
    };

    if let Err(thrown) = then.call(vec![on_fulfill.into(), on_reject.into()]) {
        if !called.replace(true) {
            promise.reject(thrown);
        }
    }
}
