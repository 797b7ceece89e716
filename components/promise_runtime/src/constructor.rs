//! The promise surface as a script engine exposes it.
//!
//! Everything here takes and returns [`Value`]s: executors and handlers are
//! `Value::Function`s and promises travel as `Value::NativeObject`s. Type
//! checks that the typed API gets from the compiler happen here at runtime.

use crate::combinators;
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use core_types::{Function, JsError, Value};
use std::rc::Rc;

/// The `Promise` global: construction and static methods.
#[derive(Debug)]
pub struct PromiseConstructor;

impl PromiseConstructor {
    /// `new Promise(executor)`.
    ///
    /// The executor is called synchronously with `(resolve, reject)`; if it
    /// throws, the promise rejects with the thrown value.
    pub fn construct(scheduler: &Rc<dyn Scheduler>, executor: &Value) -> Result<Value, JsError> {
        let executor = match executor {
            Value::Function(f) => f.clone(),
            other => {
                return Err(JsError::type_error(format!(
                    "Promise resolver {} is not a function",
                    other.type_of()
                )))
            }
        };
        let promise = Promise::new(scheduler, move |resolvers| {
            let (resolve, reject) = resolvers.into_functions();
            executor.call(vec![resolve.into(), reject.into()]).map(|_| ())
        });
        Ok(promise.into())
    }

    /// `Promise.resolve(value)`: returns `value` unchanged when it already is
    /// a promise.
    pub fn resolve(scheduler: &Rc<dyn Scheduler>, value: Value) -> Value {
        Promise::resolved(scheduler, value).into()
    }

    /// `Promise.reject(reason)`.
    pub fn reject(scheduler: &Rc<dyn Scheduler>, reason: Value) -> Value {
        Promise::rejected(scheduler, reason).into()
    }

    /// `Promise.all(iterable)`.
    pub fn all(scheduler: &Rc<dyn Scheduler>, iterable: &Value) -> Value {
        match iterable {
            Value::Array(items) => combinators::all(scheduler, items.clone()).into(),
            _ => not_an_array(scheduler, "all"),
        }
    }

    /// `Promise.race(iterable)`.
    pub fn race(scheduler: &Rc<dyn Scheduler>, iterable: &Value) -> Value {
        match iterable {
            Value::Array(items) => combinators::race(scheduler, items.clone()).into(),
            _ => not_an_array(scheduler, "race"),
        }
    }

    /// `Promise.allSettled(iterable)`. Non-array input fulfills with `[]`.
    pub fn all_settled(scheduler: &Rc<dyn Scheduler>, iterable: &Value) -> Value {
        match iterable {
            Value::Array(items) => combinators::all_settled(scheduler, items.clone()).into(),
            _ => Promise::resolved(scheduler, Value::Array(Vec::new())).into(),
        }
    }

    /// `Promise.any(iterable)`.
    pub fn any(scheduler: &Rc<dyn Scheduler>, iterable: &Value) -> Value {
        match iterable {
            Value::Array(items) => combinators::any(scheduler, items.clone()).into(),
            _ => not_an_array(scheduler, "any"),
        }
    }
}

fn not_an_array(scheduler: &Rc<dyn Scheduler>, name: &str) -> Value {
    let error = JsError::type_error(format!("Promise.{} accepts an array", name));
    Promise::rejected(scheduler, error).into()
}

/// `Promise.prototype` methods, called with an explicit receiver.
#[derive(Debug)]
pub struct PromisePrototype;

impl PromisePrototype {
    /// `target.then(onFulfilled, onRejected)`.
    pub fn then(target: &Value, on_fulfilled: &Value, on_rejected: &Value) -> Result<Value, JsError> {
        let promise = receiver(target, "then")?;
        Ok(promise
            .then(handler(on_fulfilled), handler(on_rejected))
            .into())
    }

    /// `target.catch(onRejected)`.
    pub fn catch(target: &Value, on_rejected: &Value) -> Result<Value, JsError> {
        let promise = receiver(target, "catch")?;
        Ok(promise.then(None, handler(on_rejected)).into())
    }

    /// `target.finally(onFinally)`. A non-callable argument forwards the
    /// settlement unchanged.
    pub fn finally(target: &Value, on_finally: &Value) -> Result<Value, JsError> {
        let promise = receiver(target, "finally")?;
        let derived = match handler(on_finally) {
            Some(callback) => promise.finally(callback),
            None => promise.then(None, None),
        };
        Ok(derived.into())
    }
}

fn receiver(target: &Value, method: &str) -> Result<Promise, JsError> {
    Promise::from_value(target).ok_or_else(|| {
        JsError::type_error(format!(
            "Method Promise.prototype.{} called on incompatible receiver {}",
            method,
            target.type_of()
        ))
    })
}

fn handler(value: &Value) -> Option<Function> {
    match value {
        Value::Function(f) => Some(f.clone()),
        _ => None,
    }
}

/// Returns true if `value` holds a promise created by this runtime.
pub fn is_promise(value: &Value) -> bool {
    Promise::from_value(value).is_some()
}
