//! Aggregate combinators: `all`, `race`, `all_settled` and `any`.
//!
//! Each combinator builds one parent promise and subscribes to every operand
//! with `then`. Operands that are not promises are passed through
//! [`Promise::resolved`] first, so plain values count as already fulfilled
//! and thenables are adopted. Subscriptions happen in input order, which is
//! what breaks ties between operands settling in the same turn.

use crate::promise::{first_argument, Promise, ResolvingFunctions};
use crate::scheduler::Scheduler;
use core_types::{Function, JsError, Value};
use std::cell::RefCell;
use std::rc::Rc;

struct AllState {
    remaining: usize,
    values: Vec<Value>,
}

struct AnyState {
    remaining: usize,
    reasons: Vec<Value>,
}

/// Subscribes `on_fulfilled`/`on_rejected` to `operand`.
fn subscribe(
    scheduler: &Rc<dyn Scheduler>,
    operand: Value,
    on_fulfilled: Function,
    on_rejected: Function,
) {
    Promise::resolved(scheduler, operand).then(Some(on_fulfilled), Some(on_rejected));
}

/// Handler that settles `capability` by rejection with its argument.
fn reject_with(capability: &ResolvingFunctions) -> Function {
    let capability = capability.clone();
    Function::new(move |args| {
        capability.reject(first_argument(args));
        Ok(Value::Undefined)
    })
}

/// Fulfills with every result, in input order, once all operands fulfill;
/// rejects with the first rejection reason observed.
///
/// An empty input fulfills immediately with an empty array.
pub fn all<I>(scheduler: &Rc<dyn Scheduler>, operands: I) -> Promise
where
    I: IntoIterator<Item = Value>,
{
    let operands: Vec<Value> = operands.into_iter().collect();
    let (result, capability) = Promise::pending(scheduler);
    if operands.is_empty() {
        capability.resolve(Value::Array(Vec::new()));
        return result;
    }

    let state = Rc::new(RefCell::new(AllState {
        remaining: operands.len(),
        values: vec![Value::Undefined; operands.len()],
    }));

    for (index, operand) in operands.into_iter().enumerate() {
        let on_fulfilled = {
            let (state, capability) = (state.clone(), capability.clone());
            Function::new(move |args| {
                if let Some(values) = record_outcome(&state, index, first_argument(args)) {
                    capability.resolve(Value::Array(values));
                }
                Ok(Value::Undefined)
            })
        };
        subscribe(scheduler, operand, on_fulfilled, reject_with(&capability));
    }

    result
}

/// Settles like whichever operand settles first.
///
/// An empty input never settles.
pub fn race<I>(scheduler: &Rc<dyn Scheduler>, operands: I) -> Promise
where
    I: IntoIterator<Item = Value>,
{
    let (result, capability) = Promise::pending(scheduler);
    let (resolve, reject) = capability.into_functions();
    for operand in operands {
        subscribe(scheduler, operand, resolve.clone(), reject.clone());
    }
    result
}

/// Fulfills, once every operand has settled, with one outcome record per
/// operand in input order: `{status: "fulfilled", value}` or
/// `{status: "rejected", reason}`. Never rejects.
pub fn all_settled<I>(scheduler: &Rc<dyn Scheduler>, operands: I) -> Promise
where
    I: IntoIterator<Item = Value>,
{
    let operands: Vec<Value> = operands.into_iter().collect();
    let (result, capability) = Promise::pending(scheduler);
    if operands.is_empty() {
        capability.resolve(Value::Array(Vec::new()));
        return result;
    }

    let state = Rc::new(RefCell::new(AllState {
        remaining: operands.len(),
        values: vec![Value::Undefined; operands.len()],
    }));

    for (index, operand) in operands.into_iter().enumerate() {
        let on_fulfilled = {
            let (state, capability) = (state.clone(), capability.clone());
            Function::new(move |args| {
                let entry = Value::object([
                    ("status", Value::from("fulfilled")),
                    ("value", first_argument(args)),
                ]);
                if let Some(values) = record_outcome(&state, index, entry) {
                    capability.resolve(Value::Array(values));
                }
                Ok(Value::Undefined)
            })
        };
        let on_rejected = {
            let (state, capability) = (state.clone(), capability.clone());
            Function::new(move |args| {
                let entry = Value::object([
                    ("status", Value::from("rejected")),
                    ("reason", first_argument(args)),
                ]);
                if let Some(values) = record_outcome(&state, index, entry) {
                    capability.resolve(Value::Array(values));
                }
                Ok(Value::Undefined)
            })
        };
        subscribe(scheduler, operand, on_fulfilled, on_rejected);
    }

    result
}

/// Fulfills with the first operand to fulfill; if every operand rejects,
/// rejects with an `AggregateError` holding all reasons in input order.
///
/// An empty input rejects immediately with an empty `AggregateError`.
pub fn any<I>(scheduler: &Rc<dyn Scheduler>, operands: I) -> Promise
where
    I: IntoIterator<Item = Value>,
{
    let operands: Vec<Value> = operands.into_iter().collect();
    let (result, capability) = Promise::pending(scheduler);
    if operands.is_empty() {
        capability.reject(aggregate_error(Vec::new()));
        return result;
    }

    let state = Rc::new(RefCell::new(AnyState {
        remaining: operands.len(),
        reasons: vec![Value::Undefined; operands.len()],
    }));

    for (index, operand) in operands.into_iter().enumerate() {
        let on_fulfilled = {
            let capability = capability.clone();
            Function::new(move |args| {
                capability.resolve(first_argument(args));
                Ok(Value::Undefined)
            })
        };
        let on_rejected = {
            let (state, capability) = (state.clone(), capability.clone());
            Function::new(move |args| {
                let finished = {
                    let mut state = state.borrow_mut();
                    state.reasons[index] = first_argument(args);
                    state.remaining = state.remaining.saturating_sub(1);
                    (state.remaining == 0).then(|| std::mem::take(&mut state.reasons))
                };
                if let Some(reasons) = finished {
                    capability.reject(aggregate_error(reasons));
                }
                Ok(Value::Undefined)
            })
        };
        subscribe(scheduler, operand, on_fulfilled, on_rejected);
    }

    result
}

/// Stores one outcome; returns every outcome once the last one arrives.
fn record_outcome(state: &RefCell<AllState>, index: usize, entry: Value) -> Option<Vec<Value>> {
    let mut state = state.borrow_mut();
    state.values[index] = entry;
    state.remaining = state.remaining.saturating_sub(1);
    (state.remaining == 0).then(|| std::mem::take(&mut state.values))
}

fn aggregate_error(reasons: Vec<Value>) -> Value {
    JsError::aggregate(reasons, "All promises were rejected").into()
}
