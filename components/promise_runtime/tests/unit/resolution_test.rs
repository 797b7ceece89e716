//! Unit tests for the resolution procedure and thenable adoption

use crate::support::{new_log, recorder, thenable};
use core_types::{ErrorKind, Function, Object, Value};
use promise_runtime::{EventLoop, Promise, PromiseState};
use std::rc::Rc;

#[test]
fn resolving_with_itself_rejects_with_cycle_error() {
    let mut event_loop = EventLoop::new();
    let (promise, resolvers) = Promise::pending(&event_loop.scheduler());
    resolvers.resolve(promise.clone());
    event_loop.run_all_microtasks();

    match promise.reason() {
        Some(Value::Error(e)) => {
            assert_eq!(e.kind, ErrorKind::TypeError);
            assert!(e.message.contains("Chaining cycle detected for promise"));
        }
        other => panic!("expected cycle error, got {:?}", other),
    }
}

#[test]
fn handler_returning_its_own_promise_rejects() {
    let mut event_loop = EventLoop::new();
    let (source, resolvers) = Promise::pending(&event_loop.scheduler());
    let slot: Rc<std::cell::RefCell<Option<Promise>>> = Rc::default();
    let derived = {
        let slot = slot.clone();
        source.then(
            Some(Function::new(move |_| {
                Ok(slot.borrow().clone().map(Value::from).unwrap_or(Value::Undefined))
            })),
            None,
        )
    };
    *slot.borrow_mut() = Some(derived.clone());

    resolvers.resolve(Value::Smi(1));
    event_loop.run_all_microtasks();
    assert_eq!(derived.state(), PromiseState::Rejected);
}

#[test]
fn adopts_nested_settlement() {
    let mut event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let (innermost, innermost_resolvers) = Promise::pending(&scheduler);
    let middle = Promise::resolved(&scheduler, Value::Undefined).then(
        Some({
            let innermost = innermost.clone();
            Function::new(move |_| Ok(innermost.clone().into()))
        }),
        None,
    );
    let outer = Promise::resolved(&scheduler, Value::Undefined).then(
        Some({
            let middle = middle.clone();
            Function::new(move |_| Ok(middle.clone().into()))
        }),
        None,
    );

    event_loop.run_all_microtasks();
    assert!(outer.is_pending());

    let foreign = thenable(|on_fulfilled, _| on_fulfilled.call(vec![Value::Smi(5)]));
    innermost_resolvers.resolve(foreign);
    event_loop.run_all_microtasks();

    assert_eq!(middle.value(), Some(Value::Smi(5)));
    assert_eq!(outer.value(), Some(Value::Smi(5)));
}

#[test]
fn adopts_rejection() {
    let mut event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let (promise, resolvers) = Promise::pending(&scheduler);
    resolvers.resolve(Promise::rejected(&scheduler, "inner"));
    event_loop.run_all_microtasks();
    assert_eq!(promise.reason(), Some(Value::from("inner")));
}

#[test]
fn thenable_calling_both_callbacks_settles_once() {
    let mut event_loop = EventLoop::new();
    let (promise, resolvers) = Promise::pending(&event_loop.scheduler());
    resolvers.resolve(thenable(|on_fulfilled, on_rejected| {
        on_fulfilled.call(vec![Value::from("yes")])?;
        on_rejected.call(vec![Value::from("no")])?;
        on_fulfilled.call(vec![Value::from("again")])
    }));
    event_loop.run_all_microtasks();
    assert_eq!(promise.value(), Some(Value::from("yes")));
}

#[test]
fn thenable_throwing_after_callback_is_ignored() {
    let mut event_loop = EventLoop::new();
    let (promise, resolvers) = Promise::pending(&event_loop.scheduler());
    resolvers.resolve(thenable(|on_fulfilled, _| {
        on_fulfilled.call(vec![Value::Smi(1)])?;
        Err(Value::from("late throw"))
    }));
    event_loop.run_all_microtasks();
    assert_eq!(promise.value(), Some(Value::Smi(1)));
}

#[test]
fn thenable_throwing_before_callback_rejects() {
    let mut event_loop = EventLoop::new();
    let (promise, resolvers) = Promise::pending(&event_loop.scheduler());
    resolvers.resolve(thenable(|_, _| Err(Value::from("then threw"))));
    event_loop.run_all_microtasks();
    assert_eq!(promise.reason(), Some(Value::from("then threw")));
}

#[test]
fn throwing_then_getter_rejects() {
    let mut event_loop = EventLoop::new();
    let object = Object::new();
    object.define_getter("then", Function::new(|_| Err(Value::from("getter threw"))));
    let (promise, resolvers) = Promise::pending(&event_loop.scheduler());
    resolvers.resolve(Value::Object(Rc::new(object)));
    event_loop.run_all_microtasks();
    assert_eq!(promise.reason(), Some(Value::from("getter threw")));
}

#[test]
fn deferred_thenable_settles_later() {
    let mut event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let (gate, gate_resolvers) = Promise::pending(&scheduler);
    let log = new_log();

    let foreign = {
        let gate = gate.clone();
        thenable(move |on_fulfilled, on_rejected| {
            gate.then(Some(on_fulfilled), Some(on_rejected));
            Ok(Value::Undefined)
        })
    };
    let (promise, resolvers) = Promise::pending(&scheduler);
    resolvers.resolve(foreign);
    promise.then(Some(recorder(&log, "settled")), None);

    event_loop.run_all_microtasks();
    assert!(log.borrow().is_empty());

    gate_resolvers.resolve("opened");
    event_loop.run_all_microtasks();
    assert_eq!(*log.borrow(), vec!["settled: opened"]);
}

#[test]
fn objects_without_callable_then_fulfill_directly() {
    let mut event_loop = EventLoop::new();
    let (promise, resolvers) = Promise::pending(&event_loop.scheduler());
    let plain = Value::object([("then", Value::from("not callable"))]);
    resolvers.resolve(plain.clone());
    event_loop.run_all_microtasks();
    assert_eq!(promise.value(), Some(plain));
}
