//! Unit tests for EventLoop

use crate::support::{init_test_logging, new_log, recorder, rejects_after, resolves_after};
use core_types::{Function, Value};
use promise_runtime::{
    EventLoop, EventLoopConfig, MicroTask, Promise, RuntimeError, Task,
};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

#[test]
fn tasks_run_before_their_microtasks() {
    let mut event_loop = EventLoop::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let o = order.clone();
    event_loop.enqueue_task(Task::new(move || {
        o.borrow_mut().push('T');
        Ok(())
    }));
    let o = order.clone();
    event_loop.enqueue_microtask(MicroTask::new(move || o.borrow_mut().push('M')));

    event_loop.process_one_cycle().unwrap();
    assert_eq!(*order.borrow(), vec!['T', 'M']);
}

#[test]
fn promise_reactions_run_before_next_timer() {
    let mut event_loop = EventLoop::new();
    let log = new_log();
    let timers = event_loop.timers();
    let scheduler = event_loop.scheduler();

    {
        let (log, scheduler) = (log.clone(), scheduler.clone());
        let inner_log = log.clone();
        timers.set_timeout(Duration::from_millis(1), move || {
            log.borrow_mut().push("timer 1".to_string());
            Promise::resolved(&scheduler, "reaction").then(Some(recorder(&inner_log, "micro")), None);
            Ok(())
        });
    }
    {
        let log = log.clone();
        timers.set_timeout(Duration::from_millis(1), move || {
            log.borrow_mut().push("timer 2".to_string());
            Ok(())
        });
    }

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["timer 1", "micro: reaction", "timer 2"]);
}

#[test]
fn timeout_reject_then_catch() {
    init_test_logging();
    let mut event_loop = EventLoop::new();
    let log = new_log();
    rejects_after(&event_loop, "timed out", 100).catch(recorder(&log, "caught"));

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["caught: timed out"]);
    assert_eq!(event_loop.now(), Duration::from_millis(100));
}

#[test]
fn cleared_timer_never_fires() {
    let mut event_loop = EventLoop::new();
    let log = new_log();
    let timers = event_loop.timers();
    let id = {
        let log = log.clone();
        timers.set_timeout(Duration::from_millis(5), move || {
            log.borrow_mut().push("fired".to_string());
            Ok(())
        })
    };
    assert!(timers.clear_timeout(id));

    event_loop.run_until_done().unwrap();
    assert!(log.borrow().is_empty());
    assert_eq!(event_loop.now(), Duration::ZERO);
}

#[test]
fn throwing_timer_stops_the_loop() {
    let mut event_loop = EventLoop::new();
    event_loop
        .timers()
        .set_timeout(Duration::from_millis(1), || Err(Value::from("uncaught")));
    assert_eq!(
        event_loop.run_until_done(),
        Err(RuntimeError::UncaughtException(Value::from("uncaught")))
    );
}

#[test]
fn unhandled_rejections_reach_the_hook() {
    let mut event_loop = EventLoop::new();
    let reported = Rc::new(RefCell::new(Vec::new()));
    let r = reported.clone();
    event_loop.on_unhandled_rejection(move |promise, reason| {
        assert!(!promise.is_handled());
        r.borrow_mut().push(reason.clone());
    });

    let _orphan = rejects_after(&event_loop, "orphan", 5);
    rejects_after(&event_loop, "handled", 5).catch(Function::new(|_| Ok(Value::Undefined)));

    event_loop.run_until_done().unwrap();
    assert_eq!(*reported.borrow(), vec![Value::from("orphan")]);
}

#[test]
fn handling_within_the_same_checkpoint_is_not_reported() {
    let mut event_loop = EventLoop::new();
    let reported = Rc::new(RefCell::new(0));
    let r = reported.clone();
    event_loop.on_unhandled_rejection(move |_, _| *r.borrow_mut() += 1);

    let scheduler = event_loop.scheduler();
    let rejected = Promise::rejected(&scheduler, "late handler");
    event_loop.enqueue_microtask(MicroTask::new(move || {
        rejected.catch(Function::new(|_| Ok(Value::Undefined)));
    }));

    event_loop.run_until_done().unwrap();
    assert_eq!(*reported.borrow(), 0);
}

#[test]
fn read_chain_over_io() {
    let dir = tempfile::tempdir().unwrap();
    let second = dir.path().join("second.txt");
    std::fs::write(&second, "hello from the second file").unwrap();
    let first = dir.path().join("first.txt");
    let mut file = std::fs::File::create(&first).unwrap();
    writeln!(file, "{}", second.display()).unwrap();

    let mut event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let io = event_loop.io();
    let chained = io.read_to_string(&scheduler, &first).then(
        Some({
            let (io, scheduler) = (io.clone(), scheduler.clone());
            Function::new(move |args| {
                let name = args.first().map(|v| v.to_string()).unwrap_or_default();
                Ok(io.read_to_string(&scheduler, name.trim()).into())
            })
        }),
        None,
    );

    event_loop.run_until_done().unwrap();
    assert_eq!(chained.value(), Some(Value::from("hello from the second file")));
    assert!(!io.has_pending());
}

#[test]
fn missing_file_rejects() {
    let dir = tempfile::tempdir().unwrap();
    let mut event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let promise = event_loop
        .io()
        .read_to_string(&scheduler, dir.path().join("absent.txt"));
    let log = new_log();
    promise.catch(recorder(&log, "error"));

    event_loop.run_until_done().unwrap();
    match promise.reason() {
        Some(Value::Error(e)) => assert!(e.message.contains("absent.txt")),
        other => panic!("expected read error, got {:?}", other),
    }
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn io_and_timers_interleave_on_virtual_clock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "data").unwrap();

    let mut event_loop = EventLoop::new();
    let log = new_log();
    resolves_after(&event_loop, "timer", 50).then(Some(recorder(&log, "t")), None);
    event_loop
        .io()
        .read_to_string(&event_loop.scheduler(), &path)
        .then(Some(recorder(&log, "io")), None);

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["io: data", "t: timer"]);
}

#[test]
fn real_clock_waits_for_deadline() {
    let mut event_loop = EventLoop::with_config(EventLoopConfig::real_time());
    let promise = resolves_after(&event_loop, Value::Smi(1), 20);
    event_loop.run_until_done().unwrap();
    assert_eq!(promise.value(), Some(Value::Smi(1)));
    assert!(event_loop.now() >= Duration::from_millis(20));
}

#[test]
fn dropping_loop_releases_unreported_rejections() {
    let event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let weak = Rc::downgrade(&scheduler);
    let rejected = Promise::rejected(&scheduler, "never observed");

    drop((rejected, scheduler, event_loop));
    assert!(weak.upgrade().is_none());
}

#[test]
fn dropping_loop_releases_unrun_reactions() {
    let event_loop = EventLoop::new();
    let scheduler = event_loop.scheduler();
    let weak = Rc::downgrade(&scheduler);
    let derived = Promise::resolved(&scheduler, Value::Smi(1)).then(None, None);
    let timed = resolves_after(&event_loop, Value::Smi(2), 10);

    drop((derived, timed, scheduler, event_loop));
    assert!(weak.upgrade().is_none());
}
