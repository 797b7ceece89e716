//! Scenario orchestration
//!
//! The Runtime builds each scenario on its own event loop, runs the loop
//! until it goes idle and reports how the scenario's promise settled:
//! - Timer-driven producers for the combinator and chaining scenarios
//! - Worker-thread file reads for the read chain

use crate::cli::Scenario;
use crate::error::CliResult;
use core_types::{Function, Value};
use promise_runtime::{combinators, EventLoop, EventLoopConfig, Promise, PromiseState};
use serde::Serialize;
use std::cell::Cell;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing::info;

/// How a scenario's promise ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Fulfilled with a value
    Fulfilled,
    /// Rejected with a reason
    Rejected,
    /// Never settled before the loop went idle
    Pending,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Fulfilled => write!(f, "fulfilled"),
            Status::Rejected => write!(f, "rejected"),
            Status::Pending => write!(f, "pending"),
        }
    }
}

/// The result of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// Scenario name
    pub name: String,
    /// Final state of the scenario's promise
    pub status: Status,
    /// Value or reason; `undefined` while pending
    pub value: Value,
    /// Loop time at which the promise settled (or the loop went idle)
    pub elapsed_ms: u64,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Pending => write!(f, "{}: pending ({}ms)", self.name, self.elapsed_ms),
            status => write!(
                f,
                "{}: {} {} ({}ms)",
                self.name,
                status,
                render(&self.value),
                self.elapsed_ms
            ),
        }
    }
}

/// Arrays and records print as JSON; everything else as its string form.
fn render(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
        _ => value.to_string(),
    }
}

/// Writes `outcome` as one line of text or JSON.
pub fn report<W: Write>(out: &mut W, outcome: &Outcome, json: bool) -> CliResult<()> {
    if json {
        serde_json::to_writer(&mut *out, outcome)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", outcome)?;
    }
    Ok(())
}

/// Runs scenarios, each on a fresh event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runtime {
    config: EventLoopConfig,
}

impl Runtime {
    /// Create a new runtime instance
    ///
    /// # Example
    /// ```
    /// use promise_cli::{Runtime, Scenario, Status};
    /// use promise_runtime::EventLoopConfig;
    ///
    /// let runtime = Runtime::new(EventLoopConfig::virtual_time());
    /// let outcome = runtime.run_scenario(Scenario::Race).unwrap();
    /// assert_eq!(outcome.status, Status::Fulfilled);
    /// ```
    pub fn new(config: EventLoopConfig) -> Self {
        Self { config }
    }

    /// Runs one built-in scenario to completion.
    ///
    /// # Errors
    /// Returns `CliError::Runtime` if the event loop stops on an error.
    pub fn run_scenario(&self, scenario: Scenario) -> CliResult<Outcome> {
        let event_loop = EventLoop::with_config(self.config);
        let promise = build_scenario(scenario, &event_loop);
        self.settle(scenario.name(), event_loop, promise)
    }

    /// Reads `path`, treats its trimmed contents as a second path, and
    /// fulfills with that file's contents. Read failures reject.
    ///
    /// # Example
    /// ```no_run
    /// use promise_cli::Runtime;
    ///
    /// let outcome = Runtime::default().read_chain("name.txt".as_ref()).unwrap();
    /// println!("{}", outcome);
    /// ```
    pub fn read_chain(&self, path: &Path) -> CliResult<Outcome> {
        let event_loop = EventLoop::with_config(self.config);
        let scheduler = event_loop.scheduler();
        let io = event_loop.io();

        let next_file = Function::new(move |args| {
            let name = args.first().map(|v| v.to_string()).unwrap_or_default();
            Ok(io.read_to_string(&scheduler, name.trim()).into())
        });
        let promise = event_loop
            .io()
            .read_to_string(&event_loop.scheduler(), path)
            .then(Some(next_file), None);

        self.settle("read", event_loop, promise)
    }

    fn settle(&self, name: &str, mut event_loop: EventLoop, promise: Promise) -> CliResult<Outcome> {
        info!(scenario = name, clock = ?self.config.clock, "running scenario");
        let settled_at = Rc::new(Cell::new(None));
        let stamp = || {
            let (settled_at, timers) = (settled_at.clone(), event_loop.timers());
            Function::new(move |_| {
                settled_at.set(Some(timers.now()));
                Ok(Value::Undefined)
            })
        };
        promise.then(Some(stamp()), Some(stamp()));

        event_loop.run_until_done()?;

        let elapsed = settled_at.get().unwrap_or_else(|| event_loop.now());
        let (status, value) = match promise.state() {
            PromiseState::Fulfilled => (Status::Fulfilled, promise.value()),
            PromiseState::Rejected => (Status::Rejected, promise.reason()),
            PromiseState::Pending => (Status::Pending, None),
        };
        Ok(Outcome {
            name: name.to_string(),
            status,
            value: value.unwrap_or(Value::Undefined),
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}

fn build_scenario(scenario: Scenario, event_loop: &EventLoop) -> Promise {
    let scheduler = event_loop.scheduler();
    match scenario {
        Scenario::All => combinators::all(
            &scheduler,
            vec![
                Value::Smi(1),
                resolves_after(event_loop, Value::Smi(2), 10),
                Value::Smi(3),
            ],
        ),
        Scenario::AllReject => combinators::all(
            &scheduler,
            vec![
                Value::Smi(1),
                rejects_after(event_loop, "bad", 5),
                resolves_after(event_loop, Value::Smi(2), 10),
            ],
        ),
        Scenario::Race => combinators::race(
            &scheduler,
            vec![
                resolves_after(event_loop, Value::Smi(1), 20),
                resolves_after(event_loop, Value::Smi(2), 5),
            ],
        ),
        Scenario::AllSettled => combinators::all_settled(
            &scheduler,
            vec![
                Promise::resolved(&scheduler, Value::Smi(1)).into(),
                Promise::rejected(&scheduler, "e").into(),
            ],
        ),
        Scenario::Any => combinators::any(
            &scheduler,
            vec![
                Promise::rejected(&scheduler, "a").into(),
                Promise::rejected(&scheduler, "b").into(),
            ],
        ),
        Scenario::Chain => Promise::resolved(&scheduler, Value::Smi(1))
            .then(
                Some(Function::new(|args| match args.first() {
                    Some(Value::Smi(n)) => Ok(Value::Smi(n + 1)),
                    Some(Value::Double(n)) => Ok(Value::Double(n + 1.0)),
                    _ => Ok(Value::Double(f64::NAN)),
                })),
                None,
            )
            .then(Some(Function::new(|_| Err(Value::from("boom")))), None)
            .catch(Function::new(|args| {
                Ok(args.into_iter().next().unwrap_or(Value::Undefined))
            })),
        Scenario::TimeoutReject => {
            let recovered = Function::new(|args| Ok(args.into_iter().next().unwrap_or(Value::Undefined)));
            let timers = event_loop.timers();
            Promise::new(&scheduler, move |resolvers| {
                timers.set_timeout(Duration::from_millis(1500), move || {
                    resolvers.reject("6666");
                    Ok(())
                });
                Ok(())
            })
            .catch(recovered)
        }
    }
}

fn resolves_after(event_loop: &EventLoop, value: impl Into<Value>, ms: u64) -> Value {
    let (timers, value) = (event_loop.timers(), value.into());
    Promise::new(&event_loop.scheduler(), move |resolvers| {
        timers.set_timeout(Duration::from_millis(ms), move || {
            resolvers.resolve(value);
            Ok(())
        });
        Ok(())
    })
    .into()
}

fn rejects_after(event_loop: &EventLoop, reason: impl Into<Value>, ms: u64) -> Value {
    let (timers, reason) = (event_loop.timers(), reason.into());
    Promise::new(&event_loop.scheduler(), move |resolvers| {
        timers.set_timeout(Duration::from_millis(ms), move || {
            resolvers.reject(reason);
            Ok(())
        });
        Ok(())
    })
    .into()
}
