//! End-to-End CLI Integration Tests
//!
//! Runs every built-in scenario through the promise_cli Runtime API, the
//! highest level at which promises are observable.

use core_types::Value;
use promise_cli::{Runtime, Scenario, Status};
use promise_runtime::EventLoopConfig;
use std::io::Write;

/// Test: every scenario settles on the virtual clock
#[test]
fn test_e2e_every_scenario_settles() {
    let runtime = Runtime::new(EventLoopConfig::virtual_time());
    for scenario in Scenario::ALL {
        let outcome = runtime.run_scenario(scenario).expect("Execution failed");
        assert_ne!(outcome.status, Status::Pending, "{} never settled", scenario);
        assert_eq!(outcome.name, scenario.name());
    }
}

/// Test: outcomes line up with the documented results
#[test]
fn test_e2e_scenario_outcomes() {
    let runtime = Runtime::new(EventLoopConfig::virtual_time());
    let lines: Vec<String> = [Scenario::All, Scenario::AllReject, Scenario::Race, Scenario::Chain]
        .into_iter()
        .map(|s| runtime.run_scenario(s).expect("Execution failed").to_string())
        .collect();

    assert_eq!(
        lines,
        vec![
            "all: fulfilled [1,2,3] (10ms)",
            "all-reject: rejected bad (5ms)",
            "race: fulfilled 2 (5ms)",
            "chain: fulfilled boom (0ms)",
        ]
    );
}

/// Test: the race scenario on the wall clock
#[test]
fn test_e2e_race_real_time() {
    let outcome = Runtime::new(EventLoopConfig::real_time())
        .run_scenario(Scenario::Race)
        .expect("Execution failed");
    assert_eq!(outcome.value, Value::Smi(2));
    assert!(outcome.elapsed_ms >= 5);
}

/// Test: read one file to find another
#[test]
fn test_e2e_read_chain() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("greeting.txt");
    std::fs::write(&target, "hi").unwrap();
    let pointer = dir.path().join("name.text");
    let mut file = std::fs::File::create(&pointer).unwrap();
    writeln!(file, "  {}", target.display()).unwrap();

    let outcome = Runtime::default().read_chain(&pointer).expect("Execution failed");
    assert_eq!(outcome.value, Value::from("hi"));
}
