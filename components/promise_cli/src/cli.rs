//! Command-line arguments

use clap::{ArgAction, Parser, ValueEnum};
use promise_runtime::EventLoopConfig;
use std::fmt;
use std::path::PathBuf;

/// Runs deferred-value scenarios on a fresh event loop and prints how each
/// one settled.
#[derive(Parser, Debug)]
#[command(name = "promise-demo", version, about = "Promise scenarios on a single-threaded event loop")]
pub struct Cli {
    /// Scenario to run (can be repeated); every scenario runs when neither
    /// this nor --read is given
    #[arg(short = 's', long = "scenario", value_enum)]
    pub scenarios: Vec<Scenario>,

    /// Read FILE, then read and print the file its contents name
    #[arg(short = 'r', long = "read", value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Measure timers with the wall clock instead of virtual time
    #[arg(long = "real-time", action = ArgAction::SetTrue)]
    pub real_time: bool,

    /// Print one JSON object per outcome
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log filter, e.g. `debug` or `promise_runtime=trace` (default: RUST_LOG, else warn)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// The scenarios to run, in the order given.
    pub fn selected_scenarios(&self) -> Vec<Scenario> {
        if self.scenarios.is_empty() && self.read.is_none() {
            Scenario::ALL.to_vec()
        } else {
            self.scenarios.clone()
        }
    }

    /// Event loop configuration implied by the flags.
    pub fn event_loop_config(&self) -> EventLoopConfig {
        if self.real_time {
            EventLoopConfig::real_time()
        } else {
            EventLoopConfig::virtual_time()
        }
    }
}

/// A built-in demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// `all([1, resolves(2) after 10ms, 3])`
    All,
    /// `all([1, rejects("bad") after 5ms, resolves(2) after 10ms])`
    AllReject,
    /// `race([resolves(1) after 20ms, resolves(2) after 5ms])`
    Race,
    /// `all_settled([resolves(1), rejects("e")])`
    AllSettled,
    /// `any([rejects("a"), rejects("b")])`
    Any,
    /// `1 -> x + 1 -> throw "boom" -> catch`
    Chain,
    /// Rejection from a 1500ms timer, recovered by `catch`
    TimeoutReject,
}

impl Scenario {
    /// Every scenario, in display order.
    pub const ALL: [Scenario; 7] = [
        Scenario::All,
        Scenario::AllReject,
        Scenario::Race,
        Scenario::AllSettled,
        Scenario::Any,
        Scenario::Chain,
        Scenario::TimeoutReject,
    ];

    /// The name used on the command line and in output.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::All => "all",
            Scenario::AllReject => "all-reject",
            Scenario::Race => "race",
            Scenario::AllSettled => "all-settled",
            Scenario::Any => "any",
            Scenario::Chain => "chain",
            Scenario::TimeoutReject => "timeout-reject",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
