//! Promise demo CLI
//!
//! Entry point for the scenario runner. Parses CLI arguments, installs the
//! log subscriber and delegates to the Runtime.

use clap::Parser as ClapParser;
use promise_cli::runtime::report;
use promise_cli::{Cli, CliError, CliResult, Runtime};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(e) = run(&cli) {
        match e {
            CliError::Runtime(e) => eprintln!("Runtime Error: {}", e),
            e => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> CliResult<()> {
    let runtime = Runtime::new(cli.event_loop_config());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for scenario in cli.selected_scenarios() {
        let outcome = runtime.run_scenario(scenario)?;
        report(&mut out, &outcome, cli.json)?;
    }
    if let Some(path) = &cli.read {
        let outcome = runtime.read_chain(path)?;
        report(&mut out, &outcome, cli.json)?;
    }
    Ok(())
}

fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
