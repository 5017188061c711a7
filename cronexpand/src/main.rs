//! Prints the values every field of a cron expression expands to

use std::process::ExitCode;

use clap::Parser;
use cronexpand::{Schedule, ScheduleError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Expands a cron expression into the values each of its fields matches
#[derive(Debug, Parser)]
#[command(name = "cronexpand", version, about, long_about = None)]
struct Cli {
    /// The whole expression as one quoted argument, e.g. "*/15 0 1,15 * 1-5 /usr/bin/find"
    #[arg(allow_hyphen_values = true)]
    expression: Option<String>,

    /// Anything after the expression is ignored
    #[arg(hide = true, allow_hyphen_values = true)]
    ignored: Vec<String>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if !cli.ignored.is_empty() {
        debug!(count = cli.ignored.len(), "ignoring extra arguments");
    }

    match run(cli.expression) {
        Ok(schedule) => println!("{}", schedule),
        Err(err) => {
            debug!(error = ?err, "expression rejected");
            println!("{}", err);
        }
    }

    // failures are reported on stdout only, the exit status is always 0
    ExitCode::SUCCESS
}

fn run(expression: Option<String>) -> Result<Schedule, ScheduleError> {
    expression
        .ok_or(ScheduleError::MissingArgument)?
        .parse()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
