use std::time::Duration;

use clap::Parser;
use tracing::Level;

mod cli;
mod commands;
mod render;
mod settings;

/// Exit status for usage errors and aborted runs.
const FATAL_EXIT: i32 = 2;

fn main() {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            eprintln!("error: {err:#}");
            FATAL_EXIT
        }
    };
    std::process::exit(code);
}

fn run(cli: cli::Cli) -> anyhow::Result<commands::Outcome> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(commands::run_command(cli));
    // Timed-out comparisons may still be blocking a worker thread.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}
