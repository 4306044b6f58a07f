//! cmake-harness - integration tests for the vigra_cmake helpers
//!
//! Checks out the helper repository, then drives cmake and ctest over a set
//! of fixture projects and asserts on what the build actually did.

use std::path::PathBuf;

use clap::Parser;
use cmake_harness::common::config::Config;
use cmake_harness::common::logging;
use cmake_harness::{cli, commands, Error};
use commands::Commands;

#[derive(Parser)]
#[command(name = "cmake-harness", about = "Integration-test harness for vigra_cmake")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Write logs to the default log file in the data directory
    #[arg(long, global = true, conflicts_with = "log_file")]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| cli.log.then(logging::default_log_file).flatten());
    let guard = logging::init_cli(log_file.as_deref());

    let result = Config::load(cli.config.as_deref()).and_then(|config| {
        cli::runtime()?.block_on(cli::dispatch(cli.command, &config))
    });

    if let Err(e) = result {
        // Per-fixture failures were already reported in detail.
        if !matches!(e, Error::FixturesFailed { .. }) {
            if let Some(output) = e.captured_output() {
                eprintln!("{}", output.trim_end());
            }
        }
        eprintln!("Error: {e}");
        drop(guard);
        std::process::exit(1);
    }
}
