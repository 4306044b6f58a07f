//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Configure, build and test fixtures
    Run {
        /// Fixtures to run (default: all)
        fixtures: Vec<String>,

        /// Do not clone or update the companion repository first
        #[arg(long)]
        no_sync: bool,

        /// Echo build tool output as it arrives
        #[arg(long, short)]
        verbose: bool,

        /// Stop after the first failing fixture
        #[arg(long)]
        fail_fast: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known fixtures
    List {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clone or update the companion repository
    Sync {
        /// Echo git output as it arrives
        #[arg(long, short)]
        verbose: bool,
    },

    /// Check that the build toolchain is available
    Check {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove build and external directories of fixtures
    Clean {
        /// Fixtures to clean (default: all)
        fixtures: Vec<String>,
    },
}
