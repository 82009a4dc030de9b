//! CLI command definitions
//!
//! Defines the clap commands for the scenario runner CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more YAML scenarios against the offline platform
    Run {
        /// Scenario files to run, in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Parse scenario files without running them
    Check {
        /// Scenario files to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show the effective configuration
    Config,
}

impl Commands {
    /// Whether the command asked for verbose output
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Run { verbose: true, .. })
    }
}
