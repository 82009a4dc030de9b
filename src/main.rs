//! soarsteps - run SOAR test scenarios written in YAML
//!
//! Each scenario declares a container with artifacts and playbooks, runs
//! the playbooks and asserts on the collected results.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use soarsteps::common::config::Config;
use soarsteps::common::logging;
use soarsteps::{cli, commands};

#[derive(Parser)]
#[command(name = "soarsteps", about = "Scenario runner for SOAR playbook tests")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.command.verbose());

    let loaded = match &cli.config {
        Some(path) => Config::load_from(path).map(|c| (c, Some(path.clone()))),
        None => Config::load().map(|c| (c, Config::default_path().filter(|p| p.exists()))),
    };

    let result = match loaded {
        Ok((config, path)) => cli::dispatch(cli.command, &config, path.as_deref()).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
