//! CLI command handling
//!
//! Dispatches CLI commands to the scenario runner and formats output.

use std::path::Path;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::{self, TestResult};

/// Dispatch a CLI command
pub async fn dispatch(
    command: Commands,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Commands::Run { paths, verbose } => {
            let mut results = Vec::with_capacity(paths.len());
            for path in &paths {
                let result = match testing::run_scenario(path, config, verbose).await {
                    Ok(result) => result,
                    Err(e) => {
                        println!("  {} {}: {}", "✗".red(), path.display(), e);
                        TestResult::unloaded(path, &e)
                    }
                };
                results.push(result);
            }
            print_summary(&results);

            let failed = results.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::ScenariosFailed {
                    failed,
                    total: results.len(),
                });
            }
            Ok(())
        }

        Commands::Check { paths } => {
            let mut invalid = 0;
            for path in &paths {
                match testing::load_scenario(path) {
                    Ok(scenario) => println!(
                        "  {} {} ({} steps)",
                        "✓".green(),
                        path.display(),
                        scenario.steps.len()
                    ),
                    Err(e) => {
                        invalid += 1;
                        println!("  {} {}: {}", "✗".red(), path.display(), e);
                    }
                }
            }
            if invalid > 0 {
                return Err(Error::Config(format!(
                    "{} of {} scenario files are invalid",
                    invalid,
                    paths.len()
                )));
            }
            Ok(())
        }

        Commands::Config => {
            match config_path {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: {}", "(defaults)".dimmed()),
            }
            println!();
            println!("[scenario]");
            println!("  default_tags       = {:?}", config.scenario.default_tags);
            println!("  ignore_failure_tag = {:?}", config.scenario.ignore_failure_tag);
            println!("[timeouts]");
            println!("  max_wait_secs      = {}", config.timeouts.max_wait_secs);
            Ok(())
        }
    }
}

fn print_summary(results: &[TestResult]) {
    if results.len() < 2 {
        return;
    }

    println!("{}", "Summary:".cyan());
    for result in results {
        if result.passed {
            println!("  {} {}", "✓".green(), result.name);
        } else {
            println!(
                "  {} {} (step {}/{}): {}",
                "✗".red(),
                result.name,
                result.steps_run,
                result.steps_total,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    let passed = results.iter().filter(|r| r.passed).count();
    println!("\n  {}/{} passed\n", passed, results.len());
}
