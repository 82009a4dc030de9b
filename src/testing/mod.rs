//! YAML scenario runner
//!
//! Reads scenarios from YAML, runs each one with its own run state and
//! reports a pass/fail result per scenario.

mod config;
mod runner;

pub use config::*;
pub use runner::{execute_scenario, load_scenario, offline_platform, run_scenario, TestResult};
