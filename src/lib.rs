//! soarsteps - scenario steps for SOAR playbook testing
//!
//! This library declares test fixtures (containers, artifacts, playbooks),
//! drives them through a platform client and validates the results. Step
//! parameters use a small literal grammar and `${name}` variable tokens.

pub mod cli;
pub mod client;
pub mod commands;
pub mod common;
pub mod context;
pub mod literal;
pub mod model;
pub mod search;
pub mod steps;
pub mod substitute;
pub mod table;
pub mod testing;
pub mod validate;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use context::RunContext;
