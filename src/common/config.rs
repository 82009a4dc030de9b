//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Scenario defaults
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Defaults applied to every scenario
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    /// Tags added to every declared container
    #[serde(default = "default_tags")]
    pub default_tags: Vec<String>,

    /// Scenario tag that makes playbook run failures non-fatal
    #[serde(default = "default_ignore_failure_tag")]
    pub ignore_failure_tag: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            default_tags: default_tags(),
            ignore_failure_tag: default_ignore_failure_tag(),
        }
    }
}

fn default_tags() -> Vec<String> {
    vec!["phantom-test-cases".to_string()]
}

fn default_ignore_failure_tag() -> String {
    "ignore_exception".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Upper bound for a single wait step
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait(),
        }
    }
}

fn default_max_wait() -> u64 {
    600
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Path the configuration would be loaded from
    pub fn default_path() -> Option<PathBuf> {
        config_path()
    }
}
