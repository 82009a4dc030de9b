//! Error types for scenario steps
//!
//! Messages are written for the scenario author: they name the entity that
//! was missing or mismatched and, where it helps, what is available instead.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scenario steps
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("The container has not been declared. Declare a container with a name and label first")]
    ContainerNotConfigured,

    #[error("The container must have both a name and a label")]
    ContainerMissingAttributes,

    #[error("No playbooks have been configured")]
    PlaybooksNotConfigured,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Lookup Errors ===
    #[error("Artifact '{name}' not found. Available: {available}")]
    ArtifactNotFound { name: String, available: String },

    #[error("Playbook '{0}' not found on the container")]
    PlaybookNotFound(String),

    #[error("The action {0} was not found on the container")]
    ActionNotFound(String),

    #[error("The {entity} object does not have a '{field}' field")]
    UnknownField { entity: &'static str, field: String },

    #[error("The cef key '{key}' was not found within the artifact '{artifact}'")]
    CefKeyNotFound { artifact: String, key: String },

    // === Assertion Errors ===
    #[error("{subject} does not match. Expected: {expected} | Actual: {actual}")]
    AssertionFailed {
        subject: String,
        expected: String,
        actual: String,
    },

    // === Parse Errors ===
    #[error("Literal parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    // === Platform Errors ===
    #[error("Playbook {0} failed to be run")]
    PlaybookNotRun(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Scenario halted for debugging. Container: {0}")]
    DebugHalt(String),

    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

/// Coarse error category, used by the runner when reporting failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NotFound,
    Assertion,
    Parse,
    Platform,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Assertion => write!(f, "assertion"),
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Platform => write!(f, "platform"),
        }
    }
}

impl Error {
    /// Create an assertion failure carrying both sides of the comparison
    pub fn assertion(
        subject: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::AssertionFailed {
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an artifact not found error listing the declared artifact names
    pub fn artifact_not_found<S: AsRef<str>>(name: &str, available: &[S]) -> Self {
        Self::ArtifactNotFound {
            name: name.to_string(),
            available: available
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create an invalid field value error
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ContainerNotConfigured
            | Error::ContainerMissingAttributes
            | Error::PlaybooksNotConfigured
            | Error::Config(_)
            | Error::ConfigParse(_) => ErrorKind::Configuration,
            Error::ArtifactNotFound { .. }
            | Error::PlaybookNotFound(_)
            | Error::ActionNotFound(_)
            | Error::UnknownField { .. }
            | Error::CefKeyNotFound { .. } => ErrorKind::NotFound,
            Error::AssertionFailed { .. }
            | Error::DebugHalt(_)
            | Error::ScenariosFailed { .. } => ErrorKind::Assertion,
            Error::Parse(_) | Error::MalformedTable(_) | Error::InvalidFieldValue { .. } => {
                ErrorKind::Parse
            }
            Error::PlaybookNotRun(_)
            | Error::Platform(_)
            | Error::Io(_)
            | Error::FileRead { .. } => ErrorKind::Platform,
        }
    }
}
