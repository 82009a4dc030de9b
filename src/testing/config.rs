//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use std::path::PathBuf;

use crate::model::{Container, Playbook};
use crate::table::Table;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Scenario tags, e.g. `ignore_exception`
    #[serde(default)]
    pub tags: Vec<String>,
    /// State the offline platform starts with
    #[serde(default)]
    pub platform: PlatformFixtures,
    /// The sequence of test steps to execute
    pub steps: Vec<ScenarioStep>,
}

/// Preloaded state for the offline platform
#[derive(Deserialize, Debug, Default)]
pub struct PlatformFixtures {
    /// Results replayed when a playbook of the same name runs
    #[serde(default)]
    pub playbooks: Vec<Playbook>,
    /// Containers that already exist, keyed by their `id`
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A single step in the scenario
///
/// Tables are written as lists of rows; the first row holds the headings.
#[derive(Deserialize, Debug)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    // === Configuration ===
    /// Declare the container from a one-record table
    ContainerTable { table: Table },
    /// Declare the container by name and label
    Container { name: String, label: String },
    /// Fill `data`, `custom_fields` or `tags` from a table
    ContainerAttributeTable { attribute: String, table: Table },
    /// Set a cef entry from a block of text
    ArtifactText {
        artifact: String,
        key: String,
        text: String,
    },
    /// Set an artifact attribute from an inline literal
    ArtifactAttribute {
        artifact: String,
        attribute: String,
        value: String,
    },
    /// Declare an artifact, optionally with cef from a table
    Artifact {
        name: String,
        label: String,
        table: Option<Table>,
    },
    /// Fill an artifact's `tags`, `cef` or a nested cef mapping from a table
    ArtifactTable {
        artifact: String,
        field: String,
        table: Table,
    },
    /// Declare several artifacts, one per row
    Artifacts { table: Table },
    Playbook { name: String },
    /// Responses for one prompt of the last declared playbook
    Prompt { prompt: String, table: Table },
    /// Prompt/response pairs for the last declared playbook
    Prompts { table: Table },
    /// Upload a file, relative to the scenario file
    UploadFile { path: PathBuf },
    /// Store `<action>.<key>` from action result data as a variable
    AssignActionOutput { data_path: String, variable: String },
    Variable { name: String, value: String },
    /// Keep a table as free-standing run data
    StoreTable { table: Table },

    // === Platform interaction ===
    RunPlaybooks,
    RunPlaybook { name: String },
    CollectResults,
    CreateContainer,
    CreateNote { title: String, content: String },
    CloseContainer,
    DeleteContainer,
    LoadContainer { id: u64 },
    /// Follow a `create container` action to the container it made
    SwitchToCreatedContainer { label: String },

    // === Validation ===
    PlaybookStatus { playbook: String, status: String },
    ActionsSuccessful,
    CallbackStatus {
        playbook: String,
        callback: String,
        child: String,
        status: String,
    },
    PlaybookActionStatus {
        playbook: String,
        action: String,
        status: String,
    },
    PlaybookNotRun { playbook: String },
    /// A pin whose message or data matches `text`
    PinText { style: String, text: String },
    Pin {
        style: String,
        message: String,
        data: String,
    },
    ActionStatus { action: String, status: String },
    ActionNotRun { action: String },
    /// Compare a field of the first run of an action
    ActionField {
        action: String,
        field: String,
        value: String,
    },
    ExpectArtifact {
        artifact: String,
        attribute: String,
        value: String,
    },
    ExpectArtifactTable {
        artifact: String,
        field: String,
        table: Table,
    },
    ArtifactHasCef { artifact: String, key: String },
    ArtifactLacksCef { artifact: String, key: String },
    MinimumArtifacts { quantity: usize, label: String },
    ExpectContainer { attribute: String, value: String },
    /// Compare a mapping under the container's data; `key` may be `key:subkey`
    ContainerDataTable { key: String, table: Table },
    CommentPresent { comment: String },
    NotePresent { title: String },
    NoteCount { quantity: usize },

    // === Misc ===
    Wait { seconds: u64 },
    /// Stop and print the container
    Debug,
}

impl ScenarioStep {
    /// Short human-readable form for progress output
    pub fn describe(&self) -> String {
        match self {
            Self::ContainerTable { .. } => "container from table".to_string(),
            Self::Container { name, label } => format!("container '{}' under '{}'", name, label),
            Self::ContainerAttributeTable { attribute, .. } => {
                format!("container {} table", attribute)
            }
            Self::ArtifactText { artifact, key, .. } => {
                format!("artifact '{}' {} text", artifact, key)
            }
            Self::ArtifactAttribute {
                artifact,
                attribute,
                value,
            } => format!("artifact '{}' {} = {}", artifact, attribute, value),
            Self::Artifact { name, label, .. } => {
                format!("artifact '{}' labeled '{}'", name, label)
            }
            Self::ArtifactTable {
                artifact, field, ..
            } => format!("artifact '{}' {} table", artifact, field),
            Self::Artifacts { table } => format!("{} artifacts", table.rows().len()),
            Self::Playbook { name } => format!("playbook '{}'", name),
            Self::Prompt { prompt, .. } => format!("prompt '{}'", prompt),
            Self::Prompts { .. } => "prompt table".to_string(),
            Self::UploadFile { path } => format!("upload {}", path.display()),
            Self::AssignActionOutput {
                data_path,
                variable,
            } => format!("{} -> ${{{}}}", data_path, variable),
            Self::Variable { name, value } => format!("${{{}}} = {}", name, value),
            Self::StoreTable { .. } => "store table".to_string(),
            Self::RunPlaybooks => "run playbooks".to_string(),
            Self::RunPlaybook { name } => format!("run playbook '{}'", name),
            Self::CollectResults => "collect results".to_string(),
            Self::CreateContainer => "create container and artifacts".to_string(),
            Self::CreateNote { title, .. } => format!("note '{}'", title),
            Self::CloseContainer => "close container".to_string(),
            Self::DeleteContainer => "delete container".to_string(),
            Self::LoadContainer { id } => format!("load container {}", id),
            Self::SwitchToCreatedContainer { label } => {
                format!("switch to created container in '{}'", label)
            }
            Self::PlaybookStatus { playbook, status } => {
                format!("playbook '{}' is {}", playbook, status)
            }
            Self::ActionsSuccessful => "all actions successful".to_string(),
            Self::CallbackStatus {
                callback, status, ..
            } => format!("callback '{}' is {}", callback, status),
            Self::PlaybookActionStatus {
                playbook,
                action,
                status,
            } => format!("playbook '{}' action '{}' is {}", playbook, action, status),
            Self::PlaybookNotRun { playbook } => format!("playbook '{}' has not run", playbook),
            Self::PinText { style, text } => format!("{} pin '{}'", style, text),
            Self::Pin { style, message, .. } => format!("{} pin '{}'", style, message),
            Self::ActionStatus { action, status } => format!("action '{}' is {}", action, status),
            Self::ActionNotRun { action } => format!("action '{}' did not run", action),
            Self::ActionField { action, field, .. } => format!("action '{}' {}", action, field),
            Self::ExpectArtifact {
                artifact,
                attribute,
                value,
            } => format!("artifact '{}' has {} {}", artifact, attribute, value),
            Self::ExpectArtifactTable {
                artifact, field, ..
            } => format!("artifact '{}' has {} table", artifact, field),
            Self::ArtifactHasCef { artifact, key } => {
                format!("artifact '{}' has cef '{}'", artifact, key)
            }
            Self::ArtifactLacksCef { artifact, key } => {
                format!("artifact '{}' lacks cef '{}'", artifact, key)
            }
            Self::MinimumArtifacts { quantity, label } => {
                format!("at least {} artifacts labeled '{}'", quantity, label)
            }
            Self::ExpectContainer { attribute, value } => {
                format!("container {} is {}", attribute, value)
            }
            Self::ContainerDataTable { key, .. } => format!("container data '{}'", key),
            Self::CommentPresent { comment } => format!("comment '{}'", comment),
            Self::NotePresent { title } => format!("note '{}' exists", title),
            Self::NoteCount { quantity } => format!("{} notes", quantity),
            Self::Wait { seconds } => format!("wait {}s", seconds),
            Self::Debug => "debug".to_string(),
        }
    }
}
