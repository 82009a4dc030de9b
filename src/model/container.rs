//! The container aggregate: one test fixture and everything it owns

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::artifact::Artifact;
use super::fields::{
    bool_value, id_json, id_value, list_value, map_value, set_json, set_value, text_value, Field,
    FieldTable,
};
use super::playbook::{Action, Playbook};
use crate::common::{Error, Result};
use crate::substitute::{Substitute, VariableStore};

/// A note attached to a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub title: String,
    pub content: String,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A pinned HUD card on a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pin {
    pub style: String,
    pub message: String,
    pub data: String,
}

/// Aggregate root for one scenario fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub label: String,
    pub description: String,
    pub severity: String,
    pub status: String,
    pub run_automation: bool,
    pub tags: IndexSet<String>,
    pub data: Map<String, Value>,
    pub custom_fields: Map<String, Value>,
    pub comments: Vec<String>,
    pub notes: Vec<Note>,
    pub pins: Vec<Pin>,
    pub artifacts: Vec<Artifact>,
    pub playbooks: Vec<Playbook>,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            label: String::new(),
            description: String::new(),
            severity: "medium".to_string(),
            status: "new".to_string(),
            run_automation: false,
            tags: IndexSet::new(),
            data: Map::new(),
            custom_fields: Map::new(),
            comments: Vec::new(),
            notes: Vec::new(),
            pins: Vec::new(),
            artifacts: Vec::new(),
            playbooks: Vec::new(),
        }
    }
}

static CONTAINER_FIELDS: &[Field<Container>] = &[
    Field {
        name: "id",
        get: |c| id_json(c.id),
        set: |c, v| {
            c.id = id_value("id", v)?;
            Ok(())
        },
    },
    Field {
        name: "name",
        get: |c| Value::String(c.name.clone()),
        set: |c, v| {
            c.name = text_value("name", v)?;
            Ok(())
        },
    },
    Field {
        name: "label",
        get: |c| Value::String(c.label.clone()),
        set: |c, v| {
            c.label = text_value("label", v)?;
            Ok(())
        },
    },
    Field {
        name: "description",
        get: |c| Value::String(c.description.clone()),
        set: |c, v| {
            c.description = text_value("description", v)?;
            Ok(())
        },
    },
    Field {
        name: "severity",
        get: |c| Value::String(c.severity.clone()),
        set: |c, v| {
            c.severity = text_value("severity", v)?;
            Ok(())
        },
    },
    Field {
        name: "status",
        get: |c| Value::String(c.status.clone()),
        set: |c, v| {
            c.status = text_value("status", v)?;
            Ok(())
        },
    },
    Field {
        name: "run_automation",
        get: |c| Value::Bool(c.run_automation),
        set: |c, v| {
            c.run_automation = bool_value("run_automation", v)?;
            Ok(())
        },
    },
    Field {
        name: "tags",
        get: |c| set_json(&c.tags),
        set: |c, v| {
            c.tags = set_value("tags", v)?;
            Ok(())
        },
    },
    Field {
        name: "data",
        get: |c| Value::Object(c.data.clone()),
        set: |c, v| {
            c.data = map_value("data", v)?;
            Ok(())
        },
    },
    Field {
        name: "custom_fields",
        get: |c| Value::Object(c.custom_fields.clone()),
        set: |c, v| {
            c.custom_fields = map_value("custom_fields", v)?;
            Ok(())
        },
    },
    Field {
        name: "comments",
        get: |c| Value::from(c.comments.clone()),
        set: |c, v| {
            c.comments = list_value("comments", v)?;
            Ok(())
        },
    },
];

static FIELDS: Lazy<FieldTable<Container>> =
    Lazy::new(|| FieldTable::new("container", CONTAINER_FIELDS));

impl Container {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// A container known only by its platform id, to be filled by the client
    pub fn existing(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Build a container from a table record keyed by field name
    pub fn from_record(record: Map<String, Value>) -> Result<Self> {
        let mut container = Self::default();
        Self::fields().apply(&mut container, record)?;
        Ok(container)
    }

    /// Field accessors by name
    pub fn fields() -> &'static FieldTable<Container> {
        &FIELDS
    }

    /// Check the container has the name and label required before use
    pub fn ensure_configured(&self) -> Result<()> {
        if self.name.is_empty() || self.label.is_empty() {
            return Err(Error::ContainerMissingAttributes);
        }
        Ok(())
    }

    // === Artifacts ===

    /// First artifact with the given name
    pub fn get_artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn get_artifact_mut(&mut self, name: &str) -> Option<&mut Artifact> {
        self.artifacts.iter_mut().find(|a| a.name == name)
    }

    /// Like [`get_artifact`](Self::get_artifact) but a missing artifact is an error
    pub fn require_artifact(&self, name: &str) -> Result<&Artifact> {
        self.get_artifact(name)
            .ok_or_else(|| Error::artifact_not_found(name, &self.artifact_names()))
    }

    pub fn require_artifact_mut(&mut self, name: &str) -> Result<&mut Artifact> {
        match self.artifacts.iter().position(|a| a.name == name) {
            Some(index) => Ok(&mut self.artifacts[index]),
            None => Err(Error::artifact_not_found(name, &self.artifact_names())),
        }
    }

    pub fn add_artifact(&mut self, artifact: Artifact) -> Result<()> {
        self.ensure_configured()?;
        tracing::debug!(artifact = %artifact.name, "adding artifact");
        self.artifacts.push(artifact);
        Ok(())
    }

    pub fn artifact_names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name.as_str()).collect()
    }

    // === Playbooks ===

    /// First playbook with the given name
    pub fn get_playbook(&self, name: &str) -> Option<&Playbook> {
        self.playbooks.iter().find(|p| p.name == name)
    }

    pub fn get_playbook_mut(&mut self, name: &str) -> Option<&mut Playbook> {
        self.playbooks.iter_mut().find(|p| p.name == name)
    }

    pub fn require_playbook(&self, name: &str) -> Result<&Playbook> {
        self.get_playbook(name)
            .ok_or_else(|| Error::PlaybookNotFound(name.to_string()))
    }

    pub fn add_playbook(&mut self, playbook: Playbook) -> Result<()> {
        self.ensure_configured()?;
        tracing::debug!(playbook = %playbook.name, "adding playbook");
        self.playbooks.push(playbook);
        Ok(())
    }

    pub fn playbook_names(&self) -> Vec<&str> {
        self.playbooks.iter().map(|p| p.name.as_str()).collect()
    }

    // === Actions ===

    /// Every action across all playbooks, in run order
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.playbooks.iter().flat_map(|p| p.actions.iter())
    }

    /// Every action with the given name, in run order
    ///
    /// An action name can recur across a playbook's run history.
    pub fn get_action(&self, name: &str) -> Vec<&Action> {
        self.actions().filter(|a| a.name == name).collect()
    }

    /// First action with the given name, or an error when it never ran
    pub fn require_action(&self, name: &str) -> Result<&Action> {
        self.actions()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::ActionNotFound(name.to_string()))
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions().map(|a| a.name.as_str()).collect()
    }
}

impl Substitute for Note {
    fn substitute(&mut self, store: &VariableStore) {
        self.title.substitute(store);
        self.content.substitute(store);
    }
}

impl Substitute for Pin {
    fn substitute(&mut self, store: &VariableStore) {
        self.style.substitute(store);
        self.message.substitute(store);
        self.data.substitute(store);
    }
}

impl Substitute for Container {
    fn substitute(&mut self, store: &VariableStore) {
        self.name.substitute(store);
        self.label.substitute(store);
        self.description.substitute(store);
        self.severity.substitute(store);
        self.status.substitute(store);
        self.tags.substitute(store);
        self.data.substitute(store);
        self.custom_fields.substitute(store);
        self.comments.substitute(store);
        self.notes.substitute(store);
        self.pins.substitute(store);
        self.artifacts.substitute(store);
        self.playbooks.substitute(store);
    }
}
