//! Artifacts: evidence items attached to a container

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields::{
    id_json, id_value, map_value, set_json, set_value, text_value, Field, FieldTable,
};
use crate::common::Result;
use crate::substitute::{Substitute, VariableStore};

/// One event or evidence item, carrying CEF attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<u64>,
    pub name: String,
    pub label: String,
    pub severity: String,
    /// Common Event Format attributes
    pub cef: Map<String, Value>,
    pub tags: IndexSet<String>,
}

impl Default for Artifact {
    fn default() -> Self {
        Self {
            id: None,
            container_id: None,
            name: String::new(),
            label: String::new(),
            severity: "medium".to_string(),
            cef: Map::new(),
            tags: IndexSet::new(),
        }
    }
}

static ARTIFACT_FIELDS: &[Field<Artifact>] = &[
    Field {
        name: "id",
        get: |a| id_json(a.id),
        set: |a, v| {
            a.id = id_value("id", v)?;
            Ok(())
        },
    },
    Field {
        name: "container_id",
        get: |a| id_json(a.container_id),
        set: |a, v| {
            a.container_id = id_value("container_id", v)?;
            Ok(())
        },
    },
    Field {
        name: "name",
        get: |a| Value::String(a.name.clone()),
        set: |a, v| {
            a.name = text_value("name", v)?;
            Ok(())
        },
    },
    Field {
        name: "label",
        get: |a| Value::String(a.label.clone()),
        set: |a, v| {
            a.label = text_value("label", v)?;
            Ok(())
        },
    },
    Field {
        name: "severity",
        get: |a| Value::String(a.severity.clone()),
        set: |a, v| {
            a.severity = text_value("severity", v)?;
            Ok(())
        },
    },
    Field {
        name: "cef",
        get: |a| Value::Object(a.cef.clone()),
        set: |a, v| {
            a.cef = map_value("cef", v)?;
            Ok(())
        },
    },
    Field {
        name: "tags",
        get: |a| set_json(&a.tags),
        set: |a, v| {
            a.tags = set_value("tags", v)?;
            Ok(())
        },
    },
];

static FIELDS: Lazy<FieldTable<Artifact>> =
    Lazy::new(|| FieldTable::new("artifact", ARTIFACT_FIELDS));

impl Artifact {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_cef(mut self, cef: Map<String, Value>) -> Self {
        self.cef = cef;
        self
    }

    /// Build an artifact from a table record keyed by field name
    pub fn from_record(record: Map<String, Value>) -> Result<Self> {
        let mut artifact = Self::default();
        Self::fields().apply(&mut artifact, record)?;
        Ok(artifact)
    }

    /// Field accessors by name
    pub fn fields() -> &'static FieldTable<Artifact> {
        &FIELDS
    }
}

impl Substitute for Artifact {
    fn substitute(&mut self, store: &VariableStore) {
        self.name.substitute(store);
        self.label.substitute(store);
        self.severity.substitute(store);
        self.cef.substitute(store);
        self.tags.substitute(store);
    }
}
