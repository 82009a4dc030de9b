//! Playbooks and the actions they record

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields::{id_json, id_value, map_value, text_value, Field, FieldTable};
use crate::common::{Error, Result};
use crate::substitute::{Substitute, VariableStore};

/// Outcome of one action run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Success,
    Failed,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Success => write!(f, "success"),
            ActionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ActionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(ActionStatus::Success),
            "failed" => Ok(ActionStatus::Failed),
            other => Err(Error::invalid_value(
                "status",
                format!("'{}' is not an action status. Use either success or failed", other),
            )),
        }
    }
}

/// One recorded action execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    /// Action type, e.g. `create container`
    pub action: String,
    pub status: ActionStatus,
    pub result_data: Value,
}

impl Action {
    pub fn new(name: impl Into<String>, status: ActionStatus) -> Self {
        Self {
            name: name.into(),
            status,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_result(mut self, result_data: Value) -> Self {
        self.result_data = result_data;
        self
    }

    pub fn fields() -> &'static FieldTable<Action> {
        &ACTION_TABLE
    }
}

static ACTION_FIELDS: &[Field<Action>] = &[
    Field {
        name: "id",
        get: |a| id_json(a.id),
        set: |a, v| {
            a.id = id_value("id", v)?;
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
        name: "action",
        get: |a| Value::String(a.action.clone()),
        set: |a, v| {
            a.action = text_value("action", v)?;
            Ok(())
        },
    },
    Field {
        name: "status",
        get: |a| Value::String(a.status.to_string()),
        set: |a, v| {
            a.status = text_value("status", v)?.parse()?;
            Ok(())
        },
    },
    Field {
        name: "result_data",
        get: |a| a.result_data.clone(),
        set: |a, v| {
            a.result_data = v;
            Ok(())
        },
    },
];

static ACTION_TABLE: Lazy<FieldTable<Action>> =
    Lazy::new(|| FieldTable::new("action", ACTION_FIELDS));

/// One automation recipe run against a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playbook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub status: String,
    pub actions: Vec<Action>,
    /// Prompt name to the responses given, in order
    pub prompts: IndexMap<String, Vec<String>>,
    /// Run metadata reported by the platform, including `callback`
    pub misc: Map<String, Value>,
}

static PLAYBOOK_FIELDS: &[Field<Playbook>] = &[
    Field {
        name: "id",
        get: |p| id_json(p.id),
        set: |p, v| {
            p.id = id_value("id", v)?;
            Ok(())
        },
    },
    Field {
        name: "name",
        get: |p| Value::String(p.name.clone()),
        set: |p, v| {
            p.name = text_value("name", v)?;
            Ok(())
        },
    },
    Field {
        name: "status",
        get: |p| Value::String(p.status.clone()),
        set: |p, v| {
            p.status = text_value("status", v)?;
            Ok(())
        },
    },
    Field {
        name: "misc",
        get: |p| Value::Object(p.misc.clone()),
        set: |p, v| {
            p.misc = map_value("misc", v)?;
            Ok(())
        },
    },
];

static PLAYBOOK_TABLE: Lazy<FieldTable<Playbook>> =
    Lazy::new(|| FieldTable::new("playbook", PLAYBOOK_FIELDS));

impl Playbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn fields() -> &'static FieldTable<Playbook> {
        &PLAYBOOK_TABLE
    }

    /// First action with the given name
    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Callback info reported for a child playbook call
    pub fn callback(&self, name: &str) -> Option<&Map<String, Value>> {
        self.misc
            .get("callback")
            .and_then(|callbacks| callbacks.get(name))
            .and_then(Value::as_object)
    }
}

impl Substitute for Action {
    fn substitute(&mut self, store: &VariableStore) {
        self.name.substitute(store);
        self.action.substitute(store);
        self.result_data.substitute(store);
    }
}

impl Substitute for Playbook {
    fn substitute(&mut self, store: &VariableStore) {
        self.name.substitute(store);
        self.status.substitute(store);
        self.actions.substitute(store);
        self.prompts.substitute(store);
        self.misc.substitute(store);
    }
}
