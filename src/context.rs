//! Per-scenario run state
//!
//! A [`RunContext`] is built when a scenario starts and dropped when it
//! ends, so variables and the active container never leak between
//! scenarios.

use serde_json::{Map, Value};

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::model::Container;
use crate::substitute::{Substitute, VariableStore};
use crate::table::{table_to_dict, Table};

/// Variables, active container and settings for one scenario run
#[derive(Debug, Default)]
pub struct RunContext {
    store: VariableStore,
    container: Option<Container>,
    data: Option<Map<String, Value>>,
    tags: Vec<String>,
    config: Config,
}

impl RunContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Attach the scenario's tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    // === Active container ===

    pub fn has_container(&self) -> bool {
        self.container.is_some()
    }

    pub fn container(&self) -> Result<&Container> {
        self.container.as_ref().ok_or(Error::ContainerNotConfigured)
    }

    pub fn container_mut(&mut self) -> Result<&mut Container> {
        self.container.as_mut().ok_or(Error::ContainerNotConfigured)
    }

    /// The active container, which must already carry a name and label
    pub fn configured_container(&mut self) -> Result<&mut Container> {
        let container = self.container_mut()?;
        container.ensure_configured()?;
        Ok(container)
    }

    /// Make `container` the active container, replacing any previous one
    pub fn set_container(&mut self, container: Container) {
        tracing::debug!(name = %container.name, id = ?container.id, "active container set");
        self.container = Some(container);
    }

    // === Free-standing table data ===

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Map<String, Value>) {
        self.data = Some(data);
    }

    /// Project a table onto a mapping, resolving tokens with this run's variables
    pub fn table_to_dict(&self, table: &Table) -> Result<Map<String, Value>> {
        table_to_dict(table, &self.store)
    }

    // === Step hooks ===

    /// Resolve variable tokens on the active container
    pub fn resolve_variables(&mut self) {
        if let Some(container) = self.container.as_mut() {
            container.substitute(&self.store);
        }
    }

    pub fn before_step(&mut self) {
        self.resolve_variables();
    }

    pub fn after_step(&mut self) {
        self.resolve_variables();
    }
}
