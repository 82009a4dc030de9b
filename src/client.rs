//! Platform client seam
//!
//! Steps never talk to the platform directly; they go through
//! [`PlatformClient`]. [`OfflineClient`] is an in-memory implementation
//! used for dry runs and tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::common::{Error, Result};
use crate::model::{Container, Note, Playbook};

/// Operations the steps need from the remote platform
///
/// Every call takes the container in its current state and updates it in
/// place. Calls must be safe to repeat with the same container.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Create the container and its artifacts, assigning ids
    async fn create_container(&self, container: &mut Container) -> Result<()>;

    /// Run every declared playbook that has not run yet
    async fn run_playbooks(&self, container: &mut Container) -> Result<()>;

    /// Refresh the container and all nested entities from the platform
    async fn update_container_values(&self, container: &mut Container) -> Result<()>;

    /// Push local changes to the container's own fields
    async fn modify_container_values(&self, container: &mut Container) -> Result<()>;

    async fn delete_container(&self, container: &mut Container) -> Result<()>;

    async fn create_note(&self, container: &mut Container, note: Note) -> Result<()>;

    async fn upload_file(&self, container: &mut Container, path: &Path) -> Result<()>;
}

#[derive(Debug, Default)]
struct OfflineState {
    last_id: u64,
    containers: HashMap<u64, Container>,
    scripted: HashMap<String, Playbook>,
    uploads: Vec<(u64, PathBuf)>,
}

impl OfflineState {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory platform
///
/// Playbook runs replay scripted results registered with
/// [`script_playbook`](Self::script_playbook); unscripted playbooks succeed
/// with no actions. A scripted status of `failed` makes the run call fail
/// after the results are recorded.
#[derive(Debug, Default)]
pub struct OfflineClient {
    state: Mutex<OfflineState>,
}

fn require_id(container: &Container) -> Result<u64> {
    container.id.ok_or_else(|| {
        Error::Platform(format!(
            "container '{}' has not been created on the platform",
            container.name
        ))
    })
}

impl OfflineClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the result a playbook run should produce
    pub async fn script_playbook(&self, playbook: Playbook) {
        let mut state = self.state.lock().await;
        state.scripted.insert(playbook.name.clone(), playbook);
    }

    /// Store a container as if it already existed on the platform
    ///
    /// Keeps the container's id when it has one. Returns the id.
    pub async fn seed_container(&self, mut container: Container) -> u64 {
        let mut state = self.state.lock().await;
        let id = match container.id {
            Some(id) => {
                state.last_id = state.last_id.max(id);
                id
            }
            None => state.next_id(),
        };
        container.id = Some(id);
        state.containers.insert(id, container);
        id
    }

    /// Snapshot of a stored container
    pub async fn stored(&self, id: u64) -> Option<Container> {
        self.state.lock().await.containers.get(&id).cloned()
    }

    /// Files uploaded so far, with the container id they went to
    pub async fn uploads(&self) -> Vec<(u64, PathBuf)> {
        self.state.lock().await.uploads.clone()
    }
}

#[async_trait]
impl PlatformClient for OfflineClient {
    async fn create_container(&self, container: &mut Container) -> Result<()> {
        container.ensure_configured()?;
        let mut state = self.state.lock().await;

        let id = match container.id {
            Some(id) => id,
            None => state.next_id(),
        };
        container.id = Some(id);
        for artifact in &mut container.artifacts {
            if artifact.id.is_none() {
                artifact.id = Some(state.next_id());
            }
            artifact.container_id = Some(id);
        }

        tracing::info!(
            id,
            name = %container.name,
            artifacts = container.artifacts.len(),
            "created container"
        );
        state.containers.insert(id, container.clone());
        Ok(())
    }

    async fn run_playbooks(&self, container: &mut Container) -> Result<()> {
        let container_id = require_id(container)?;
        let mut state = self.state.lock().await;
        let mut failed = Vec::new();

        for index in 0..container.playbooks.len() {
            if container.playbooks[index].id.is_some() {
                continue;
            }
            let run_id = state.next_id();
            let scripted = state.scripted.get(&container.playbooks[index].name).cloned();

            let playbook = &mut container.playbooks[index];
            playbook.id = Some(run_id);
            match scripted {
                Some(result) => {
                    playbook.status = result.status;
                    playbook.actions.extend(result.actions);
                    playbook.misc = result.misc;
                }
                None => playbook.status = "success".to_string(),
            }
            if playbook.status.is_empty() {
                playbook.status = "success".to_string();
            }

            tracing::info!(
                container_id,
                playbook = %playbook.name,
                status = %playbook.status,
                "ran playbook"
            );
            if playbook.status == "failed" {
                failed.push(playbook.name.clone());
            }
        }

        state.containers.insert(container_id, container.clone());

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Platform(format!(
                "playbook run failed: {}",
                failed.join(", ")
            )))
        }
    }

    async fn update_container_values(&self, container: &mut Container) -> Result<()> {
        let id = require_id(container)?;
        let state = self.state.lock().await;
        let stored = state
            .containers
            .get(&id)
            .ok_or_else(|| Error::Platform(format!("container {} not found", id)))?;
        *container = stored.clone();
        tracing::debug!(id, "refreshed container");
        Ok(())
    }

    async fn modify_container_values(&self, container: &mut Container) -> Result<()> {
        let id = require_id(container)?;
        let mut state = self.state.lock().await;
        let stored = state
            .containers
            .get_mut(&id)
            .ok_or_else(|| Error::Platform(format!("container {} not found", id)))?;
        stored.name = container.name.clone();
        stored.label = container.label.clone();
        stored.description = container.description.clone();
        stored.severity = container.severity.clone();
        stored.status = container.status.clone();
        stored.tags = container.tags.clone();
        stored.data = container.data.clone();
        stored.custom_fields = container.custom_fields.clone();
        tracing::info!(id, status = %container.status, "modified container");
        Ok(())
    }

    async fn delete_container(&self, container: &mut Container) -> Result<()> {
        let id = require_id(container)?;
        let mut state = self.state.lock().await;
        state
            .containers
            .remove(&id)
            .ok_or_else(|| Error::Platform(format!("container {} not found", id)))?;
        tracing::info!(id, "deleted container");
        Ok(())
    }

    async fn create_note(&self, container: &mut Container, note: Note) -> Result<()> {
        let id = require_id(container)?;
        let mut state = self.state.lock().await;
        let stored = state
            .containers
            .get_mut(&id)
            .ok_or_else(|| Error::Platform(format!("container {} not found", id)))?;
        stored.notes.push(note.clone());
        tracing::info!(id, title = %note.title, "created note");
        container.notes.push(note);
        Ok(())
    }

    async fn upload_file(&self, container: &mut Container, path: &Path) -> Result<()> {
        let id = require_id(container)?;
        tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        let mut state = self.state.lock().await;
        if !state.containers.contains_key(&id) {
            return Err(Error::Platform(format!("container {} not found", id)));
        }
        state.uploads.push((id, path.to_path_buf()));
        tracing::info!(id, path = %path.display(), "uploaded file");
        Ok(())
    }
}
