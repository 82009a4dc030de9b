//! Steps that create, run and refresh resources on the platform

use serde_json::Value;

use crate::client::PlatformClient;
use crate::common::{Error, Result};
use crate::context::RunContext;
use crate::model::{ActionStatus, Container, Note, Playbook};
use crate::search::find_first;
use crate::validate::expect_text;

/// Run every declared playbook; each one must come back with a run id
pub async fn run_all_playbooks(ctx: &mut RunContext, client: &dyn PlatformClient) -> Result<()> {
    let container = ctx.configured_container()?;
    client.run_playbooks(container).await?;

    if let Some(playbook) = container.playbooks.iter().find(|p| p.id.is_none()) {
        return Err(Error::PlaybookNotRun(playbook.name.clone()));
    }
    Ok(())
}

/// Run one playbook, declaring it first if needed
///
/// When the scenario carries the configured ignore-failure tag, a platform
/// error from the run is logged and the step passes.
pub async fn run_playbook(
    ctx: &mut RunContext,
    client: &dyn PlatformClient,
    name: &str,
) -> Result<()> {
    let ignore_failures = ctx.has_tag(&ctx.config().scenario.ignore_failure_tag);
    let container = ctx.configured_container()?;
    if container.get_playbook(name).is_none() {
        container.add_playbook(Playbook::new(name))?;
    }

    match client.run_playbooks(container).await {
        Err(Error::Platform(message)) if ignore_failures => {
            tracing::warn!(playbook = name, %message, "ignoring playbook failure");
            Ok(())
        }
        result => result,
    }
}

/// Refresh the container and everything it owns from the platform
pub async fn collect_results(ctx: &mut RunContext, client: &dyn PlatformClient) -> Result<()> {
    let container = ctx.container_mut()?;
    client.update_container_values(container).await
}

/// Create the container and its artifacts; all of them must receive ids
pub async fn create_container(ctx: &mut RunContext, client: &dyn PlatformClient) -> Result<()> {
    let container = ctx.container_mut()?;
    client.create_container(container).await?;

    let id = container.id.ok_or_else(|| {
        Error::Platform(format!("container '{}' was not assigned an id", container.name))
    })?;
    for artifact in &container.artifacts {
        if artifact.id.is_none() || artifact.container_id != Some(id) {
            return Err(Error::Platform(format!(
                "artifact '{}' was not created in container {}",
                artifact.name, id
            )));
        }
    }
    Ok(())
}

pub async fn create_note(
    ctx: &mut RunContext,
    client: &dyn PlatformClient,
    title: &str,
    content: &str,
) -> Result<()> {
    let container = ctx.container_mut()?;
    client.create_note(container, Note::new(title, content)).await
}

pub async fn close_container(ctx: &mut RunContext, client: &dyn PlatformClient) -> Result<()> {
    let container = ctx.container_mut()?;
    container.status = "closed".to_string();
    client.modify_container_values(container).await
}

pub async fn delete_container(ctx: &mut RunContext, client: &dyn PlatformClient) -> Result<()> {
    let container = ctx.container_mut()?;
    client.delete_container(container).await
}

/// Replace the active container with one that already exists on the platform
pub async fn load_existing_container(
    ctx: &mut RunContext,
    client: &dyn PlatformClient,
    id: u64,
) -> Result<()> {
    let mut container = Container::existing(id);
    client.update_container_values(&mut container).await?;
    ctx.set_container(container);
    Ok(())
}

fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Follow a successful `create container` action to the container it made
///
/// The new container becomes active and must live under `label`.
pub async fn switch_to_created_container(
    ctx: &mut RunContext,
    client: &dyn PlatformClient,
    label: &str,
) -> Result<()> {
    let source = ctx.configured_container()?;
    let created_id = source
        .actions()
        .filter(|a| a.action == "create container" && a.status == ActionStatus::Success)
        .find_map(|a| find_first("container_id", &a.result_data).and_then(as_id))
        .ok_or_else(|| {
            Error::Platform(format!(
                "unable to find the container created from container {:?}",
                source.id
            ))
        })?;

    load_existing_container(ctx, client, created_id).await?;
    let container = ctx.container()?;
    expect_text("Created container label", label, &container.label)
}
