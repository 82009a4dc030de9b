//! Steps that declare fixtures before anything reaches the platform

use std::path::Path;

use serde_json::{Map, Value};

use crate::client::PlatformClient;
use crate::common::{Error, Result};
use crate::context::RunContext;
use crate::literal::{parse_dict, parse_list};
use crate::model::{Artifact, Container, Playbook};
use crate::search::find_all;
use crate::table::{table_to_array, table_to_list, table_to_prompt, Table};

fn with_default_tags(ctx: &RunContext, mut container: Container) -> Container {
    container
        .tags
        .extend(ctx.config().scenario.default_tags.iter().cloned());
    container
}

/// Declare the container from a table with one header row and one record
///
/// ```text
/// | name | label | run_automation |
/// | Test | alert | False          |
/// ```
pub fn container_from_table(ctx: &mut RunContext, table: &Table) -> Result<()> {
    let record = table_to_array(table)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedTable("container table has no data rows".to_string()))?;
    let container = Container::from_record(record)?;
    container.ensure_configured()?;

    let container = with_default_tags(ctx, container);
    ctx.set_container(container);
    Ok(())
}

/// Declare the container by name and label
pub fn declare_container(ctx: &mut RunContext, name: &str, label: &str) -> Result<()> {
    let container = Container::new(name, label);
    container.ensure_configured()?;

    let container = with_default_tags(ctx, container);
    ctx.set_container(container);
    Ok(())
}

/// Fill `data`, `custom_fields` or `tags` on the container from a table
pub fn container_attribute_table(
    ctx: &mut RunContext,
    attribute: &str,
    table: &Table,
) -> Result<()> {
    Container::fields().field(attribute)?;
    let value = match attribute {
        "data" | "custom_fields" => Value::Object(ctx.table_to_dict(table)?),
        "tags" => Value::from(table_to_list(table, 1, true)?),
        other => {
            return Err(Error::invalid_value(
                other,
                "only data, custom_fields and tags can be filled from a table",
            ))
        }
    };

    let container = ctx.configured_container()?;
    Container::fields().set(container, attribute, value)
}

/// Set a cef entry on a declared artifact from a block of text
///
/// A `parent:child` key writes into a nested mapping under `parent`.
pub fn artifact_text_value(
    ctx: &mut RunContext,
    artifact: &str,
    key: &str,
    text: &str,
) -> Result<()> {
    let artifact = ctx.container_mut()?.require_artifact_mut(artifact)?;
    let value = Value::String(text.to_string());

    match key.split_once(':') {
        Some((parent, child)) => {
            let entry = artifact
                .cef
                .entry(parent.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(nested) = entry {
                nested.insert(child.to_string(), value);
            }
        }
        None => {
            artifact.cef.insert(key.to_string(), value);
        }
    }
    Ok(())
}

/// Set an artifact attribute from an inline literal, declaring the artifact
/// if it does not exist yet
///
/// `cef` takes a pair or JSON object, `tags` a list. Any other attribute
/// name becomes a nested cef mapping unless cef already has that key.
pub fn artifact_attribute(
    ctx: &mut RunContext,
    artifact: &str,
    attribute: &str,
    value: &str,
) -> Result<()> {
    let container = ctx.configured_container()?;
    if container.get_artifact(artifact).is_none() {
        container.add_artifact(Artifact::new(artifact, ""))?;
    }
    let target = container.require_artifact_mut(artifact)?;

    match attribute {
        "cef" => target.cef = parse_dict(value)?,
        "tags" => target.tags = parse_list(value).into_iter().collect(),
        nested => {
            if !target.cef.contains_key(nested) {
                let entries = parse_dict(value)?;
                target.cef.insert(nested.to_string(), Value::Object(entries));
            }
        }
    }
    Ok(())
}

/// Declare an artifact, with its cef taken from an optional table
pub fn declare_artifact(
    ctx: &mut RunContext,
    name: &str,
    label: &str,
    table: Option<&Table>,
) -> Result<()> {
    let cef = match table {
        Some(table) => ctx.table_to_dict(table)?,
        None => Map::new(),
    };
    ctx.configured_container()?
        .add_artifact(Artifact::new(name, label).with_cef(cef))
}

/// Fill an artifact's `tags`, `cef` or a nested cef mapping from a table
pub fn artifact_table_values(
    ctx: &mut RunContext,
    artifact: &str,
    sub_field: &str,
    table: &Table,
) -> Result<()> {
    let value = match sub_field {
        "tags" => Value::from(table_to_list(table, 1, true)?),
        _ => Value::Object(ctx.table_to_dict(table)?),
    };
    let target = ctx.configured_container()?.require_artifact_mut(artifact)?;

    match (sub_field, value) {
        ("tags", value) => Artifact::fields().set(target, "tags", value),
        ("cef", value) => Artifact::fields().set(target, "cef", value),
        (nested, value) => {
            target.cef.insert(nested.to_string(), value);
            Ok(())
        }
    }
}

/// Declare several artifacts at once, one per table row
pub fn bulk_artifacts(ctx: &mut RunContext, table: &Table) -> Result<()> {
    let records = table_to_array(table)?;
    let container = ctx.configured_container()?;
    for record in records {
        container.add_artifact(Artifact::from_record(record)?)?;
    }
    Ok(())
}

pub fn declare_playbook(ctx: &mut RunContext, name: &str) -> Result<()> {
    ctx.configured_container()?.add_playbook(Playbook::new(name))
}

fn last_playbook(ctx: &mut RunContext) -> Result<&mut Playbook> {
    ctx.configured_container()?
        .playbooks
        .last_mut()
        .ok_or(Error::PlaybooksNotConfigured)
}

/// Attach ordered responses for one prompt to the most recently declared playbook
pub fn configure_prompt(ctx: &mut RunContext, prompt: &str, table: &Table) -> Result<()> {
    let responses = table_to_list(table, 1, true)?;
    last_playbook(ctx)?
        .prompts
        .insert(prompt.to_string(), responses);
    Ok(())
}

/// Attach responses for several prompts at once from a two-column table
pub fn configure_prompts_table(ctx: &mut RunContext, table: &Table) -> Result<()> {
    let prompts = table_to_prompt(table)?;
    let playbook = last_playbook(ctx)?;
    for (prompt, responses) in prompts {
        playbook.prompts.entry(prompt).or_default().extend(responses);
    }
    Ok(())
}

pub async fn upload_file(
    ctx: &mut RunContext,
    client: &dyn PlatformClient,
    path: &Path,
) -> Result<()> {
    let container = ctx.configured_container()?;
    client.upload_file(container, path).await
}

/// Store a value from an action's result data as a run variable
///
/// `data_path` is `<action>.<key>`; the key is searched anywhere in the
/// first matching action's result tree and the last match wins.
pub fn assign_action_output(ctx: &mut RunContext, data_path: &str, variable: &str) -> Result<()> {
    let action_name = data_path.split('.').next().unwrap_or_default();
    let key = data_path.rsplit('.').next().unwrap_or_default();
    if action_name.is_empty() || key.is_empty() {
        return Err(Error::invalid_value(
            "data_path",
            format!("cannot parse an action name and key from '{}'", data_path),
        ));
    }

    let action = ctx.container()?.require_action(action_name)?;
    let found = find_all(key, &action.result_data).last().cloned();

    match found {
        Some(value) => ctx.store_mut().assign(variable, value),
        None => tracing::warn!(action = action_name, key, "no value found in action result data"),
    }
    Ok(())
}

pub fn assign_variable(ctx: &mut RunContext, name: &str, value: &str) {
    ctx.store_mut().assign(name, value);
}

/// Keep a table projected to a mapping on the run, outside any container
pub fn store_table(ctx: &mut RunContext, table: &Table) -> Result<()> {
    let data = ctx.table_to_dict(table)?;
    ctx.set_data(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;
    use crate::model::{Action, ActionStatus};
    use serde_json::json;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn declared() -> RunContext {
        let mut ctx = RunContext::new(Config::default());
        declare_container(&mut ctx, "case", "events").unwrap();
        ctx
    }

    #[test]
    fn test_declare_container_adds_default_tag() {
        let ctx = declared();
        assert!(ctx.container().unwrap().tags.contains("phantom-test-cases"));
    }

    #[test]
    fn test_declare_container_requires_name_and_label() {
        let mut ctx = RunContext::default();
        assert!(matches!(
            declare_container(&mut ctx, "", "events"),
            Err(Error::ContainerMissingAttributes)
        ));
        assert!(!ctx.has_container());
    }

    #[test]
    fn test_container_from_table() {
        let mut ctx = RunContext::default();
        let t = table(&[&["name", "label", "run_automation"], &["Test", "alert", "True"]]);
        container_from_table(&mut ctx, &t).unwrap();
        let container = ctx.container().unwrap();
        assert_eq!(container.name, "Test");
        assert!(container.run_automation);
    }

    #[test]
    fn test_container_from_table_without_label() {
        let mut ctx = RunContext::default();
        let t = table(&[&["name"], &["Test"]]);
        assert!(matches!(
            container_from_table(&mut ctx, &t),
            Err(Error::ContainerMissingAttributes)
        ));
    }

    #[test]
    fn test_container_attribute_table() {
        let mut ctx = declared();
        let t = table(&[&["type", "incident"], &["source", "network"]]);
        container_attribute_table(&mut ctx, "custom_fields", &t).unwrap();
        let tags = table(&[&["t1"], &["t2"]]);
        container_attribute_table(&mut ctx, "tags", &tags).unwrap();

        let container = ctx.container().unwrap();
        assert_eq!(container.custom_fields["type"], json!("incident"));
        assert_eq!(container.custom_fields["source"], json!("network"));
        assert_eq!(container.tags.iter().collect::<Vec<_>>(), ["t1", "t2"]);

        assert!(matches!(
            container_attribute_table(&mut ctx, "bogus", &t),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_artifact_attribute_declares_missing_artifact() {
        let mut ctx = declared();
        artifact_attribute(&mut ctx, "test1", "cef", "foo:bar").unwrap();
        artifact_attribute(&mut ctx, "test1", "tags", "[a, b]").unwrap();
        artifact_attribute(&mut ctx, "test1", "emailDetails", "from:example.com").unwrap();

        let artifact = ctx.container().unwrap().get_artifact("test1").unwrap().clone();
        assert_eq!(artifact.cef["foo"], json!("bar"));
        assert_eq!(artifact.cef["emailDetails"], json!({"from": "example.com"}));
        assert_eq!(artifact.tags.len(), 2);
    }

    #[test]
    fn test_artifact_attribute_keeps_existing_cef_key() {
        let mut ctx = declared();
        artifact_attribute(&mut ctx, "test1", "emailDetails", "from:a.com").unwrap();
        artifact_attribute(&mut ctx, "test1", "emailDetails", "from:b.com").unwrap();

        let artifact = ctx.container().unwrap().get_artifact("test1").unwrap().clone();
        assert_eq!(artifact.cef["emailDetails"], json!({"from": "a.com"}));
    }

    #[test]
    fn test_artifact_text_value_nested_key() {
        let mut ctx = declared();
        declare_artifact(&mut ctx, "mail", "email", None).unwrap();
        artifact_text_value(&mut ctx, "mail", "body", "hello").unwrap();
        artifact_text_value(&mut ctx, "mail", "headers:subject", "hi there").unwrap();

        let artifact = ctx.container().unwrap().get_artifact("mail").unwrap();
        assert_eq!(artifact.cef["body"], json!("hello"));
        assert_eq!(artifact.cef["headers"], json!({"subject": "hi there"}));
        assert!(matches!(
            artifact_text_value(&mut ctx, "other", "body", "x"),
            Err(Error::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_declare_artifact_with_table_resolves_tokens() {
        let mut ctx = declared();
        assign_variable(&mut ctx, "ip", "10.1.1.1");
        let t = table(&[&["key", "value"], &["sourceAddress", "${ip}"]]);
        declare_artifact(&mut ctx, "a1", "event", Some(&t)).unwrap();
        let artifact = ctx.container().unwrap().get_artifact("a1").unwrap();
        assert_eq!(artifact.cef["sourceAddress"], json!("10.1.1.1"));
    }

    #[test]
    fn test_declare_artifact_without_container() {
        let mut ctx = RunContext::default();
        assert!(matches!(
            declare_artifact(&mut ctx, "a1", "event", None),
            Err(Error::ContainerNotConfigured)
        ));
    }

    #[test]
    fn test_artifact_table_values() {
        let mut ctx = declared();
        declare_artifact(&mut ctx, "a1", "event", None).unwrap();
        let tags = table(&[&["tag1"], &["tag2"]]);
        artifact_table_values(&mut ctx, "a1", "tags", &tags).unwrap();
        let details = table(&[&["fromAddress", "example.com"], &["date", "1/01/2020"]]);
        artifact_table_values(&mut ctx, "a1", "emailDetails", &details).unwrap();

        let artifact = ctx.container().unwrap().get_artifact("a1").unwrap();
        assert!(artifact.tags.contains("tag1") && artifact.tags.contains("tag2"));
        assert_eq!(artifact.cef["emailDetails"]["date"], json!("1/01/2020"));
    }

    #[test]
    fn test_bulk_artifacts() {
        let mut ctx = declared();
        let t = table(&[
            &["name", "label", "cef", "tags"],
            &["test1", "event", "foo:bar", "[foo,bar]"],
            &["test2", "event", "{\"n\": 1}", "[]"],
        ]);
        bulk_artifacts(&mut ctx, &t).unwrap();
        let container = ctx.container().unwrap();
        assert_eq!(container.artifact_names(), ["test1", "test2"]);
        assert_eq!(container.artifacts[1].cef["n"], json!(1));
    }

    #[test]
    fn test_prompts_attach_to_last_playbook() {
        let mut ctx = declared();
        let responses = table(&[&["yes"], &["no"]]);
        assert!(matches!(
            configure_prompt(&mut ctx, "approve", &responses),
            Err(Error::PlaybooksNotConfigured)
        ));

        declare_playbook(&mut ctx, "first").unwrap();
        declare_playbook(&mut ctx, "second").unwrap();
        configure_prompt(&mut ctx, "approve", &responses).unwrap();
        let pairs = table(&[&["approve", "maybe"], &["escalate", "no"]]);
        configure_prompts_table(&mut ctx, &pairs).unwrap();

        let container = ctx.container().unwrap();
        assert!(container.playbooks[0].prompts.is_empty());
        let prompts = &container.playbooks[1].prompts;
        assert_eq!(prompts["approve"], ["yes", "no", "maybe"]);
        assert_eq!(prompts["escalate"], ["no"]);
    }

    #[test]
    fn test_assign_action_output_last_match_wins() {
        let mut ctx = declared();
        let mut playbook = Playbook::new("triage");
        playbook.actions.push(
            Action::new("lookup", ActionStatus::Success).with_result(json!([
                {"data": {"ip": "1.1.1.1"}},
                {"data": {"ip": "2.2.2.2"}}
            ])),
        );
        ctx.container_mut().unwrap().add_playbook(playbook).unwrap();

        assign_action_output(&mut ctx, "lookup.data.ip", "found_ip").unwrap();
        assert_eq!(ctx.store().get("found_ip"), Some(&json!("2.2.2.2")));

        assert!(matches!(
            assign_action_output(&mut ctx, "missing.ip", "x"),
            Err(Error::ActionNotFound(_))
        ));
    }

    #[test]
    fn test_store_table() {
        let mut ctx = RunContext::default();
        let t = table(&[&["key", "value"], &["a", "1"]]);
        store_table(&mut ctx, &t).unwrap();
        assert_eq!(ctx.data().unwrap()["a"], json!("1"));
    }
}
