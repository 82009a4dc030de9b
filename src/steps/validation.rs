//! Assertion steps over the collected container state
//!
//! Lookups that fail report a not-found error; comparisons that fail report
//! an [`Error::AssertionFailed`] carrying both sides.

use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::context::RunContext;
use crate::literal::{parse_dict, parse_list};
use crate::model::{Action, ActionStatus, Artifact, Container, Playbook};
use crate::substitute::value_text;
use crate::table::{table_to_list, Table};
use crate::validate::{expect_contains_all, expect_text, expect_value, is_truthy};

fn ran_playbook<'a>(container: &'a Container, name: &str) -> Result<&'a Playbook> {
    container
        .get_playbook(name)
        .ok_or_else(|| Error::PlaybookNotRun(name.to_string()))
}

fn cef_entry<'a>(artifact: &'a Artifact, key: &str) -> Result<&'a Value> {
    artifact
        .cef
        .get(key)
        .filter(|v| is_truthy(v))
        .ok_or_else(|| Error::CefKeyNotFound {
            artifact: artifact.name.clone(),
            key: key.to_string(),
        })
}

fn expect_entries(
    subject: &str,
    artifact: &Artifact,
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
) -> Result<()> {
    for (key, value) in expected {
        let found = actual.get(key).ok_or_else(|| Error::CefKeyNotFound {
            artifact: artifact.name.clone(),
            key: key.clone(),
        })?;
        expect_value(&format!("{} '{}'", subject, key), value, found)?;
    }
    Ok(())
}

// === Playbooks ===

pub fn playbook_status(ctx: &RunContext, playbook: &str, status: &str) -> Result<()> {
    let playbook = ran_playbook(ctx.container()?, playbook)?;
    expect_text(&format!("Playbook {} status", playbook.name), status, &playbook.status)
}

/// Every action of every playbook succeeded
pub fn all_actions_successful(ctx: &RunContext) -> Result<()> {
    for playbook in &ctx.container()?.playbooks {
        for action in &playbook.actions {
            if action.status != ActionStatus::Success {
                return Err(Error::assertion(
                    format!("The playbook {}'s action {} status", playbook.name, action.name),
                    ActionStatus::Success,
                    action.status,
                ));
            }
        }
    }
    Ok(())
}

/// Status a playbook reports for a child playbook it called
pub fn callback_status(
    ctx: &RunContext,
    playbook: &str,
    callback: &str,
    child: &str,
    status: &str,
) -> Result<()> {
    let playbook = ran_playbook(ctx.container()?, playbook)?;
    let actual = playbook
        .callback(callback)
        .and_then(|info| info.get("child_playbook_status"))
        .map(value_text)
        .unwrap_or_default();
    expect_text(&format!("Child playbook {} run status", child), status, &actual)
}

pub fn playbook_action_status(
    ctx: &RunContext,
    playbook: &str,
    action: &str,
    status: &str,
) -> Result<()> {
    let expected: ActionStatus = status.parse()?;
    let playbook = ran_playbook(ctx.container()?, playbook)?;
    let action = playbook
        .get_action(action)
        .ok_or_else(|| Error::ActionNotFound(format!("{} in playbook {}", action, playbook.name)))?;
    if action.status != expected {
        return Err(Error::assertion(
            format!("Action {} status", action.name),
            expected,
            action.status,
        ));
    }
    Ok(())
}

/// The playbook is absent from the container or never received a run id
pub fn playbook_not_run(ctx: &RunContext, playbook: &str) -> Result<()> {
    match ctx.container()?.get_playbook(playbook) {
        Some(found) if found.id.is_some() => Err(Error::assertion(
            format!("Playbook {}", playbook),
            "not run",
            format!("ran with status '{}'", found.status),
        )),
        _ => Ok(()),
    }
}

// === Pins ===

/// A pin of the given style whose message or data equals `text`
pub fn pin_with_text(ctx: &RunContext, style: &str, text: &str) -> Result<()> {
    let container = ctx.container()?;
    let found = container
        .pins
        .iter()
        .any(|p| p.style == style && (p.message == text || p.data == text));
    if found {
        return Ok(());
    }
    Err(Error::assertion(
        format!("{} pin", style),
        text,
        format!("{:?}", container.pins),
    ))
}

pub fn full_pin(ctx: &RunContext, style: &str, message: &str, data: &str) -> Result<()> {
    let container = ctx.container()?;
    let found = container
        .pins
        .iter()
        .any(|p| p.style == style && p.message == message && p.data == data);
    if found {
        return Ok(());
    }
    Err(Error::assertion(
        format!("{} pin", style),
        format!("message '{}' with data '{}'", message, data),
        format!("{:?}", container.pins),
    ))
}

// === Actions ===

/// At least one run of the action has the given status
pub fn action_status(ctx: &RunContext, action: &str, status: &str) -> Result<()> {
    let expected: ActionStatus = status.parse()?;
    let matches = ctx.container()?.get_action(action);
    if matches.is_empty() {
        return Err(Error::ActionNotFound(action.to_string()));
    }
    if matches.iter().any(|a| a.status == expected) {
        return Ok(());
    }
    let seen: Vec<String> = matches.iter().map(|a| a.status.to_string()).collect();
    Err(Error::assertion(
        format!("Action {} status", action),
        expected,
        seen.join(", "),
    ))
}

pub fn action_not_run(ctx: &RunContext, action: &str) -> Result<()> {
    let container = ctx.container()?;
    if container.action_names().contains(&action) {
        return Err(Error::assertion(format!("Action {}", action), "not run", "ran"));
    }
    Ok(())
}

/// Compare one field of the first run of an action in its string form
pub fn action_field(ctx: &RunContext, action: &str, field: &str, expected: &str) -> Result<()> {
    let action = ctx.container()?.require_action(action)?;
    let actual = Action::fields().get_text(action, field)?;
    expect_text(&format!("Action {} field {}", action.name, field), expected, &actual)
}

// === Artifacts ===

/// Check one artifact attribute against an inline literal
///
/// `tags` is a minimum-contained check, `cef` compares each listed pair,
/// anything else compares the string form of the field.
pub fn artifact_attribute(
    ctx: &RunContext,
    artifact: &str,
    attribute: &str,
    expected: &str,
) -> Result<()> {
    let artifact = ctx.container()?.require_artifact(artifact)?;
    match attribute {
        "tags" => expect_contains_all(
            &format!("Artifact {} tags", artifact.name),
            parse_list(expected),
            &artifact.tags,
        ),
        "cef" => {
            let expected = parse_dict(expected)?;
            for (key, value) in &expected {
                let actual = cef_entry(artifact, key)?;
                expect_value(&format!("Artifact {} cef '{}'", artifact.name, key), value, actual)?;
            }
            Ok(())
        }
        field => {
            let actual = Artifact::fields().get_text(artifact, field)?;
            expect_text(&format!("Artifact {} {}", artifact.name, field), expected, &actual)
        }
    }
}

/// Check an artifact's `tags`, `cef` or a nested cef mapping against a table
pub fn artifact_table_values(
    ctx: &RunContext,
    artifact: &str,
    sub_field: &str,
    table: &Table,
) -> Result<()> {
    let artifact = ctx.container()?.require_artifact(artifact)?;
    match sub_field {
        "tags" => expect_contains_all(
            &format!("Artifact {} tags", artifact.name),
            table_to_list(table, 1, true)?,
            &artifact.tags,
        ),
        "cef" => expect_entries(
            &format!("Artifact {} cef", artifact.name),
            artifact,
            &ctx.table_to_dict(table)?,
            &artifact.cef,
        ),
        nested => {
            let actual = cef_entry(artifact, nested)?
                .as_object()
                .ok_or_else(|| Error::assertion(
                    format!("Artifact {} cef '{}'", artifact.name, nested),
                    "a mapping",
                    value_text(&artifact.cef[nested]),
                ))?;
            expect_entries(
                &format!("Artifact {} cef '{}'", artifact.name, nested),
                artifact,
                &ctx.table_to_dict(table)?,
                actual,
            )
        }
    }
}

pub fn artifact_has_cef_key(ctx: &RunContext, artifact: &str, key: &str) -> Result<()> {
    let artifact = ctx.container()?.require_artifact(artifact)?;
    cef_entry(artifact, key).map(|_| ())
}

pub fn artifact_lacks_cef_key(ctx: &RunContext, artifact: &str, key: &str) -> Result<()> {
    let artifact = ctx.container()?.require_artifact(artifact)?;
    match artifact.cef.get(key).filter(|v| is_truthy(v)) {
        Some(value) => Err(Error::assertion(
            format!("Artifact {} cef '{}'", artifact.name, key),
            "absent",
            value_text(value),
        )),
        None => Ok(()),
    }
}

/// At least `quantity` artifacts carry `label`
pub fn minimum_labeled_artifacts(ctx: &RunContext, quantity: usize, label: &str) -> Result<()> {
    let count = ctx
        .container()?
        .artifacts
        .iter()
        .filter(|a| a.label == label)
        .count();
    if count < quantity {
        return Err(Error::assertion(
            format!("Artifacts labeled {}", label),
            format!("at least {}", quantity),
            count,
        ));
    }
    Ok(())
}

// === Container ===

/// Check one container attribute against an inline literal
///
/// `tags` is a minimum-contained check; `data` and `custom_fields` take a
/// mapping literal; anything else compares the string form of the field.
pub fn container_attribute(ctx: &RunContext, attribute: &str, expected: &str) -> Result<()> {
    let container = ctx.container()?;
    let subject = format!("The container attribute {}", attribute);
    match attribute {
        "tags" => expect_contains_all(&subject, parse_list(expected), &container.tags),
        "data" | "custom_fields" => {
            let expected = Value::Object(parse_dict(expected)?);
            let actual = Container::fields().get(container, attribute)?;
            expect_value(&subject, &expected, &actual)
        }
        field => {
            let actual = Container::fields().get_text(container, field)?;
            expect_text(&subject, expected, &actual)
        }
    }
}

/// Compare a mapping under the container's `data` with a table
///
/// `data_key` may be `key` or `key:subkey`. Values are compared in their
/// string form, so numbers in the container match plain table cells.
pub fn container_data_table(ctx: &RunContext, data_key: &str, table: &Table) -> Result<()> {
    let container = ctx.container()?;
    let missing = || Error::UnknownField {
        entity: "container data",
        field: data_key.to_string(),
    };

    let mut node = Value::Object(container.data.clone());
    for part in data_key.split(':') {
        node = node.get(part).cloned().ok_or_else(missing)?;
    }
    let actual: Map<String, Value> = node
        .as_object()
        .ok_or_else(missing)?
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(value_text(v))))
        .collect();
    let expected: Map<String, Value> = ctx
        .table_to_dict(table)?
        .into_iter()
        .map(|(k, v)| (k, Value::String(value_text(&v))))
        .collect();

    expect_value(
        &format!("The container data {}", data_key),
        &Value::Object(expected),
        &Value::Object(actual),
    )
}

// === Comments and notes ===

pub fn comment_present(ctx: &RunContext, comment: &str) -> Result<()> {
    let container = ctx.container()?;
    if container.comments.iter().any(|c| c == comment) {
        return Ok(());
    }
    Err(Error::assertion("Comment", comment, format!("{:?}", container.comments)))
}

pub fn note_present(ctx: &RunContext, title: &str) -> Result<()> {
    let container = ctx.container()?;
    let titles: Vec<&str> = container.notes.iter().map(|n| n.title.as_str()).collect();
    if titles.contains(&title) {
        return Ok(());
    }
    Err(Error::assertion("Note", title, format!("{:?}", titles)))
}

/// The created container holds exactly `quantity` notes
pub fn note_count(ctx: &RunContext, quantity: usize) -> Result<()> {
    let container = ctx.container()?;
    if container.id.is_none() {
        return Err(Error::Platform(format!(
            "container '{}' has not been created on the platform",
            container.name
        )));
    }
    if container.notes.len() != quantity {
        return Err(Error::assertion("Note count", quantity, container.notes.len()));
    }
    Ok(())
}
