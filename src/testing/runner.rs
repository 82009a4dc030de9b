//! Test runner implementation
//!
//! Executes scenarios step by step against a [`PlatformClient`], with a
//! fresh [`RunContext`] per scenario so nothing leaks between runs.

use std::path::Path;

use colored::Colorize;

use crate::client::{OfflineClient, PlatformClient};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::context::RunContext;
use crate::steps::{configuration, interaction, misc, validation};

use super::config::{PlatformFixtures, ScenarioStep, TestScenario};

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

impl TestResult {
    /// Failed result for a scenario file that could not be loaded
    pub fn unloaded(path: &Path, error: &Error) -> Self {
        Self {
            name: path.display().to_string(),
            passed: false,
            steps_run: 0,
            steps_total: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Load and parse a YAML scenario
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read test scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse test scenario: {}", e)))
}

/// Build an offline platform preloaded with the scenario's fixtures
pub async fn offline_platform(fixtures: &PlatformFixtures) -> OfflineClient {
    let client = OfflineClient::new();
    for playbook in &fixtures.playbooks {
        client.script_playbook(playbook.clone()).await;
    }
    for container in &fixtures.containers {
        client.seed_container(container.clone()).await;
    }
    client
}

/// Run a test scenario from a YAML file against the offline platform
pub async fn run_scenario(path: &Path, config: &Config, verbose: bool) -> Result<TestResult> {
    let scenario = load_scenario(path)?;
    let client = offline_platform(&scenario.platform).await;
    let base_dir = path.parent().unwrap_or(Path::new("."));

    Ok(execute_scenario(&scenario, base_dir, &client, config, verbose).await)
}

/// Run an already loaded scenario
///
/// Relative file paths in steps resolve against `base_dir`.
pub async fn execute_scenario(
    scenario: &TestScenario,
    base_dir: &Path,
    client: &dyn PlatformClient,
    config: &Config,
    verbose: bool,
) -> TestResult {
    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
    if verbose && !scenario.tags.is_empty() {
        println!("  Tags: {}", scenario.tags.join(", ").dimmed());
    }

    let mut ctx = RunContext::new(config.clone()).with_tags(scenario.tags.clone());

    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        ctx.before_step();
        let outcome = execute_step(&mut ctx, client, step, base_dir).await;
        ctx.after_step();

        match outcome {
            Ok(()) => {
                println!(
                    "  {} Step {}: {}",
                    "✓".green(),
                    step_num,
                    step.describe().dimmed()
                );
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
                if verbose {
                    println!("    {} {}", "kind:".dimmed(), e.kind());
                }
                tracing::debug!(
                    scenario = %scenario.name,
                    step = step_num,
                    error = %e,
                    "step failed"
                );

                return TestResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: step_num,
                    steps_total,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    if verbose && !ctx.store().is_empty() {
        println!("\n{}", "Variables:".cyan());
        for (name, value) in ctx.store().iter() {
            println!("  {} = {}", name, crate::substitute::value_text(value).dimmed());
        }
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Test Passed".green().bold()
    );

    TestResult {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    }
}

/// Execute a single test step
async fn execute_step(
    ctx: &mut RunContext,
    client: &dyn PlatformClient,
    step: &ScenarioStep,
    base_dir: &Path,
) -> Result<()> {
    use ScenarioStep as S;

    match step {
        // Configuration
        S::ContainerTable { table } => configuration::container_from_table(ctx, table),
        S::Container { name, label } => configuration::declare_container(ctx, name, label),
        S::ContainerAttributeTable { attribute, table } => {
            configuration::container_attribute_table(ctx, attribute, table)
        }
        S::ArtifactText {
            artifact,
            key,
            text,
        } => configuration::artifact_text_value(ctx, artifact, key, text),
        S::ArtifactAttribute {
            artifact,
            attribute,
            value,
        } => configuration::artifact_attribute(ctx, artifact, attribute, value),
        S::Artifact { name, label, table } => {
            configuration::declare_artifact(ctx, name, label, table.as_ref())
        }
        S::ArtifactTable {
            artifact,
            field,
            table,
        } => configuration::artifact_table_values(ctx, artifact, field, table),
        S::Artifacts { table } => configuration::bulk_artifacts(ctx, table),
        S::Playbook { name } => configuration::declare_playbook(ctx, name),
        S::Prompt { prompt, table } => configuration::configure_prompt(ctx, prompt, table),
        S::Prompts { table } => configuration::configure_prompts_table(ctx, table),
        S::UploadFile { path } => {
            let path = if path.is_relative() {
                base_dir.join(path)
            } else {
                path.clone()
            };
            configuration::upload_file(ctx, client, &path).await
        }
        S::AssignActionOutput {
            data_path,
            variable,
        } => configuration::assign_action_output(ctx, data_path, variable),
        S::Variable { name, value } => {
            configuration::assign_variable(ctx, name, value);
            Ok(())
        }
        S::StoreTable { table } => configuration::store_table(ctx, table),

        // Platform interaction
        S::RunPlaybooks => interaction::run_all_playbooks(ctx, client).await,
        S::RunPlaybook { name } => interaction::run_playbook(ctx, client, name).await,
        S::CollectResults => interaction::collect_results(ctx, client).await,
        S::CreateContainer => interaction::create_container(ctx, client).await,
        S::CreateNote { title, content } => {
            interaction::create_note(ctx, client, title, content).await
        }
        S::CloseContainer => interaction::close_container(ctx, client).await,
        S::DeleteContainer => interaction::delete_container(ctx, client).await,
        S::LoadContainer { id } => interaction::load_existing_container(ctx, client, *id).await,
        S::SwitchToCreatedContainer { label } => {
            interaction::switch_to_created_container(ctx, client, label).await
        }

        // Validation
        S::PlaybookStatus { playbook, status } => {
            validation::playbook_status(ctx, playbook, status)
        }
        S::ActionsSuccessful => validation::all_actions_successful(ctx),
        S::CallbackStatus {
            playbook,
            callback,
            child,
            status,
        } => validation::callback_status(ctx, playbook, callback, child, status),
        S::PlaybookActionStatus {
            playbook,
            action,
            status,
        } => validation::playbook_action_status(ctx, playbook, action, status),
        S::PlaybookNotRun { playbook } => validation::playbook_not_run(ctx, playbook),
        S::PinText { style, text } => validation::pin_with_text(ctx, style, text),
        S::Pin {
            style,
            message,
            data,
        } => validation::full_pin(ctx, style, message, data),
        S::ActionStatus { action, status } => validation::action_status(ctx, action, status),
        S::ActionNotRun { action } => validation::action_not_run(ctx, action),
        S::ActionField {
            action,
            field,
            value,
        } => validation::action_field(ctx, action, field, value),
        S::ExpectArtifact {
            artifact,
            attribute,
            value,
        } => validation::artifact_attribute(ctx, artifact, attribute, value),
        S::ExpectArtifactTable {
            artifact,
            field,
            table,
        } => validation::artifact_table_values(ctx, artifact, field, table),
        S::ArtifactHasCef { artifact, key } => validation::artifact_has_cef_key(ctx, artifact, key),
        S::ArtifactLacksCef { artifact, key } => {
            validation::artifact_lacks_cef_key(ctx, artifact, key)
        }
        S::MinimumArtifacts { quantity, label } => {
            validation::minimum_labeled_artifacts(ctx, *quantity, label)
        }
        S::ExpectContainer { attribute, value } => {
            validation::container_attribute(ctx, attribute, value)
        }
        S::ContainerDataTable { key, table } => validation::container_data_table(ctx, key, table),
        S::CommentPresent { comment } => validation::comment_present(ctx, comment),
        S::NotePresent { title } => validation::note_present(ctx, title),
        S::NoteCount { quantity } => validation::note_count(ctx, *quantity),

        // Misc
        S::Wait { seconds } => {
            misc::wait(ctx, *seconds).await;
            Ok(())
        }
        S::Debug => misc::debug_dump(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(yaml: &str) -> TestScenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_unreadable_scenario_becomes_failed_result() {
        let path = Path::new("does/not/exist.yaml");
        let err = run_scenario(path, &Config::default(), false).await.unwrap_err();
        let result = TestResult::unloaded(path, &err);

        assert!(!result.passed);
        assert_eq!(result.name, "does/not/exist.yaml");
        assert_eq!(result.steps_run, 0);
        assert!(result.error.unwrap().contains("exist.yaml"));
    }

    #[tokio::test]
    async fn test_failed_step_stops_the_run() {
        let s = scenario(
            r#"
name: stops early
steps:
  - step: container
    name: Case
    label: events
  - step: playbook_status
    playbook: missing
    status: success
  - step: create_container
"#,
        );
        let client = offline_platform(&s.platform).await;
        let result = execute_scenario(&s, Path::new("."), &client, &Config::default(), false).await;

        assert!(!result.passed);
        assert_eq!(result.steps_run, 2);
        assert_eq!(result.steps_total, 3);
        assert!(result.error.unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_variables_resolve_between_steps() {
        let s = scenario(
            r#"
name: tokens
steps:
  - step: container
    name: "${case}"
    label: events
  - step: variable
    name: case
    value: Case 42
  - step: expect_container
    attribute: name
    value: Case 42
"#,
        );
        let client = offline_platform(&s.platform).await;
        let result = execute_scenario(&s, Path::new("."), &client, &Config::default(), false).await;
        assert!(result.passed, "{:?}", result.error);
    }

    #[tokio::test]
    async fn test_debug_step_fails_with_container() {
        let s = scenario(
            r#"
name: debug
steps:
  - step: container
    name: Case
    label: events
  - step: debug
"#,
        );
        let client = offline_platform(&s.platform).await;
        let result = execute_scenario(&s, Path::new("."), &client, &Config::default(), false).await;
        assert!(!result.passed);
        assert!(result.error.unwrap().contains("\"label\": \"events\""));
    }
}
