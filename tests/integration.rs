//! End-to-end tests for the scenario runner
//!
//! These tests run complete YAML scenarios through the library and the
//! `soarsteps` binary against the offline platform, and check that each
//! scenario gets its own run state.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use soarsteps::client::{OfflineClient, PlatformClient};
use soarsteps::common::config::Config;
use soarsteps::model::Container;
use soarsteps::testing::{execute_scenario, offline_platform, run_scenario, TestScenario};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scenario(yaml: &str) -> TestScenario {
    serde_yaml::from_str(yaml).expect("scenario should parse")
}

fn soarsteps() -> Command {
    Command::new(env!("CARGO_BIN_EXE_soarsteps"))
}

#[tokio::test]
async fn test_phishing_triage_fixture_passes() {
    let result = run_scenario(&fixture("phishing_triage.yaml"), &Config::default(), false)
        .await
        .unwrap();
    assert!(result.passed, "failed: {:?}", result.error);
    assert_eq!(result.steps_run, result.steps_total);
}

#[tokio::test]
async fn test_existing_container_fixture_passes() {
    let result = run_scenario(&fixture("existing_container.yaml"), &Config::default(), false)
        .await
        .unwrap();
    assert!(result.passed, "failed: {:?}", result.error);
}

#[tokio::test]
async fn test_playbook_failure_fails_scenario() {
    let result = run_scenario(&fixture("failing_playbook.yaml"), &Config::default(), false)
        .await
        .unwrap();
    assert!(!result.passed);
    assert_eq!(result.steps_run, 3);
    assert!(result.error.unwrap().contains("broken_enrichment"));
}

#[tokio::test]
async fn test_ignore_tag_tolerates_playbook_failure() {
    let mut s: TestScenario = serde_yaml::from_str(
        &fs::read_to_string(fixture("failing_playbook.yaml")).unwrap(),
    )
    .unwrap();
    s.tags.push("ignore_exception".to_string());

    let client = offline_platform(&s.platform).await;
    let result = execute_scenario(&s, Path::new("."), &client, &Config::default(), false).await;
    assert!(result.passed, "failed: {:?}", result.error);
}

#[tokio::test]
async fn test_ignore_tag_is_configurable() {
    let mut s: TestScenario = serde_yaml::from_str(
        &fs::read_to_string(fixture("failing_playbook.yaml")).unwrap(),
    )
    .unwrap();
    s.tags.push("flaky".to_string());

    let config = Config::parse("[scenario]\nignore_failure_tag = \"flaky\"\n").unwrap();
    let client = offline_platform(&s.platform).await;
    let result = execute_scenario(&s, Path::new("."), &client, &config, false).await;
    assert!(result.passed, "failed: {:?}", result.error);
}

#[tokio::test]
async fn test_variables_do_not_leak_between_scenarios() {
    let first = scenario(
        r#"
name: assigns
steps:
  - step: variable
    name: leak
    value: from first scenario
"#,
    );
    let second = scenario(
        r#"
name: reads
steps:
  - step: container
    name: "${leak}"
    label: events
  - step: expect_container
    attribute: name
    value: "${leak}"
"#,
    );

    let client = OfflineClient::new();
    let config = Config::default();
    let a = execute_scenario(&first, Path::new("."), &client, &config, false).await;
    let b = execute_scenario(&second, Path::new("."), &client, &config, false).await;
    assert!(a.passed);
    assert!(b.passed, "failed: {:?}", b.error);
}

#[tokio::test]
async fn test_upload_resolves_relative_to_scenario() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("evidence.json"), "{}").unwrap();
    let path = dir.path().join("upload.yaml");
    fs::write(
        &path,
        r#"
name: upload
steps:
  - step: container
    name: Case
    label: events
  - step: create_container
  - step: upload_file
    path: evidence.json
  - step: upload_file
    path: missing.json
"#,
    )
    .unwrap();

    let result = run_scenario(&path, &Config::default(), false).await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.steps_run, 4);
    assert!(result.error.unwrap().contains("missing.json"));
}

#[tokio::test]
async fn test_default_tags_come_from_config() {
    let s = scenario(
        r#"
name: tags
steps:
  - step: container
    name: Case
    label: events
  - step: expect_container
    attribute: tags
    value: "[team-a, nightly]"
"#,
    );
    let config = Config::parse("[scenario]\ndefault_tags = [\"team-a\", \"nightly\"]\n").unwrap();
    let client = OfflineClient::new();
    let result = execute_scenario(&s, Path::new("."), &client, &config, false).await;
    assert!(result.passed, "failed: {:?}", result.error);
}

#[tokio::test]
async fn test_delete_removes_container_from_platform() {
    let s = scenario(
        r#"
name: delete
steps:
  - step: container
    name: Case
    label: events
  - step: create_container
  - step: delete_container
  - step: collect_results
"#,
    );
    let client = OfflineClient::new();
    let result = execute_scenario(&s, Path::new("."), &client, &Config::default(), false).await;
    assert!(!result.passed);
    assert_eq!(result.steps_run, 4);
}

#[tokio::test]
async fn test_note_on_deleted_container_fails() {
    let s = scenario(
        r#"
name: note after delete
steps:
  - step: container
    name: Case
    label: events
  - step: create_container
  - step: delete_container
  - step: create_note
    title: Late
    content: written after delete
"#,
    );
    let client = OfflineClient::new();
    let result = execute_scenario(&s, Path::new("."), &client, &Config::default(), false).await;
    assert!(!result.passed);
    assert_eq!(result.steps_run, 4);
    assert!(result.error.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_offline_client_as_trait_object() {
    let client: Box<dyn PlatformClient> = Box::new(OfflineClient::new());
    let mut container = Container::new("case", "events");
    client.create_container(&mut container).await.unwrap();
    client.update_container_values(&mut container).await.unwrap();
    assert_eq!(container.name, "case");
}

#[test]
fn test_cli_check_accepts_fixtures() {
    let output = soarsteps()
        .arg("check")
        .arg(fixture("phishing_triage.yaml"))
        .arg(fixture("existing_container.yaml"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_check_rejects_unknown_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "name: bad\nsteps:\n  - step: launch_rockets\n").unwrap();

    let output = soarsteps().arg("check").arg(&path).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_run_reports_failures_in_exit_code() {
    let passing = soarsteps()
        .arg("run")
        .arg(fixture("phishing_triage.yaml"))
        .output()
        .unwrap();
    assert!(
        passing.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&passing.stdout)
    );

    let failing = soarsteps()
        .arg("run")
        .arg(fixture("phishing_triage.yaml"))
        .arg(fixture("failing_playbook.yaml"))
        .output()
        .unwrap();
    assert!(!failing.status.success());
    let stderr = String::from_utf8_lossy(&failing.stderr);
    assert!(stderr.contains("1 of 2 scenarios failed"), "stderr: {stderr}");
}

#[test]
fn test_cli_run_continues_past_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.yaml");
    fs::write(&broken, "name: broken\nsteps: [").unwrap();

    let output = soarsteps()
        .arg("run")
        .arg(dir.path().join("absent.yaml"))
        .arg(&broken)
        .arg(fixture("phishing_triage.yaml"))
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Summary:"), "stdout: {stdout}");
    assert!(stdout.contains("1/3 passed"), "stdout: {stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 of 3 scenarios failed"), "stderr: {stderr}");
}

#[test]
fn test_cli_config_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[timeouts]\nmax_wait_secs = 5\n").unwrap();

    let output = soarsteps()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("max_wait_secs      = 5"), "stdout: {stdout}");
}
