//! End-to-end tests against the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

use super::fixture::TestFixture;

const REQUEST: &str = r"
agent:
  name: reviewer
  allowed_tools: [filesystem.read, network.http]
  requires_network: true
collection:
  name: platform
  allowed_tools: [filesystem.*]
  denied_tools: [filesystem.write]
  requires_network: false
";

const BROKEN_REQUEST: &str = r"
agent:
  name: broken
  allowed_tools: ['bad..pattern']
";

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("powerforge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("specialist"));
}

#[test]
fn test_resolve_human_output() {
    let fixture = TestFixture::new("resolve_human");
    fixture.write("request.yaml", REQUEST);

    let output = fixture.run(&["resolve", "request.yaml"]);
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Resolution: reviewer"));
    assert!(output.stdout.contains("filesystem.read"));
    assert!(output.stdout.contains("collection-conflict"));
}

#[test]
fn test_resolve_robot_output() {
    let fixture = TestFixture::new("resolve_robot");
    fixture.write("request.yaml", REQUEST);

    let output = fixture.run(&["--robot", "resolve", "request.yaml", "--report-only"]);
    assert!(output.success, "stderr: {}", output.stderr);
    let json = output.json();
    assert_eq!(json["status"], "ok");
    let report = &json["data"];
    assert_eq!(report["final_allowed_tools"], serde_json::json!(["filesystem.read"]));
    assert_eq!(report["network_access"]["final_resolution"], false);
    assert!(!json["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_robot_mode_from_env() {
    let fixture = TestFixture::new("robot_env");
    fixture.write("request.yaml", REQUEST);

    let output = fixture.run_with_env(&["resolve", "request.yaml"], &[("POWERFORGE_ROBOT", "1")]);
    assert!(output.success, "stderr: {}", output.stderr);
    assert_eq!(output.json()["status"], "ok");
}

#[test]
fn test_policy_errors_fail_with_code() {
    let fixture = TestFixture::new("policy_errors");
    fixture.write("broken.yaml", BROKEN_REQUEST);

    let output = fixture.run(&["--robot", "resolve", "broken.yaml"]);
    assert!(!output.success);
    let json = output.json();
    assert_eq!(json["status"]["error"]["code"], "policy_errors");
    assert!(json["data"].as_array().is_some_and(|errors| !errors.is_empty()));

    let human = fixture.run(&["resolve", "broken.yaml"]);
    assert!(!human.success);
    assert!(human.stderr.contains("malformed pattern"));
}

#[test]
fn test_conflict_policy_from_env() {
    let fixture = TestFixture::new("conflict_env");
    fixture.write("request.yaml", REQUEST);

    let output = fixture.run_with_env(
        &["resolve", "request.yaml"],
        &[("POWERFORGE_CONFLICT_POLICY", "error")],
    );
    assert!(!output.success);
    assert!(output.stderr.contains("network.http"));
}

#[test]
fn test_project_config_is_read() {
    let fixture = TestFixture::new("project_config");
    fixture.write("request.yaml", REQUEST);
    fixture.write("powerforge.toml", "[resolution]\nconflict_policy = \"error\"\n");

    let output = fixture.run(&["resolve", "request.yaml"]);
    assert!(!output.success);
}

#[test]
fn test_missing_explicit_config() {
    let fixture = TestFixture::new("missing_config");
    fixture.write("request.yaml", REQUEST);

    let output = fixture.run(&["--config", "nope.toml", "resolve", "request.yaml"]);
    assert!(!output.success);
    assert!(output.stderr.contains("nope.toml"));
}

#[test]
fn test_batch_reports_partial() {
    let fixture = TestFixture::new("batch_partial");
    fixture.write("good.yaml", REQUEST);
    fixture.write("bad.yaml", BROKEN_REQUEST);

    let output = fixture.run(&["--robot", "batch", "good.yaml", "bad.yaml", "missing.yaml"]);
    assert!(!output.success);

    // The partial payload comes first, followed by the validation error.
    let partial: serde_json::Value = serde_json::Deserializer::from_str(&output.stdout)
        .into_iter::<serde_json::Value>()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(partial["status"]["partial"]["completed"], 1);
    assert_eq!(partial["status"]["partial"]["failed"], 2);
    let entries = partial["data"].as_array().unwrap();
    assert_eq!(entries[0]["path"], "good.yaml");
    assert_eq!(entries[0]["ok"], true);
    assert_eq!(entries[1]["ok"], false);
    assert_eq!(entries[2]["path"], "missing.yaml");
}

#[test]
fn test_batch_with_threads() {
    let fixture = TestFixture::new("batch_threads");
    fixture.write("a.yaml", REQUEST);
    fixture.write("b.yaml", REQUEST);

    let output = fixture.run(&["batch", "--threads", "2", "a.yaml", "b.yaml"]);
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Resolved"));
}

#[test]
fn test_lint_fails_on_errors() {
    let fixture = TestFixture::new("lint_errors");
    fixture.write(
        "agent.yaml",
        "name: sloppy\nallowed_tools: ['../secrets']\ndenied_tools: []\n",
    );

    let output = fixture.run(&["lint", "agent.yaml"]);
    assert!(!output.success);
    assert!(output.stdout.contains("no-suspicious-pattern"));

    let skipped = fixture.run(&[
        "lint",
        "agent.yaml",
        "--skip",
        "no-suspicious-pattern,valid-pattern-syntax",
    ]);
    assert!(skipped.success, "stdout: {}", skipped.stdout);
}

#[test]
fn test_lint_strict_promotes_warnings() {
    let fixture = TestFixture::new("lint_strict");
    fixture.write("agent.yaml", "name: broad\nallowed_tools: ['*']\n");

    assert!(fixture.run(&["lint", "agent.yaml"]).success);
    assert!(!fixture.run(&["lint", "agent.yaml", "--strict"]).success);
}

#[test]
fn test_lint_list_rules() {
    let fixture = TestFixture::new("lint_list");
    let output = fixture.run(&["--robot", "lint", "--list-rules"]);
    assert!(output.success, "stderr: {}", output.stderr);
    let ids: Vec<String> = output.json()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|rule| rule["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 6);
    assert!(ids.contains(&"opt-out-justified".to_string()));
}

#[test]
fn test_specialist_suggestion() {
    let fixture = TestFixture::new("specialist_cli");
    fixture.agent("agents/orchestrator");
    fixture.agent("agents/database-specialist");

    let found = fixture.run(&["specialist", "agents/orchestrator", "database-specialist"]);
    assert!(found.success, "stderr: {}", found.stderr);
    assert!(found.stdout.contains("standalone"));

    let missing = fixture.run(&["--robot", "specialist", "agents/orchestrator", "db_expert"]);
    assert!(!missing.success);
    let json = missing.json();
    assert_eq!(json["status"]["error"]["code"], "policy_errors");
    assert_eq!(json["data"][0]["suggestion"], "database-specialist");
}
