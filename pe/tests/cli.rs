//! CLI tests for offline commands

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pe(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pe").expect("pe binary");
    cmd.current_dir(home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_render_wrapped_plan() {
    let home = TempDir::new().expect("temp dir");
    let plan_path = home.path().join("plan.json");
    std::fs::write(
        &plan_path,
        r#"{"plan": [{"step": 2, "description": "x", "agent": "a", "arguments": {"k": 1}}, {"description": "y", "agent": "b"}]}"#,
    )
    .expect("write plan");

    pe(&home)
        .args(["render", "plan.json"])
        .assert()
        .success()
        .stdout("2. x - agent: a, arguments: {\"k\":1}\n2. y - agent: b, arguments: {}\n");
}

#[test]
fn test_render_bare_sequence() {
    let home = TempDir::new().expect("temp dir");
    std::fs::write(home.path().join("steps.json"), r#"[{"description": "first", "agent": "finder"}]"#)
        .expect("write plan");

    pe(&home)
        .args(["render", "steps.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. first - agent: finder, arguments: {}"));
}

#[test]
fn test_render_invalid_json_fails() {
    let home = TempDir::new().expect("temp dir");
    std::fs::write(home.path().join("bad.json"), "{not json").expect("write plan");

    pe(&home)
        .args(["render", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().expect("temp dir");

    pe(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan").and(predicate::str::contains("render")));
}
