//! Integration tests for the recipe-runner binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_recipe(content: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("recipe.yaml");
    fs::write(&path, content).unwrap();
    (temp, path)
}

fn recipe_runner() -> Command {
    let mut cmd = Command::new(cargo_bin("recipe-runner"));
    cmd.env("NO_COLOR", "1");
    cmd
}

const SIMPLE_RECIPE: &str = r#"
name: simple
context:
  who: world
steps:
  - id: greet
    command: echo hello {{who}}
    output: greeting
  - id: shout
    command: echo {{greeting}} | tr a-z A-Z
    output: loud
    condition: "greeting != ''"
"#;

#[test]
fn cli_help_lists_subcommands() -> Result<(), Box<dyn std::error::Error>> {
    recipe_runner()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("list"));
    Ok(())
}

#[test]
fn cli_version() -> Result<(), Box<dyn std::error::Error>> {
    recipe_runner()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    recipe_runner().assert().failure();
    Ok(())
}

#[cfg(unix)]
#[test]
fn run_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = write_recipe(SIMPLE_RECIPE);
    recipe_runner()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recipe 'simple' finished: 2 completed, 0 skipped"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn run_json_reports_context() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = write_recipe(SIMPLE_RECIPE);
    let output = recipe_runner()
        .args(["run", "--json", "-c", "who=cli"])
        .arg(&path)
        .output()?;

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["success"], serde_json::json!(true));
    assert_eq!(value["context"]["greeting"], serde_json::json!("hello cli"));
    assert_eq!(value["context"]["loud"], serde_json::json!("HELLO CLI"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn run_quotes_context_values() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let marker = temp.path().join("pwned");
    let recipe = temp.path().join("recipe.yaml");
    fs::write(
        &recipe,
        "name: quoting\nsteps:\n  - id: s\n    command: echo {{value}}\n    output: out\n",
    )?;

    let output = recipe_runner()
        .args(["run", "--json", "-c"])
        .arg(format!("value=x; touch {}", marker.display()))
        .arg(&recipe)
        .output()?;

    assert!(output.status.success());
    assert!(!marker.exists());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        value["context"]["out"],
        serde_json::json!(format!("x; touch {}", marker.display()))
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn run_failure_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = write_recipe(
        "name: broken\nsteps:\n  - id: boom\n    command: exit 3\n  - id: never\n    command: echo never\n",
    );
    recipe_runner()
        .arg("run")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Step 'boom' failed"));
    Ok(())
}

#[test]
fn run_parse_error_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = write_recipe("name: bad\nsteps: not-a-list\n");
    recipe_runner().arg("run").arg(&path).assert().code(2);
    Ok(())
}

#[test]
fn run_missing_file_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    recipe_runner()
        .args(["run", "/definitely/not/here.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Recipe not found"));
    Ok(())
}

#[test]
fn run_dry_run_dispatches_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let marker = temp.path().join("created");
    let recipe = temp.path().join("recipe.yaml");
    fs::write(
        &recipe,
        format!(
            "name: dry\nsteps:\n  - id: touch\n    command: touch {}\n  - id: ask\n    agent: helper\n    prompt: hi\n",
            marker.display()
        ),
    )?;

    recipe_runner()
        .args(["run", "--dry-run"])
        .arg(&recipe)
        .env("RECIPE_AGENT_COMMAND", "no-such-agent-binary-xyz")
        .assert()
        .success()
        .stdout(predicate::str::contains("dry run"));
    assert!(!marker.exists());
    Ok(())
}

#[test]
fn validate_reports_warnings() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) =
        write_recipe("name: v\nsteps:\n  - id: a\n    command: ls\n    timout: 5\n");
    recipe_runner()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("did you mean 'timeout'?"));
    Ok(())
}

#[test]
fn validate_strict_fails_on_warnings() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) =
        write_recipe("name: v\nsteps:\n  - id: a\n    command: ls\n    timout: 5\n");
    recipe_runner()
        .args(["validate", "--strict"])
        .arg(&path)
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn validate_clean_recipe() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = write_recipe(SIMPLE_RECIPE);
    recipe_runner()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recipe 'simple' is valid (2 steps)"));
    Ok(())
}

#[test]
fn list_shows_steps() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, path) = write_recipe(SIMPLE_RECIPE);
    recipe_runner()
        .arg("list")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("greet"))
        .stdout(predicate::str::contains("-> greeting"))
        .stdout(predicate::str::contains("if greeting != ''"));
    Ok(())
}
