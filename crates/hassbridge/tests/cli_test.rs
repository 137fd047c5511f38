//! Integration tests for the `hassbridge` CLI binary.
//!
//! Every test works offline against snapshot files in a temp directory.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `hassbridge` binary with env isolation.
///
/// Points config directories at a nonexistent path so tests never touch
/// the user's real configuration.
fn hassbridge_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hassbridge");
    cmd.env("HOME", "/tmp/hassbridge-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/hassbridge-cli-test-nonexistent")
        .env_remove("HASSBRIDGE_CONFIG")
        .env_remove("HASSBRIDGE_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn kitchen_snapshot(dir: &Path) -> PathBuf {
    write_json(
        dir,
        "snapshot.json",
        &json!({
            "devices": [{
                "name": "kitchen",
                "entities": [
                    { "entity_id": "light.ceiling" },
                    { "entity_id": "sensor.kitchen_temperature" },
                ]
            }],
            "entities": [{ "entity_id": "switch.kettle" }],
            "states": {
                "light.ceiling": { "state": "on", "attributes": { "brightness": 200 } },
                "sensor.kitchen_temperature": {
                    "state": "21.4",
                    "attributes": { "device_class": "temperature", "state_class": "measurement" }
                },
                "switch.kettle": { "state": "off" },
            }
        }),
    )
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = hassbridge_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    hassbridge_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("compose")
            .and(predicate::str::contains("classify"))
            .and(predicate::str::contains("command"))
            .and(predicate::str::contains("replay")),
    );
}

#[test]
fn test_version_flag() {
    hassbridge_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hassbridge"));
}

#[test]
fn test_invalid_output_format() {
    let output = hassbridge_cmd()
        .args(["--output", "invalid", "config", "path"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    hassbridge_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    hassbridge_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    hassbridge_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── compose / classify ──────────────────────────────────────────────

#[test]
fn test_compose_json() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    let output = hassbridge_cmd()
        .args(["-o", "json", "compose"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report = stdout_json(&output);
    let names: Vec<&str> = report["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["kitchen", "switch.kettle"]);

    let kitchen = &report["devices"][0];
    assert_eq!(kitchen["unique_id"].as_str().unwrap().len(), 32);
    let endpoints: Vec<&str> = kitchen["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(endpoints, vec!["", "light.ceiling", "sensor.kitchen_temperature"]);
}

#[test]
fn test_compose_plain_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    hassbridge_cmd()
        .args(["-o", "plain", "compose", "--device", "kitchen"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout("kitchen\n");
}

#[test]
fn test_compose_table() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    hassbridge_cmd()
        .args(["--color", "never", "compose"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("(root)")
                .and(predicate::str::contains("MA-tempsensor"))
                .and(predicate::str::contains("temperatureMeasurement")),
        );
}

#[test]
fn test_compose_missing_snapshot() {
    let output = hassbridge_cmd()
        .args(["compose", "/tmp/hassbridge-cli-test-nonexistent/none.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("cannot read"));
}

#[test]
fn test_classify_plain_lists_every_entity() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    hassbridge_cmd()
        .args(["-o", "plain", "classify"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout("light.ceiling\nsensor.kitchen_temperature\nswitch.kettle\n");
}

// ── command / write ─────────────────────────────────────────────────

#[test]
fn test_command_emits_service_call() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    let output = hassbridge_cmd()
        .args(["-o", "json", "command"])
        .arg(&snapshot)
        .args([
            "--device",
            "kitchen",
            "--endpoint",
            "light.ceiling",
            "--cluster",
            "levelControl",
            "moveToLevel",
            "--payload",
            r#"{"level": 254}"#,
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        stdout_json(&output),
        json!({
            "domain": "light",
            "service": "turn_on",
            "entity_id": "light.ceiling",
            "data": { "brightness": 255 }
        })
    );
}

#[test]
fn test_command_unknown_device() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    let output = hassbridge_cmd()
        .arg("command")
        .arg(&snapshot)
        .args(["--device", "garage", "--cluster", "onOff", "on"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("garage"));
}

#[test]
fn test_write_unchanged_value_is_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    hassbridge_cmd()
        .arg("write")
        .arg(&snapshot)
        .args([
            "--device",
            "switch.kettle",
            "--cluster",
            "onOff",
            "onOff",
            "true",
            "--old",
            "true",
        ])
        .assert()
        .success()
        .stdout("(suppressed)\n");
}

// ── replay ──────────────────────────────────────────────────────────

#[test]
fn test_replay_reports_updates() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = kitchen_snapshot(dir.path());
    let events = write_json(
        dir.path(),
        "events.json",
        &json!([{
            "type": "state_changed",
            "entity_id": "switch.kettle",
            "new_state": { "state": "on" }
        }]),
    );
    hassbridge_cmd()
        .args(["-o", "plain", "replay"])
        .arg(&snapshot)
        .arg(&events)
        .assert()
        .success()
        .stdout("onOff/onOff\n");
}

// ── config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file_uses_defaults() {
    hassbridge_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[bridge]"));
}

#[test]
fn test_config_init_then_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hassbridge.toml");

    hassbridge_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    let output = hassbridge_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));

    hassbridge_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hassbridge.toml");
    std::fs::write(&path, "[bridge]\nvendor_id = 0\n").unwrap();
    let snapshot = kitchen_snapshot(dir.path());

    let output = hassbridge_cmd()
        .arg("--config")
        .arg(&path)
        .arg("compose")
        .arg(&snapshot)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("vendor_id"));
}
