// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn midcert() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_midcert"));
    cmd.env_remove("MIDCERT_DATA_DIR")
        .env_remove("MIDCERT_CONFIG")
        .env_remove("MIDCERT_LOG_JSON")
        .env_remove("RUST_LOG");
    cmd
}

fn parse_commands_from_help(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut in_commands = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed == "Commands:" {
            in_commands = true;
            continue;
        }
        if in_commands {
            if trimmed.is_empty() {
                break;
            }
            let name = trimmed.split_whitespace().next().unwrap_or("");
            if !name.is_empty() && name != "help" {
                commands.push(name.to_string());
            }
        }
    }
    commands.sort();
    commands
}

#[test]
fn help_command_surface_is_stable() {
    let output = midcert().arg("--help").output().expect("run help");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8 help");
    assert_eq!(
        parse_commands_from_help(&text),
        vec![
            "checklist",
            "completion",
            "config",
            "generate",
            "kpi",
            "load",
            "run",
            "validate"
        ]
    );
    assert!(text.contains("MIDCERT_DATA_DIR"));
}

#[test]
fn version_output_contains_crate_version() {
    midcert()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_returns_usage_exit_code_with_machine_error() {
    midcert()
        .args(["--json", "--unknown-flag"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("usage_error"));
}

#[test]
fn missing_command_is_a_usage_error() {
    midcert()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing command"));
}

#[test]
fn zero_applications_is_rejected_as_invalid_config() {
    let tmp = tempdir().expect("tmp");
    midcert()
        .current_dir(tmp.path())
        .args(["--json", "generate", "--applications", "0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid_config"));
    assert!(!tmp.path().join("data").exists());
}

#[test]
fn application_count_beyond_audit_ids_is_rejected_as_invalid_config() {
    let tmp = tempdir().expect("tmp");
    midcert()
        .current_dir(tmp.path())
        .args(["--json", "generate", "--applications", "70000"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("applications must be <= 19999"));
    assert!(!tmp.path().join("data").exists());
}

#[test]
fn config_file_with_unknown_field_is_rejected() {
    let tmp = tempdir().expect("tmp");
    let config = tmp.path().join("generator.json");
    std::fs::write(&config, r#"{"applications": 20, "colour": "blue"}"#).expect("write config");
    midcert()
        .current_dir(tmp.path())
        .args(["generate", "--config"])
        .arg(&config)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn missing_config_file_is_a_dependency_failure() {
    let tmp = tempdir().expect("tmp");
    midcert()
        .current_dir(tmp.path())
        .args(["generate", "--config", "nope.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn config_reports_defaults_and_flag_overrides() {
    let tmp = tempdir().expect("tmp");
    let output = midcert()
        .current_dir(tmp.path())
        .args(["--json", "config", "--seed", "7"])
        .output()
        .expect("run config");
    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(payload["command"], "config");
    assert_eq!(payload["config"]["applications"], 300);
    assert_eq!(payload["config"]["clients"], 50);
    assert_eq!(payload["config"]["seed"], 7);
    assert!(payload["config_source"].is_null());
    assert_eq!(payload["paths"]["database"], "data/certification.db");
}

#[test]
fn completion_script_names_the_binary() {
    midcert()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("midcert"));
}
