//! Tests for error handling, exit codes and global flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_no_command_shows_welcome() {
    let t = Test::new();
    let output = t.ak(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "ak set");
}

#[test]
fn test_help_flags() {
    let t = Test::new();
    for flag in ["--help", "-h"] {
        let output = t.ak(&[flag]);
        assert_success(&output);
        assert_stdout_contains(&output, "Usage");
    }
}

#[test]
fn test_version_flag_and_command() {
    let t = Test::new();
    let expected = format!("ak {}", env!("CARGO_PKG_VERSION"));

    let output = t.ak(&["-v"]);
    assert_success(&output);
    assert_stdout_contains(&output, &expected);

    let output = t.ak(&["version"]);
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), expected);
}

#[test]
fn test_unknown_command_exits_one() {
    let t = Test::new();
    let output = t.ak(&["unknown-command"]);
    assert_exit_code(&output, 1);
}

#[test]
fn test_json_usage_error() {
    let t = Test::new();
    let output = t.ak(&["--json", "unknown-command"]);
    assert_exit_code(&output, 1);
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert!(json["error"].as_str().unwrap().contains("unknown-command"));
}

#[test]
fn test_json_runtime_error() {
    let t = Test::new();
    let output = t.ak(&["get", "MISSING", "--json"]);
    assert_exit_code(&output, 1);
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "secret not found: MISSING");
}

#[test]
fn test_human_error_has_hint() {
    let t = Test::new();
    let output = t.get("MISSING");
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "secret not found: MISSING");
    assert_stderr_contains(&output, "ak ls");
}

#[test]
fn test_verbose_logs_to_stderr_only() {
    let t = Test::with_secrets(&[("KEY", "value")]);
    let output = t.ak(&["--verbose", "get", "--full", "KEY"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "value\n");
}

#[test]
fn test_backend_reports_plain() {
    let t = Test::new();
    let output = t.ak(&["backend"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "plain\n");
}

#[test]
fn test_short_flag_cluster_pairs_values() {
    let t = Test::with_secrets(&[("PAIRED", "v")]);
    assert_success(&t.save("dev", &["PAIRED"]));
    let out = t.dir.path().join("dev.json");

    t.cmd()
        .args(["export", "-pfo", "dev", "json", out.to_str().unwrap()])
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["PAIRED"], "v");
}

#[test]
fn test_missing_profile_is_reported() {
    let t = Test::new();
    t.cmd()
        .args(["export", "--profile", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
}
