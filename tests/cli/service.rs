//! Tests for `ak service` and the offline parts of `ak test`.

use crate::support::*;
use std::fs;

#[test]
fn test_service_ls_includes_builtins() {
    let t = Test::new();
    let output = t.ak(&["service", "ls"]);
    assert_success(&output);
    assert_stdout_contains(&output, "openai");
    assert_stdout_contains(&output, "GITHUB_TOKEN");
}

#[test]
fn test_service_show_json() {
    let t = Test::new();
    let output = t.ak(&["service", "show", "anthropic", "--json"]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["keyName"], "ANTHROPIC_API_KEY");
    assert_eq!(json["authParameter"], "x-api-key");
    assert_eq!(json["builtIn"], true);
}

#[test]
fn test_service_add_show_rm() {
    let t = Test::new();
    let output = t.ak(&[
        "service",
        "add",
        "internal",
        "--key",
        "INTERNAL_TOKEN",
        "--endpoint",
        "https://api.internal.example/v1/me",
        "--header",
        "X-Team: core",
    ]);
    assert_success(&output);
    assert!(t.path("services.toml").exists());

    let output = t.ak(&["service", "show", "internal", "--json"]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["keyName"], "INTERNAL_TOKEN");
    assert_eq!(json["authPrefix"], "Bearer ");
    assert_eq!(json["testable"], true);
    assert_eq!(json["builtIn"], false);

    assert_success(&t.ak(&["service", "rm", "internal"]));
    assert_exit_code(&t.ak(&["service", "show", "internal"]), 1);
}

#[test]
fn test_user_service_overrides_builtin() {
    let t = Test::new();
    assert_success(&t.ak(&["service", "add", "github", "--key", "GH_PAT"]));

    let output = t.ak(&["service", "show", "github", "--json"]);
    assert_eq!(stdout_json(&output)["keyName"], "GH_PAT");

    assert_success(&t.ak(&["service", "rm", "github"]));
    let output = t.ak(&["service", "show", "github", "--json"]);
    assert_eq!(stdout_json(&output)["keyName"], "GITHUB_TOKEN");
}

#[test]
fn test_builtin_cannot_be_removed() {
    let t = Test::new();
    assert_exit_code(&t.ak(&["service", "rm", "openai"]), 1);
}

#[test]
fn test_import_keys_honors_user_services() {
    let t = Test::new();
    assert_success(&t.ak(&["service", "add", "internal", "--key", "INTERNAL_TOKEN"]));

    let file = t.dir.path().join("in.env");
    fs::write(&file, "INTERNAL_TOKEN=abc\nRANDOM_THING=def\n").unwrap();
    assert_success(&t.ak(&["import", "--keys", "--file", file.to_str().unwrap()]));

    assert_eq!(stdout(&t.get("INTERNAL_TOKEN")), "abc\n");
    assert_exit_code(&t.get("RANDOM_THING"), 1);
}

#[test]
fn test_untestable_service_is_skipped() {
    let t = Test::with_secrets(&[("MONGODB_URI", "mongodb://localhost")]);
    let output = t.ak(&["test", "mongodb", "--json"]);
    assert_exit_code(&output, 0);
    let json = stdout_json(&output);
    assert_eq!(json[0]["service"], "mongodb");
    assert_eq!(json[0]["skipped"], true);
    assert_eq!(json[0]["ok"], false);
}

#[test]
fn test_unknown_service_fails() {
    let t = Test::new();
    let output = t.ak(&["test", "nonexistent-provider"]);
    assert_exit_code(&output, 1);
}

#[test]
fn test_unreachable_endpoint_exits_two() {
    let t = Test::with_secrets(&[("LOCAL_TOKEN", "secret-token-value")]);
    assert_success(&t.ak(&[
        "service",
        "add",
        "local",
        "--key",
        "LOCAL_TOKEN",
        "--endpoint",
        "http://127.0.0.1:9/",
    ]));

    let output = t.ak(&["test", "local", "--json"]);
    assert_exit_code(&output, 2);
    let json = stdout_json(&output);
    assert_eq!(json[0]["ok"], false);
    assert_eq!(json[0]["skipped"], false);
    let command = json[0]["redactedCommand"].as_str().unwrap();
    assert!(command.contains("****"));
    assert!(!stdout(&output).contains("secret-token-value"));
}
