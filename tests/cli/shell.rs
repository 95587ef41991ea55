//! Tests for `ak install-shell`, `ak uninstall` and `ak guard`.

use crate::skip_without_git;
use crate::{skip_without_bash, skip_without_gpg};
use crate::support::*;
use std::fs;
use std::process::Command;

#[test]
fn test_install_writes_init_and_rc_line() {
    let t = Test::new();
    let output = t.ak(&["install-shell"]);
    assert_success(&output);

    let init = t.path("shell-init.sh");
    assert!(init.exists());
    let script = fs::read_to_string(&init).unwrap();
    assert!(script.contains("ak()"));

    let rc = fs::read_to_string(t.home.path().join(".bashrc")).unwrap();
    assert!(rc.contains("# Added by ak installer"));
    assert!(rc.contains(&format!("source \"{}\"", init.display())));
}

#[test]
fn test_install_is_idempotent() {
    let t = Test::new();
    assert_success(&t.ak(&["install-shell"]));
    assert_success(&t.ak(&["install-shell"]));

    let rc = fs::read_to_string(t.home.path().join(".bashrc")).unwrap();
    assert_eq!(rc.matches("# Added by ak installer").count(), 1);
}

#[test]
fn test_uninstall_keeps_other_lines_and_secrets() {
    let t = Test::with_secrets(&[("KEEP_ME", "v")]);
    let bashrc = t.home.path().join(".bashrc");
    fs::write(&bashrc, "alias ll='ls -l'\n").unwrap();

    assert_success(&t.ak(&["install-shell"]));
    assert_success(&t.ak(&["uninstall"]));

    assert_eq!(fs::read_to_string(&bashrc).unwrap(), "alias ll='ls -l'\n");
    assert!(!t.path("shell-init.sh").exists());
    assert_eq!(stdout(&t.get("KEEP_ME")), "v\n");
}

#[test]
fn test_fish_gets_its_own_script() {
    let t = Test::new();
    let output = t.cmd().arg("install-shell").env("SHELL", "/usr/bin/fish").output().unwrap();
    assert_success(&output);
    assert!(t.path("shell-init.fish").exists());
    let config = fs::read_to_string(t.home.path().join(".config/fish/config.fish")).unwrap();
    assert!(config.contains("shell-init.fish"));
}

#[test]
fn test_doctor_reports_shell_state() {
    let t = Test::new();
    let output = t.ak(&["doctor", "--json"]);
    assert_success(&output);
    assert_eq!(stdout_json(&output)["shellInstalled"], false);

    assert_success(&t.ak(&["install-shell"]));
    let output = t.ak(&["doctor", "--json"]);
    let json = stdout_json(&output);
    assert_eq!(json["shellInstalled"], true);
    assert_eq!(json["backend"], "plain");
}

/// Run `script` in a clean non-interactive bash with the test's HOME.
fn bash(t: &Test, script: &str) -> std::process::Output {
    Command::new("bash")
        .args(["--noprofile", "--norc", "-c", script])
        .current_dir(t.home.path())
        .env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .env("HOME", t.home.path())
        .env("USER", "tester")
        .env("GNUPGHOME", t.home.path().join(".gnupg"))
        .env("INIT", t.path("shell-init.sh"))
        .env("WORK", t.dir.path())
        .output()
        .unwrap()
}

#[test]
fn test_shell_hash_matches_mapping_file() {
    skip_without_bash!();
    let t = Test::with_secrets(&[("ONLY", "value")]);
    assert_success(&t.save("dev", &["ONLY"]));
    assert_success(&t.ak(&["install-shell"]));
    assert_success(&t.ak(&["load", "dev", "--persist"]));

    let output = bash(&t, r#"source "$INIT"; __ak_hash "$(cd "$WORK" && pwd -P)""#);
    assert_success(&output);
    let hash = stdout(&output).trim().to_string();
    assert_eq!(hash.len(), 16);
    assert!(t.path("persist").join(format!("{}.map", hash)).exists());
}

#[test]
fn test_shell_hook_autoloads_persisted_profile() {
    skip_without_bash!();
    skip_without_gpg!();
    let t = Test::new();
    let output = t
        .gpg_cmd("pw")
        .args(["add", "-p", "dev", "AUTO_LOADED", "from-bundle"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_success(&t.gpg_cmd("pw").arg("install-shell").output().unwrap());
    assert_success(
        &t.gpg_cmd("pw")
            .args(["load", "dev", "--persist"])
            .output()
            .unwrap(),
    );
    assert!(t.path("persist/dev.bundle").exists());

    let output = bash(
        &t,
        r#"source "$INIT"; printf 'before=%s\n' "${AUTO_LOADED:-}"; cd "$WORK" && __ak_autoload; printf 'after=%s\n' "${AUTO_LOADED:-}""#,
    );
    assert_success(&output);
    assert_eq!(stdout(&output), "before=\nafter=from-bundle\n");
}

fn git_init(t: &Test) {
    let status = Command::new("git")
        .args(["init", "-q"])
        .current_dir(t.dir.path())
        .env("HOME", t.home.path())
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn test_guard_enable_disable() {
    skip_without_git!();
    let t = Test::new();
    git_init(&t);

    assert_success(&t.ak(&["guard", "enable"]));
    let hook = t.dir.path().join(".git/hooks/pre-commit");
    let body = fs::read_to_string(&hook).unwrap();
    assert!(body.contains("# ak-guard"));
    #[cfg(unix)]
    assert_mode(&hook, 0o755);

    assert_success(&t.ak(&["guard", "disable"]));
    assert!(!hook.exists());
}

#[test]
fn test_guard_leaves_foreign_hook() {
    skip_without_git!();
    let t = Test::new();
    git_init(&t);
    let hook = t.dir.path().join(".git/hooks/pre-commit");
    fs::create_dir_all(hook.parent().unwrap()).unwrap();
    fs::write(&hook, "#!/bin/sh\nexit 0\n").unwrap();

    assert_exit_code(&t.ak(&["guard", "enable"]), 1);
    let output = t.ak(&["guard", "disable"]);
    assert_success(&output);
    assert_stderr_contains(&output, "not installed by ak");
    assert_eq!(fs::read_to_string(&hook).unwrap(), "#!/bin/sh\nexit 0\n");
}

#[test]
fn test_guard_outside_repository_fails() {
    skip_without_git!();
    let t = Test::new();
    let output = t
        .cmd()
        .args(["guard", "enable"])
        .env("GIT_CEILING_DIRECTORIES", t.dir.path().parent().unwrap())
        .output()
        .unwrap();
    assert_exit_code(&output, 1);
}
