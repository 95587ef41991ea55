//! Tests for the gpg backend. Skipped when gpg is not installed.

use crate::skip_without_gpg;
use crate::support::*;
use std::fs;

#[test]
fn test_gpg_vault_roundtrip() {
    skip_without_gpg!();
    let t = Test::new();

    let output = t
        .gpg_cmd("correct horse")
        .args(["add", "OPENAI_API_KEY", "sk-encrypted"])
        .output()
        .unwrap();
    assert_success(&output);

    let vault = t.path("keys.env.gpg");
    assert!(vault.exists());
    assert!(!t.path("keys.env").exists());
    let raw = fs::read(&vault).unwrap();
    assert!(!String::from_utf8_lossy(&raw).contains("sk-encrypted"));
    #[cfg(unix)]
    assert_mode(&vault, 0o600);

    let output = t
        .gpg_cmd("correct horse")
        .args(["get", "--full", "OPENAI_API_KEY"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "sk-encrypted\n");

    let output = t.gpg_cmd("correct horse").arg("backend").output().unwrap();
    assert_eq!(stdout(&output), "gpg\n");
}

#[test]
fn test_wrong_passphrase_leaves_vault_untouched() {
    skip_without_gpg!();
    let t = Test::new();
    assert_success(
        &t.gpg_cmd("right")
            .args(["add", "TOKEN", "value"])
            .output()
            .unwrap(),
    );
    let vault = t.path("keys.env.gpg");
    let before = fs::read(&vault).unwrap();

    let output = t
        .gpg_cmd("wrong")
        .args(["add", "OTHER", "x"])
        .output()
        .unwrap();
    assert_exit_code(&output, 1);
    assert!(stdout(&output).is_empty());
    assert_eq!(fs::read(&vault).unwrap(), before);

    let output = t
        .gpg_cmd("right")
        .args(["get", "--full", "TOKEN"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "value\n");
}

#[test]
fn test_gpg_leaves_no_passphrase_files() {
    skip_without_gpg!();
    let t = Test::new();
    assert_success(&t.gpg_cmd("pw").args(["add", "A_KEY", "a"]).output().unwrap());
    let _ = t.gpg_cmd("bad").args(["ls"]).output().unwrap();

    let leftovers: Vec<_> = fs::read_dir(t.root())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with(".ak-pass-") || name.starts_with(".tmp.ak.")
        })
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_profile_overrides_encrypted() {
    skip_without_gpg!();
    let t = Test::new();
    let output = t
        .gpg_cmd("pw")
        .args(["add", "--profile", "dev", "--local", "LOCAL_KEY", "local-secret"])
        .output()
        .unwrap();
    assert_success(&output);

    let keys = t.path("profiles/dev.keys.gpg");
    assert!(keys.exists());
    assert!(!String::from_utf8_lossy(&fs::read(&keys).unwrap()).contains("local-secret"));

    let output = t.gpg_cmd("pw").args(["load", "dev"]).output().unwrap();
    assert_eq!(stdout(&output), "export LOCAL_KEY=\"local-secret\"\n");
}

#[test]
fn test_persist_writes_encrypted_bundle() {
    skip_without_gpg!();
    let t = Test::new();
    assert_success(&t.gpg_cmd("pw").args(["add", "-p", "dev", "BUNDLED", "v"]).output().unwrap());

    let output = t
        .gpg_cmd("pw")
        .args(["load", "dev", "--persist"])
        .output()
        .unwrap();
    assert_success(&output);

    let bundle = t.path("persist/dev.bundle");
    assert!(bundle.exists());
    assert!(!String::from_utf8_lossy(&fs::read(&bundle).unwrap()).contains("BUNDLED=\"v\""));
    #[cfg(unix)]
    assert_mode(&bundle, 0o600);
}
