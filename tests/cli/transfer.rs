//! Tests for `ak import/export/migrate`.

use crate::support::*;
use std::fs;

#[test]
fn test_import_known_keys_only() {
    let t = Test::with_secrets(&[("EXISTING", "keep")]);
    assert_success(&t.save("dev", &["EXISTING"]));

    let file = t.dir.path().join("F");
    fs::write(&file, "OPENAI_API_KEY=x\nMY_CUSTOM=y\nGITHUB_TOKEN=z\n").unwrap();

    let output = t.ak(&[
        "import",
        "--profile",
        "dev",
        "--format",
        "env",
        "--file",
        file.to_str().unwrap(),
        "--keys",
    ]);
    assert_success(&output);

    assert_eq!(stdout(&t.get("OPENAI_API_KEY")), "x\n");
    assert_eq!(stdout(&t.get("GITHUB_TOKEN")), "z\n");
    assert_exit_code(&t.get("MY_CUSTOM"), 1);

    let body = fs::read_to_string(t.path("profiles/dev.profile")).unwrap();
    assert_eq!(body, "EXISTING\nGITHUB_TOKEN\nOPENAI_API_KEY\n");
}

#[test]
fn test_import_env_edge_cases() {
    let t = Test::new();
    let file = t.dir.path().join("complex.env");
    fs::write(&file, SAMPLE_ENV_COMPLEX).unwrap();

    let output = t.ak(&["import", "--file", file.to_str().unwrap()]);
    assert_success(&output);

    assert_eq!(stdout(&t.get("SIMPLE")), "value\n");
    assert_eq!(stdout(&t.get("QUOTED")), "quoted value\n");
    assert_eq!(stdout(&t.get("SINGLE_QUOTED")), "single $literal\n");
    assert_eq!(stdout(&t.get("EXPORTED")), "from-shell\n");
    assert_eq!(stdout(&t.get("SPECIAL_CHARS")), "p@ssw0rd!#%\n");
    assert_exit_code(&t.get("EMPTY"), 1);

    let body = fs::read_to_string(t.path("profiles/default.profile")).unwrap();
    assert!(body.contains("SIMPLE\n"));
}

#[test]
fn test_import_json_guessed_from_extension() {
    let t = Test::new();
    let file = t.dir.path().join("secrets.json");
    fs::write(&file, r#"{"JSON_KEY": "from json", "PORT": 8080}"#).unwrap();

    let output = t.ak(&["import", "-p", "svc", "-i", file.to_str().unwrap()]);
    assert_success(&output);
    assert_eq!(stdout(&t.get("JSON_KEY")), "from json\n");
    assert_eq!(stdout(&t.get("PORT")), "8080\n");
}

#[test]
fn test_import_yaml_file() {
    let t = Test::new();
    let file = t.dir.path().join("secrets.yml");
    fs::write(
        &file,
        "# team keys\nQUOTED: 'it''s here'\nPLAIN: bare # note\nCERT: |\n  line one\n  line two\n",
    )
    .unwrap();

    assert_success(&t.ak(&["import", "-i", file.to_str().unwrap()]));
    assert_eq!(stdout(&t.get("QUOTED")), "it's here\n");
    assert_eq!(stdout(&t.get("PLAIN")), "bare\n");
    assert_eq!(stdout(&t.get("CERT")), "line one\nline two\n\n");
}

#[test]
fn test_import_malformed_json_changes_nothing() {
    let t = Test::with_secrets(&[("BEFORE", "1")]);
    let vault_before = fs::read(t.path("keys.env")).unwrap();

    let file = t.dir.path().join("bad.json");
    fs::write(&file, "{ not json").unwrap();
    assert_exit_code(&t.ak(&["import", "--file", file.to_str().unwrap()]), 1);

    assert_eq!(fs::read(t.path("keys.env")).unwrap(), vault_before);
}

#[test]
fn test_import_unreadable_profile_leaves_vault() {
    let t = Test::with_secrets(&[("BEFORE", "1")]);
    let vault_before = fs::read(t.path("keys.env")).unwrap();
    fs::create_dir_all(t.path("profiles/dev.profile")).unwrap();

    let file = t.dir.path().join("new.env");
    fs::write(&file, "NEW_KEY=x\n").unwrap();
    assert_exit_code(&t.ak(&["import", "-p", "dev", "-i", file.to_str().unwrap()]), 1);

    assert_eq!(fs::read(t.path("keys.env")).unwrap(), vault_before);
}

#[cfg(unix)]
#[test]
fn test_import_restores_vault_when_profile_write_fails() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::with_secrets(&[("BEFORE", "1")]);
    assert_success(&t.save("dev", &["BEFORE"]));
    let vault_before = fs::read(t.path("keys.env")).unwrap();
    let profile = t.path("profiles/dev.profile");
    fs::set_permissions(&profile, fs::Permissions::from_mode(0o400)).unwrap();
    if fs::OpenOptions::new().write(true).open(&profile).is_ok() {
        eprintln!("SKIPPED: permissions are not enforced for this user");
        return;
    }

    let file = t.dir.path().join("new.env");
    fs::write(&file, "NEW_KEY=x\n").unwrap();
    assert_exit_code(&t.ak(&["import", "-p", "dev", "-i", file.to_str().unwrap()]), 1);

    assert_eq!(fs::read(t.path("keys.env")).unwrap(), vault_before);
    assert_exit_code(&t.get("NEW_KEY"), 1);
}

#[test]
fn test_export_env_to_stdout() {
    let t = Test::with_secrets(&[("B_KEY", "two"), ("A_KEY", "one\nline")]);
    assert_success(&t.save("default", &["A_KEY", "B_KEY"]));

    let output = t.ak(&["export"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "A_KEY=\"one\\nline\"\nB_KEY=\"two\"\n");
}

#[test]
fn test_export_json() {
    let t = Test::with_secrets(&[("A_KEY", "one")]);
    assert_success(&t.save("dev", &["A_KEY"]));
    let output = t.ak(&["export", "--profile", "dev", "--format", "json"]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["A_KEY"], "one");
}

#[test]
fn test_export_to_file_is_private() {
    let t = Test::with_secrets(&[("A_KEY", "one")]);
    assert_success(&t.save("dev", &["A_KEY"]));

    let out = t.dir.path().join("dev.yaml");
    let output = t.ak(&["export", "-pfo", "dev", "yaml", out.to_str().unwrap()]);
    assert_success(&output);
    assert!(stdout(&output).is_empty());
    assert_eq!(fs::read_to_string(&out).unwrap(), "A_KEY: \"one\"\n");
    #[cfg(unix)]
    assert_mode(&out, 0o600);
}

#[test]
fn test_export_import_roundtrip() {
    let t = Test::with_secrets(&[
        ("PLAIN", "simple"),
        ("QUOTES", "say \"hi\""),
        ("NEWLINE", "a\nb"),
        ("BACKSLASH", "c:\\path"),
    ]);
    assert_success(&t.save("src", &[]));

    let file = t.dir.path().join("dump.env");
    assert_success(&t.ak(&["export", "-p", "src", "-o", file.to_str().unwrap()]));

    let other = Test::new();
    assert_success(&other.ak(&["import", "-p", "dst", "-i", file.to_str().unwrap()]));
    for (name, value) in [
        ("PLAIN", "simple"),
        ("QUOTES", "say \"hi\""),
        ("NEWLINE", "a\nb"),
        ("BACKSLASH", "c:\\path"),
    ] {
        assert_eq!(stdout(&other.get(name)), format!("{}\n", value));
    }
}

#[test]
fn test_export_unknown_profile_fails() {
    let t = Test::new();
    assert_exit_code(&t.ak(&["export", "--profile", "ghost"]), 1);
}

#[test]
fn test_migrate_exports() {
    let t = Test::new();
    let file = t.dir.path().join(".zshrc");
    fs::write(&file, SAMPLE_EXPORTS).unwrap();

    let output = t.ak(&["migrate", "exports", file.to_str().unwrap()]);
    assert_success(&output);

    assert_eq!(stdout(&t.get("GITHUB_TOKEN")), "ghp_exampletoken\n");
    assert_eq!(stdout(&t.get("STRIPE_SECRET_KEY")), "sk_live_example\n");
    assert_exit_code(&t.get("PLACEHOLDER"), 1);
    assert_exit_code(&t.get("BLANK"), 1);

    let body = fs::read_to_string(t.path("profiles/default.profile")).unwrap();
    assert_eq!(body, "GITHUB_TOKEN\nSTRIPE_SECRET_KEY\n");
}
