//! Tests for `ak save/load/unload/env/profiles` and directory persistence.

use crate::support::*;
use std::fs;

#[test]
fn test_default_profile_exists_on_first_use() {
    let t = Test::new();
    let output = t.ak(&["profiles"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "default\n");
    assert!(t.path("profiles/default.profile").exists());
}

#[test]
fn test_save_then_load_prints_sorted_exports() {
    let t = Test::with_secrets(&[
        ("OPENAI_API_KEY", "sk-open"),
        ("ANTHROPIC_API_KEY", "sk-ant \"quoted\" back\\slash"),
    ]);
    assert_success(&t.save("dev", &["OPENAI_API_KEY", "ANTHROPIC_API_KEY"]));

    let output = t.load("dev");
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "export ANTHROPIC_API_KEY=\"sk-ant \\\"quoted\\\" back\\\\slash\"\n\
         export OPENAI_API_KEY=\"sk-open\"\n"
    );
}

#[test]
fn test_load_with_unresolved_names_is_empty() {
    let t = Test::new();
    fs::create_dir_all(t.path("profiles")).unwrap();
    fs::write(t.path("profiles/dev.profile"), "MISSING_ONE\nMISSING_TWO\n").unwrap();

    let output = t.load("dev");
    assert_exit_code(&output, 0);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_load_creates_missing_profile() {
    let t = Test::new();
    let output = t.load("fresh");
    assert_success(&output);
    assert!(stdout(&output).is_empty());
    assert!(t.path("profiles/fresh.profile").exists());
}

#[test]
fn test_save_without_names_takes_whole_vault() {
    let t = Test::with_secrets(STANDARD_SECRETS);
    assert_success(&t.save("all", &[]));
    let body = fs::read_to_string(t.path("profiles/all.profile")).unwrap();
    assert_eq!(body.lines().count(), STANDARD_SECRETS.len());
}

#[test]
fn test_save_skips_unknown_names() {
    let t = Test::with_secrets(&[("REAL", "1")]);
    let output = t.save("dev", &["REAL", "IMAGINARY"]);
    assert_success(&output);
    assert_stderr_contains(&output, "IMAGINARY");
    let body = fs::read_to_string(t.path("profiles/dev.profile")).unwrap();
    assert_eq!(body, "REAL\n");
}

#[test]
fn test_invalid_profile_name_rejected() {
    let t = Test::with_secrets(&[("REAL", "1")]);
    assert_exit_code(&t.save("../escape", &["REAL"]), 1);
    assert_exit_code(&t.load("has space"), 1);
}

#[test]
fn test_profile_local_value_overrides_vault() {
    let t = Test::with_secrets(&[("API_URL", "https://prod")]);
    assert_success(&t.ak(&["add", "--profile", "dev", "--local", "API_URL", "http://localhost"]));

    let output = t.load("dev");
    assert_eq!(stdout(&output), "export API_URL=\"http://localhost\"\n");
    assert_eq!(stdout(&t.get("API_URL")), "https://prod\n");
    assert!(t.path("profiles/dev.keys").exists());
}

#[test]
fn test_add_with_profile_merges_membership() {
    let t = Test::new();
    assert_success(&t.add_to("dev", "B_KEY", "b"));
    assert_success(&t.add_to("dev", "A_KEY", "a"));
    let body = fs::read_to_string(t.path("profiles/dev.profile")).unwrap();
    assert_eq!(body, "A_KEY\nB_KEY\n");
}

#[test]
fn test_env_matches_load() {
    let t = Test::with_secrets(&[("ONLY", "value")]);
    assert_success(&t.save("default", &["ONLY"]));
    let output = t.ak(&["env"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "export ONLY=\"value\"\n");
}

#[test]
fn test_unload_prints_unsets() {
    let t = Test::with_secrets(&[("ONE", "1"), ("TWO", "2")]);
    assert_success(&t.save("a", &["ONE", "TWO"]));
    assert_success(&t.save("b", &["TWO"]));

    let output = t.ak(&["unload", "a", "b"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "unset ONE\nunset TWO\n");
}

#[test]
fn test_unload_is_audited() {
    let t = Test::with_secrets(&[("ONE", "1"), ("TWO", "2")]);
    assert_success(&t.save("dev", &["ONE", "TWO"]));
    assert_success(&t.ak(&["unload", "dev"]));

    let log = fs::read_to_string(t.path("audit.log")).unwrap();
    let line = log.lines().last().unwrap();
    assert!(line.contains("action=unload"));
    assert!(line.contains("count=2"));
}

#[test]
fn test_load_json_still_prints_script() {
    let t = Test::with_secrets(&[("ONLY", "value")]);
    assert_success(&t.save("dev", &["ONLY"]));
    let output = t.ak(&["load", "dev", "-j"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "export ONLY=\"value\"\n");
}

#[test]
fn test_persist_mapping_roundtrip() {
    let t = Test::with_secrets(&[("ONLY", "value")]);
    assert_success(&t.save("dev", &["ONLY"]));

    let output = t.ak(&["load", "dev", "--persist"]);
    assert_success(&output);

    let maps: Vec<_> = fs::read_dir(t.path("persist"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|x| x == "map"))
        .collect();
    assert_eq!(maps.len(), 1);
    let stem = maps[0].file_stem().unwrap().to_string_lossy().to_string();
    assert_eq!(stem.len(), 16);
    assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));

    let physical = t.dir.path().canonicalize().unwrap();
    let body = fs::read_to_string(&maps[0]).unwrap();
    assert_eq!(body, format!("{}\tdev\n", physical.display()));

    let output = t.ak(&["unload", "dev", "--persist"]);
    assert_success(&output);
    assert!(!maps[0].exists());
}

#[test]
fn test_rm_profile_deletes_files() {
    let t = Test::with_secrets(&[("ONLY", "value")]);
    assert_success(&t.ak(&["add", "-p", "dev", "--local", "LOCAL_ONLY", "x"]));
    assert_success(&t.ak(&["rm", "--profile", "dev"]));
    assert!(!t.path("profiles/dev.profile").exists());
    assert!(!t.path("profiles/dev.keys").exists());
    assert_exit_code(&t.ak(&["rm", "--profile", "dev"]), 1);
}

#[test]
fn test_rm_profile_drops_directory_mappings() {
    let t = Test::with_secrets(&[("ONLY", "value")]);
    assert_success(&t.save("dev", &["ONLY"]));
    assert_success(&t.save("prod", &["ONLY"]));
    assert_success(&t.ak(&["load", "dev", "--persist"]));
    assert_success(&t.ak(&["load", "prod", "--persist"]));

    let output = t.ak(&["rm", "--profile", "dev", "--json"]);
    assert_success(&output);
    let physical = t.dir.path().canonicalize().unwrap();
    assert_eq!(stdout_json(&output)["unmapped"][0], physical.to_str().unwrap());

    let maps: Vec<_> = fs::read_dir(t.path("persist"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|x| x == "map"))
        .collect();
    assert_eq!(maps.len(), 1);
    assert_eq!(
        fs::read_to_string(&maps[0]).unwrap(),
        format!("{}\tprod\n", physical.display())
    );
    assert!(!t.path("persist/dev.bundle").exists());
}
