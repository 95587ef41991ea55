//! Tests for `ak run`.

use crate::support::*;

#[cfg(unix)]
#[test]
fn test_run_injects_profile_values() {
    let t = Test::with_secrets(&[("DATABASE_URL", "postgres://localhost/db"), ("OTHER", "x")]);
    assert_success(&t.save("dev", &["DATABASE_URL"]));

    let output = t.run("dev", &["sh", "-c", "echo \"$DATABASE_URL|${OTHER:-unset}\""]);
    assert_success(&output);
    assert_eq!(stdout(&output), "postgres://localhost/db|unset\n");
}

#[cfg(unix)]
#[test]
fn test_run_passes_exit_code_through() {
    let t = Test::new();
    let output = t.run("default", &["sh", "-c", "exit 3"]);
    assert_exit_code(&output, 3);
}

#[cfg(unix)]
#[test]
fn test_run_leaves_child_flags_alone() {
    let t = Test::new();
    let output = t.run("default", &["sh", "-c", "echo \"$@\"", "sh", "-pj", "--json"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "-pj --json\n");
}

#[test]
fn test_run_missing_command_fails() {
    let t = Test::new();
    let output = t.ak(&["run", "--profile", "default"]);
    assert_exit_code(&output, 1);
}

#[test]
fn test_run_unknown_program_fails() {
    let t = Test::new();
    let output = t.run("default", &["definitely-not-a-real-program-ak"]);
    assert_exit_code(&output, 1);
}

#[test]
fn test_run_unknown_profile_fails() {
    let t = Test::new();
    let output = t.run("ghost", &["true"]);
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "ghost");
}
