//! Test support utilities for ak integration tests.
//!
//! Provides isolated environments and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own working directory and home directory. No
/// process-global state is mutated; child processes get their environment
/// and `.current_dir()` explicitly so tests can run in parallel.
pub struct Test {
    /// Working directory for commands
    pub dir: TempDir,
    /// Temporary home directory; the config root lives under it
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        Self { dir, home }
    }

    /// Create a test environment with secrets stored.
    pub fn with_secrets(secrets: &[(&str, &str)]) -> Self {
        let t = Self::new();
        for (k, v) in secrets {
            let output = t.add(k, v);
            assert!(
                output.status.success(),
                "Failed to add secret {}: {}",
                k,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    /// `$XDG_CONFIG_HOME` handed to every command.
    pub fn xdg(&self) -> PathBuf {
        self.home.path().join(".config")
    }

    /// The ak config root.
    pub fn root(&self) -> PathBuf {
        self.xdg().join("ak")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }
}
