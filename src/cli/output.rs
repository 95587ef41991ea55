//! Shared CLI output helpers.
//!
//! stdout carries data only: values, listings, JSON documents and the
//! export/unset scripts the shell wrapper evaluates. Everything addressed
//! to the human goes to stderr.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success, checkmarks
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: paths, commands, keys, hints
//! - Bold: headers, important values
//! - Dimmed: secondary info

use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

const RULE_WIDTH: usize = 56;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a success message with checkmark (green).
///
/// Example: `✓ stored OPENAI_API_KEY`
pub fn success(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "✓".green(), msg);
    } else {
        eprintln!("✓ {}", msg);
    }
}

/// Print an error message (red).
///
/// Example: `✗ secret not found: FOO`
pub fn error(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "✗".red(), msg);
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Print a warning message (yellow).
pub fn warn(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "⚠".yellow(), msg);
    } else {
        eprintln!("⚠ {}", msg);
    }
}

/// Print a hint message (cyan).
///
/// Example: `→ run: ak ls`
pub fn hint(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "→".cyan(), msg.cyan());
    } else {
        eprintln!("→ {}", msg);
    }
}

/// Print a bold section header with a separator line.
pub fn section(title: &str) {
    println!();
    if colors_enabled() {
        println!("{}", title.bold());
        println!("{}", "─".repeat(RULE_WIDTH).dimmed());
    } else {
        println!("{}", title);
        println!("{}", "─".repeat(RULE_WIDTH));
    }
}

/// Print a key-value pair (label dimmed, value bold).
///
/// Example: `  backend      gpg`
pub fn kv(label: &str, value: impl Display) {
    if colors_enabled() {
        println!("  {:<12} {}", label.dimmed(), value.to_string().bold());
    } else {
        println!("  {:<12} {}", label, value);
    }
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    if colors_enabled() {
        eprintln!("{}", msg.dimmed());
    } else {
        eprintln!("{}", msg);
    }
}

/// Format a path string in cyan.
pub fn path(p: impl Display) -> String {
    if colors_enabled() {
        p.to_string().cyan().to_string()
    } else {
        p.to_string()
    }
}

/// Format a command string in green.
pub fn cmd(c: &str) -> String {
    if colors_enabled() {
        c.green().to_string()
    } else {
        c.to_string()
    }
}

/// Format a key name in cyan.
pub fn key(k: &str) -> String {
    if colors_enabled() {
        k.cyan().to_string()
    } else {
        k.to_string()
    }
}

/// Write raw data to stdout without decoration.
pub fn raw(text: &str) {
    print!("{}", text);
}

/// Print a JSON document on stdout.
pub fn json<T: Serialize + ?Sized>(value: &T) -> crate::error::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print `{"ok":false,"error":...}` on stdout.
pub fn json_error(message: &str) {
    println!("{}", serde_json::json!({ "ok": false, "error": message }));
}
