//! Projection of profile values into shell scripts and export formats.
//!
//! The CLI cannot change its parent shell's environment. `load` prints an
//! `export` script that the installed wrapper function evaluates instead.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::error::Error;

/// Escape a value for a double-quoted shell/env string.
///
/// `\` and `"` get a backslash; a line feed becomes the two characters `\n`.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`] for values read back from env/yaml files.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// `export NAME="VALUE"` lines, in the order given.
pub fn export_script(pairs: &[(String, Zeroizing<String>)]) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::new());
    for (name, value) in pairs {
        out.push_str(&format!("export {}=\"{}\"\n", name, escape(value)));
    }
    out
}

/// `unset NAME` lines for the sorted, deduplicated set of names.
pub fn unset_script<S: AsRef<str>>(names: &[S]) -> String {
    let unique: BTreeSet<&str> = names.iter().map(|n| n.as_ref()).collect();
    unique.iter().map(|n| format!("unset {}\n", n)).collect()
}

/// Export/import file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Env,
    Dotenv,
    Json,
    Yaml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Env => "env",
            Format::Dotenv => "dotenv",
            Format::Json => "json",
            Format::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "env" => Ok(Format::Env),
            "dotenv" | ".env" => Ok(Format::Dotenv),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(Error::Usage(format!(
                "unknown format '{}': expected env, dotenv, json or yaml",
                other
            ))),
        }
    }
}

/// Render resolved values in an export format.
pub fn render(format: Format, pairs: &[(String, Zeroizing<String>)]) -> crate::error::Result<Zeroizing<String>> {
    let mut out = Zeroizing::new(String::new());
    match format {
        Format::Env | Format::Dotenv => {
            for (name, value) in pairs {
                out.push_str(&format!("{}=\"{}\"\n", name, escape(value)));
            }
        }
        Format::Yaml => {
            for (name, value) in pairs {
                out.push_str(&format!("{}: \"{}\"\n", name, escape(value)));
            }
        }
        Format::Json => {
            let object: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.to_string())))
                .collect();
            out.push_str(&serde_json::to_string_pretty(&object)?);
            out.push('\n');
        }
    }
    Ok(out)
}
