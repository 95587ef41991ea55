//! Parsers for `ak import` and `ak migrate`.

use tracing::{debug, warn};

use crate::core::projector::{unescape, Format};
use crate::core::validation::is_valid_key;
use crate::error::{Error, Result};

/// Lines that look like shell code rather than assignments.
const SHELL_CONSTRUCTS: &[&str] = &["alias ", "function ", "if ", "case ", "for ", "while "];

/// Parse `text` in `format` into name/value pairs, file order preserved.
pub fn parse(format: Format, text: &str) -> Result<Vec<(String, String)>> {
    match format {
        Format::Env | Format::Dotenv => Ok(parse_env(text)),
        Format::Yaml => parse_yaml(text),
        Format::Json => parse_json(text),
    }
}

/// `.env` / shell-export style.
///
/// Comments, blank lines, shell constructs and invalid names are skipped.
/// A leading `export ` is stripped. Double-quoted values are unescaped;
/// single-quoted values are taken literally.
pub fn parse_env(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if SHELL_CONSTRUCTS.iter().any(|p| line.starts_with(p))
            || line.contains("[[")
            || line.contains("$(")
        {
            debug!("skipping shell construct");
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !is_valid_key(key) {
            continue;
        }
        out.push((key.to_string(), unquote(value)));
    }
    out
}

/// A flat YAML mapping. Scalars are stringified; nested values are skipped
/// with a warning.
pub fn parse_yaml(text: &str) -> Result<Vec<(String, String)>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
    let mapping = match doc {
        serde_yaml::Value::Null => return Ok(Vec::new()),
        serde_yaml::Value::Mapping(m) => m,
        _ => {
            return Err(Error::Usage(
                "YAML import expects a top-level mapping".to_string(),
            ))
        }
    };

    let mut out = Vec::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str().map(str::to_string) else {
            continue;
        };
        if !is_valid_key(&key) {
            continue;
        }
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Null => String::new(),
            _ => {
                warn!(key = %key, "skipping non-scalar YAML value");
                continue;
            }
        };
        out.push((key, value));
    }
    Ok(out)
}

/// A JSON object; strings are taken as-is, numbers and booleans stringified.
pub fn parse_json(text: &str) -> Result<Vec<(String, String)>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::Usage("JSON import expects a top-level object".to_string()))?;

    let mut out = Vec::new();
    for (key, value) in object {
        if !is_valid_key(key) {
            continue;
        }
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        out.push((key.clone(), value));
    }
    Ok(out)
}

fn unquote(value: &str) -> String {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        return unescape(&v[1..v.len() - 1]);
    }
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        return v[1..v.len() - 1].to_string();
    }
    v.to_string()
}
