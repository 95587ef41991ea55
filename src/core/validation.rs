//! Input validation and value masking.

use crate::error::{Result, ValidationError};

/// Validate a secret name.
///
/// Secret names are environment variable names: ASCII letters, digits and
/// underscore, not starting with a digit.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey.into());
    }

    if let Some(first) = key.chars().next() {
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: "must begin with a letter or underscore".to_string(),
            }
            .into());
        }
    }

    for (i, ch) in key.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "invalid character '{}' at position {}. Only A-Z, 0-9, and underscore are allowed",
                    ch,
                    i + 1
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Check a secret name without building an error.
pub fn is_valid_key(key: &str) -> bool {
    validate_key(key).is_ok()
}

/// Validate a profile name: `[A-Za-z0-9_-]+`.
pub fn validate_profile(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::InvalidProfile {
            name: String::new(),
            reason: "cannot be empty".to_string(),
        }
        .into());
    }

    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(ValidationError::InvalidProfile {
            name: name.to_string(),
            reason: format!("invalid character '{}'", ch),
        }
        .into());
    }

    Ok(())
}

/// Secret values set interactively cannot be empty.
pub fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ValidationError::EmptyValue(key.to_string()).into());
    }
    Ok(())
}

/// Check that a file has the expected permission bits (Unix only).
#[cfg(unix)]
pub fn validate_file_permissions(path: &std::path::Path, expected_mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let actual_mode = metadata.permissions().mode() & 0o777;

    if actual_mode != expected_mode {
        return Err(ValidationError::InvalidPermissions {
            path: path.display().to_string(),
            expected: format!("{:o}", expected_mode),
            actual: format!("{:o}", actual_mode),
        }
        .into());
    }

    Ok(())
}

/// Mask a value for display.
///
/// Up to 12 characters become `*` of the same length; longer values keep the
/// first 8 and last 4 characters around `***`.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => "(empty)".to_string(),
        n if n <= 12 => "*".repeat(n),
        n => {
            let head: String = chars[..8].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{}***{}", head, tail)
        }
    }
}
