//! Error types for ak.
//!
//! One top-level [`Error`] wraps a small enum per domain so callers can
//! match on the failure family without string inspection.

use std::path::Path;

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A required external command other than gpg is unavailable.
    #[error("{tool} not found")]
    ToolMissing { tool: &'static str, hint: &'static str },

    /// Malformed or missing arguments.
    #[error("{0}")]
    Usage(String),

    /// Filesystem failure on a path ak owns.
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    IoRaw(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Input validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("secret name cannot be empty")]
    EmptyKey,

    #[error("invalid secret name '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid profile name '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("value for {0} cannot be empty")]
    EmptyValue(String),

    #[error("insecure permissions on {path}: expected {expected}, found {actual}")]
    InvalidPermissions {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Lookup failures for secrets and profiles.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),
}

/// Encryption backend failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("{tool} not found")]
    ToolMissing { tool: &'static str, hint: &'static str },

    #[error("passphrase required: no terminal available for the prompt")]
    PassphraseRequired,
}

/// Provider catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("{0} is a built-in service and cannot be removed")]
    BuiltIn(String),

    #[error("invalid service catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to write service catalog: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Error {
    /// Process exit code for this failure. Every error exits 1; 2 is
    /// reserved for `ak test` reporting failed probes.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// A follow-up suggestion for the human error line, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Cipher(CipherError::ToolMissing { hint, .. }) => Some(hint),
            Error::ToolMissing { hint, .. } => Some(hint),
            Error::Cipher(CipherError::PassphraseRequired) => {
                Some("set AK_PASSPHRASE for non-interactive use")
            }
            Error::Cipher(CipherError::DecryptionFailed(_)) => {
                Some("check the passphrase; the vault was not modified")
            }
            Error::Secret(SecretError::NotFound(_)) => Some("run: ak ls"),
            Error::Secret(SecretError::ProfileNotFound(_)) => Some("run: ak profiles"),
            Error::Catalog(CatalogError::UnknownService(_)) => Some("run: ak service ls"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach the offending path to an I/O error.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
