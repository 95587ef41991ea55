//! At-rest encryption backends.
//!
//! The backend is picked once per process from [`Config`]:
//!
//! | Backend    | When                                         |
//! |------------|----------------------------------------------|
//! | `GpgEnv`   | gpg installed, `AK_PASSPHRASE` set            |
//! | `GpgPrompt`| gpg installed, passphrase asked on a terminal |
//! | `Plain`    | `AK_DISABLE_GPG` set                          |
//!
//! A missing gpg without the explicit opt-out selects nothing; vault
//! access then fails instead of silently writing plaintext.

pub mod gpg;
pub mod passfile;

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::core::config::Config;
use crate::error::CipherError;

/// Closed set of vault encryption strategies.
pub enum Backend {
    /// gpg with a passphrase prompted on the terminal.
    GpgPrompt { gpg: PathBuf },
    /// gpg with the passphrase taken from the environment.
    GpgEnv {
        gpg: PathBuf,
        passphrase: Zeroizing<String>,
    },
    /// Framed text on disk, no encryption.
    Plain,
}

impl Backend {
    /// Choose the backend for this process.
    pub fn select(config: &Config) -> Result<Self, CipherError> {
        if config.force_plain {
            return Ok(Backend::Plain);
        }
        let gpg = config.gpg.clone().ok_or(CipherError::ToolMissing {
            tool: "gpg",
            hint: "install GnuPG, or set AK_DISABLE_GPG=1 to store the vault unencrypted",
        })?;
        Ok(match &config.preset_passphrase {
            Some(passphrase) => Backend::GpgEnv {
                gpg,
                passphrase: passphrase.clone(),
            },
            None => Backend::GpgPrompt { gpg },
        })
    }

    /// Short name shown by `ak backend`.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::GpgPrompt { .. } | Backend::GpgEnv { .. } => "gpg",
            Backend::Plain => "plain",
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Backend::Plain)
    }
}
