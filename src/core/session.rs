//! Per-process state: backend choice, passphrase cache and audit sink.
//!
//! One [`Session`] is built in `main` and threaded through every command.
//! The cached passphrase lives only in memory and is dropped on the first
//! decryption failure.

use std::io::{self, IsTerminal};
use std::sync::Mutex;

use dialoguer::Password;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::audit::AuditSink;
use crate::core::cipher::{gpg, Backend};
use crate::core::config::Config;
use crate::error::{CipherError, Error, Result};

pub struct Session<'a> {
    config: &'a Config,
    backend: std::result::Result<Backend, CipherError>,
    passphrase: Mutex<Option<Zeroizing<String>>>,
    audit: AuditSink,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            backend: Backend::select(config),
            passphrase: Mutex::new(None),
            audit: AuditSink::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// The selected backend, or why none could be selected.
    pub fn backend(&self) -> Result<&Backend> {
        self.backend.as_ref().map_err(|e| match e {
            CipherError::ToolMissing { tool, hint } => CipherError::ToolMissing {
                tool: *tool,
                hint: *hint,
            }
            .into(),
            other => Error::Other(other.to_string()),
        })
    }

    /// Backend label for display; `gpg` or `plain`.
    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Ok(b) => b.name(),
            Err(_) => "plain",
        }
    }

    /// Turn framed plaintext into on-disk bytes.
    ///
    /// `creating` asks for the passphrase twice when it has to be prompted.
    pub fn seal(&self, plaintext: &[u8], creating: bool) -> Result<Vec<u8>> {
        match self.backend()? {
            Backend::Plain => Ok(plaintext.to_vec()),
            Backend::GpgEnv { gpg: bin, passphrase } => {
                gpg::encrypt(bin, self.config.scratch_dir(), passphrase, plaintext)
            }
            Backend::GpgPrompt { gpg: bin } => {
                let passphrase = self.passphrase(creating)?;
                gpg::encrypt(bin, self.config.scratch_dir(), &passphrase, plaintext)
            }
        }
    }

    /// Turn on-disk bytes back into framed plaintext.
    pub fn open(&self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let result = match self.backend()? {
            Backend::Plain => return Ok(Zeroizing::new(data.to_vec())),
            Backend::GpgEnv { gpg: bin, passphrase } => {
                gpg::decrypt(bin, self.config.scratch_dir(), passphrase, data)
            }
            Backend::GpgPrompt { gpg: bin } => {
                let passphrase = self.passphrase(false)?;
                gpg::decrypt(bin, self.config.scratch_dir(), &passphrase, data)
            }
        };
        if result.is_err() {
            debug!("decryption failed; clearing cached passphrase");
            self.forget_passphrase();
        }
        result
    }

    /// Cached passphrase, prompting on first use.
    fn passphrase(&self, confirm: bool) -> Result<Zeroizing<String>> {
        let mut cache = self.passphrase.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(p) = cache.as_ref() {
            return Ok(p.clone());
        }

        if !io::stdin().is_terminal() {
            return Err(CipherError::PassphraseRequired.into());
        }

        let mut prompt = Password::new().with_prompt("Vault passphrase");
        if confirm {
            prompt = prompt.with_confirmation("Confirm passphrase", "passphrases do not match");
        }
        let entered = Zeroizing::new(prompt.interact()?);
        *cache = Some(entered.clone());
        Ok(entered)
    }

    pub fn forget_passphrase(&self) {
        let mut cache = self.passphrase.lock().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }

    /// Whether a passphrase is currently cached.
    pub fn has_cached_passphrase(&self) -> bool {
        self.passphrase
            .lock()
            .map(|c| c.is_some())
            .unwrap_or(false)
    }

    /// Record an audited operation. Audit failures are logged, never fatal.
    pub fn audit<S: AsRef<str>>(&self, action: &str, keys: &[S]) {
        if let Err(e) = self.audit.record(action, keys) {
            tracing::warn!(error = %e, "failed to write audit record");
        }
    }

    pub fn audit_sink(&self) -> &AuditSink {
        &self.audit
    }
}
