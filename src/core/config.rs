//! Path resolution and process configuration.
//!
//! [`Config`] is resolved once at startup from the environment and passed
//! by reference everywhere else. Nothing below `main` reads `XDG_*`,
//! `HOME` or the `AK_*` switches directly.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::core::perms;
use crate::error::{Error, Result};

/// Resolved configuration for one process.
#[derive(Debug, Clone)]
pub struct Config {
    /// `$XDG_CONFIG_HOME/ak` or `$HOME/.config/ak`.
    pub root: PathBuf,
    /// Home directory of the effective user.
    pub home: PathBuf,
    /// `$USER`, or the login name when unset. Feeds the bundle passphrase.
    pub user: String,
    /// Location of the `gpg` binary, if installed.
    pub gpg: Option<PathBuf>,
    /// `AK_DISABLE_GPG` was set.
    pub force_plain: bool,
    /// `AK_PASSPHRASE`, if set and non-empty.
    pub preset_passphrase: Option<Zeroizing<String>>,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let home = env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::Other("unable to determine home directory".to_string()))?;

        let root = match env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            Some(xdg) => PathBuf::from(xdg).join(constants::APP_DIR),
            None => home.join(".config").join(constants::APP_DIR),
        };

        let user = env::var("USER")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(whoami::username);

        let force_plain = env::var(constants::ENV_DISABLE_GPG)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let preset_passphrase = env::var(constants::ENV_PASSPHRASE)
            .ok()
            .filter(|p| !p.is_empty())
            .map(Zeroizing::new);

        let gpg = which::which("gpg").ok();

        debug!(root = %root.display(), gpg = gpg.is_some(), force_plain, "resolved config");

        Ok(Self {
            root,
            home,
            user,
            gpg,
            force_plain,
            preset_passphrase,
        })
    }

    /// A configuration rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            home: home.into(),
            user: "user".to_string(),
            gpg: which::which("gpg").ok(),
            force_plain: true,
            preset_passphrase: None,
        }
    }

    /// Whether the vault is stored encrypted.
    pub fn encrypted(&self) -> bool {
        !self.force_plain && self.gpg.is_some()
    }

    /// Suffix applied to vault-format files (`.gpg` when encrypted).
    fn framed_suffix(&self) -> &'static str {
        if self.encrypted() {
            ".gpg"
        } else {
            ""
        }
    }

    pub fn vault_path(&self) -> PathBuf {
        self.root.join(format!("keys.env{}", self.framed_suffix()))
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir().join(format!("{}.profile", name))
    }

    pub fn profile_keys_path(&self, name: &str) -> PathBuf {
        self.profiles_dir()
            .join(format!("{}.keys{}", name, self.framed_suffix()))
    }

    pub fn persist_dir(&self) -> PathBuf {
        self.root.join("persist")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.root.join("audit.log")
    }

    pub fn instance_id_path(&self) -> PathBuf {
        self.root.join("instance.id")
    }

    pub fn services_path(&self) -> PathBuf {
        self.root.join("services.toml")
    }

    pub fn shell_init_path(&self) -> PathBuf {
        self.root.join("shell-init.sh")
    }

    pub fn fish_init_path(&self) -> PathBuf {
        self.root.join("shell-init.fish")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// Create the config root and its fixed subdirectories with mode 0700.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.profiles_dir(), self.persist_dir()] {
            perms::create_private_dir(&dir)?;
        }
        Ok(())
    }

    /// Directory passphrase files are written to.
    pub fn scratch_dir(&self) -> &Path {
        &self.root
    }
}

/// Interpret an opt-out switch. Empty, `0`, `false` and `no` are off.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
