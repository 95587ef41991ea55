//! Append-only audit log.
//!
//! One line per audited operation:
//!
//! ```text
//! 2026-01-02T03:04:05Z action=add instance=Xy3... count=1 keys=3f1c9a0b2d4e6f70
//! ```
//!
//! Secret names are recorded only as truncated SHA-256 hashes. Lines are
//! written with a single `write_all` on an `O_APPEND` handle while holding
//! the sink mutex, so concurrent writers interleave at line boundaries.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::core::config::Config;
use crate::core::constants::{HASH_PREFIX_LEN, INSTANCE_ID_LEN};
use crate::core::perms;
use crate::error::{IoContext, Result};

pub struct AuditSink {
    log: PathBuf,
    instance_path: PathBuf,
    instance: OnceLock<String>,
    lock: Mutex<()>,
}

impl AuditSink {
    pub fn new(config: &Config) -> Self {
        Self {
            log: config.audit_log(),
            instance_path: config.instance_id_path(),
            instance: OnceLock::new(),
            lock: Mutex::new(()),
        }
    }

    /// Append one record.
    pub fn record<S: AsRef<str>>(&self, action: &str, keys: &[S]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let instance = self.instance_id()?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let line = format_line(&timestamp, action, &instance, keys);

        if let Some(parent) = self.log.parent() {
            perms::create_private_dir(parent)?;
        }
        let mut file = perms::private_options()
            .create(true)
            .append(true)
            .open(&self.log)
            .at(&self.log)?;
        file.write_all(line.as_bytes()).at(&self.log)?;
        perms::restrict(&self.log)
    }

    /// Stable random identifier for this config root.
    pub fn instance_id(&self) -> Result<String> {
        if let Some(id) = self.instance.get() {
            return Ok(id.clone());
        }
        let id = load_or_create_instance_id(&self.instance_path)?;
        Ok(self.instance.get_or_init(|| id).clone())
    }

    /// The last `n` lines of the log, oldest first.
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let file = match fs::File::open(&self.log) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).at(&self.log),
        };
        let lines: Vec<String> = BufReader::new(file)
            .lines()
            .collect::<std::io::Result<_>>()
            .at(&self.log)?;
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].to_vec())
    }
}

/// Hash a secret name for the log.
pub fn hash_name(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex.truncate(HASH_PREFIX_LEN);
    hex
}

/// Render one log line, newline included. `keys=` is omitted when empty.
pub fn format_line<S: AsRef<str>>(timestamp: &str, action: &str, instance: &str, keys: &[S]) -> String {
    let mut line = format!(
        "{} action={} instance={} count={}",
        timestamp,
        action,
        instance,
        keys.len()
    );
    if !keys.is_empty() {
        let hashes: Vec<String> = keys.iter().map(|k| hash_name(k.as_ref())).collect();
        line.push_str(" keys=");
        line.push_str(&hashes.join(","));
    }
    line.push('\n');
    line
}

fn load_or_create_instance_id(path: &std::path::Path) -> Result<String> {
    if let Ok(existing) = fs::read_to_string(path) {
        let id = existing.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INSTANCE_ID_LEN)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        perms::create_private_dir(parent)?;
    }
    perms::write_private(path, format!("{}\n", id).as_bytes())?;
    Ok(id)
}
