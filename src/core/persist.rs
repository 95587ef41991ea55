//! Directory persistence: which profiles auto-load in which directory.
//!
//! `persist/HEX16.map` holds a single line `ABS_DIR<TAB>p1,p2`, where HEX16
//! is the first 16 hex digits of SHA-256 of `ABS_DIR`. A mapping whose
//! stored directory differs from the one asked about is treated as absent.
//!
//! `persist/PROFILE.bundle` is the profile's export script, gpg-encrypted
//! with a passphrase derived from the user name. Bundles are a cache for
//! the shell hook, not a security boundary.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::core::cipher::gpg;
use crate::core::config::Config;
use crate::core::constants::{BUNDLE_PASSPHRASE_PREFIX, HASH_PREFIX_LEN};
use crate::core::perms;
use crate::error::{IoContext, Result};

/// First 16 hex digits of SHA-256 of a directory path.
pub fn dir_hash(dir: &str) -> String {
    let digest = Sha256::digest(dir.as_bytes());
    let mut hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(HASH_PREFIX_LEN);
    hex
}

/// Parse a mapping file body, returning profiles only if it belongs to `dir`.
pub fn parse_mapping(body: &str, dir: &str) -> Option<Vec<String>> {
    let line = body.lines().next()?;
    let (stored, csv) = line.split_once('\t')?;
    if stored != dir {
        debug!("mapping belongs to another directory; ignoring");
        return None;
    }
    Some(
        csv.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Render a mapping file body.
pub fn format_mapping(dir: &str, profiles: &[String]) -> String {
    format!("{}\t{}\n", dir, profiles.join(","))
}

pub struct DirPersistence<'c> {
    config: &'c Config,
}

impl<'c> DirPersistence<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn mapping_path(&self, dir: &str) -> PathBuf {
        self.config
            .persist_dir()
            .join(format!("{}.map", dir_hash(dir)))
    }

    pub fn bundle_path(&self, profile: &str) -> PathBuf {
        self.config.persist_dir().join(format!("{}.bundle", profile))
    }

    /// Profiles mapped to `dir`, in stored order.
    pub fn read(&self, dir: &str) -> Result<Vec<String>> {
        let path = self.mapping_path(dir);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(parse_mapping(&body, dir).unwrap_or_default()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).at(&path),
        }
    }

    /// Append profiles to `dir`'s mapping, keeping order and dropping repeats.
    pub fn add(&self, dir: &str, profiles: &[String]) -> Result<Vec<String>> {
        let mut current = self.read(dir)?;
        for p in profiles {
            if !current.contains(p) {
                current.push(p.clone());
            }
        }
        self.write(dir, &current)?;
        Ok(current)
    }

    /// Remove profiles from `dir`'s mapping; the file goes when it empties.
    pub fn remove(&self, dir: &str, profiles: &[String]) -> Result<Vec<String>> {
        let current: Vec<String> = self
            .read(dir)?
            .into_iter()
            .filter(|p| !profiles.contains(p))
            .collect();
        self.write(dir, &current)?;
        Ok(current)
    }

    fn write(&self, dir: &str, profiles: &[String]) -> Result<()> {
        let path = self.mapping_path(dir);
        if profiles.is_empty() {
            perms::remove_if_exists(&path)?;
            return Ok(());
        }
        perms::create_private_dir(&self.config.persist_dir())?;
        perms::write_private(&path, format_mapping(dir, profiles).as_bytes())
    }

    /// Drop `profile` from every mapping and remove its bundle. Returns the
    /// directories whose mapping changed.
    pub fn forget_profile(&self, profile: &str) -> Result<Vec<String>> {
        let dir = self.config.persist_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).at(&dir),
        };

        let mut changed = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.extension().is_some_and(|x| x == "map") {
                continue;
            }
            let body = fs::read_to_string(&path).at(&path)?;
            let Some((stored, _)) = body.lines().next().and_then(|l| l.split_once('\t')) else {
                continue;
            };
            let Some(current) = parse_mapping(&body, stored) else {
                continue;
            };
            if !current.iter().any(|p| p == profile) {
                continue;
            }
            let kept: Vec<String> = current.into_iter().filter(|p| p != profile).collect();
            if kept.is_empty() {
                perms::remove_if_exists(&path)?;
            } else {
                perms::write_private(&path, format_mapping(stored, &kept).as_bytes())?;
            }
            changed.push(stored.to_string());
        }
        self.remove_bundle(profile)?;
        debug!(profile, mappings = changed.len(), "forgot profile");
        Ok(changed)
    }

    /// Number of mapping files on disk.
    pub fn mapping_count(&self) -> usize {
        fs::read_dir(self.config.persist_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|x| x == "map"))
                    .count()
            })
            .unwrap_or(0)
    }

    fn bundle_passphrase(&self) -> String {
        format!("{}{}", BUNDLE_PASSPHRASE_PREFIX, self.config.user)
    }

    /// Encrypt and store a profile's export script.
    ///
    /// Returns `false` when gpg is unavailable or encryption fails; the
    /// bundle is a cache, so that is a warning, not an error.
    pub fn write_bundle(&self, profile: &str, script: &str) -> Result<bool> {
        let Some(bin) = self.config.gpg.as_deref() else {
            warn!("gpg not installed; auto-load bundle not written");
            return Ok(false);
        };
        perms::create_private_dir(&self.config.persist_dir())?;
        let sealed = match gpg::encrypt(
            bin,
            self.config.scratch_dir(),
            &self.bundle_passphrase(),
            script.as_bytes(),
        ) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to encrypt auto-load bundle");
                return Ok(false);
            }
        };
        perms::write_private(&self.bundle_path(profile), &sealed)?;
        Ok(true)
    }

    /// Refresh a bundle only if one already exists for `profile`.
    pub fn refresh_bundle(&self, profile: &str, script: &str) -> Result<bool> {
        if !self.bundle_path(profile).exists() {
            return Ok(false);
        }
        self.write_bundle(profile, script)
    }

    pub fn remove_bundle(&self, profile: &str) -> Result<bool> {
        perms::remove_if_exists(&self.bundle_path(profile))
    }

    /// Delete the whole persist directory.
    pub fn clear(&self) -> Result<()> {
        let dir = self.config.persist_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).at(&dir),
        }
    }
}

/// Absolute physical path of a directory, as `pwd -P` prints it.
pub fn physical_dir(dir: &Path) -> Result<String> {
    let canonical = dir.canonicalize().at(dir)?;
    Ok(canonical.to_string_lossy().into_owned())
}
