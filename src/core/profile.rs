//! Profiles: named, sorted, deduplicated lists of secret names.
//!
//! `profiles/NAME.profile` holds one name per line. An optional
//! `profiles/NAME.keys[.gpg]` holds per-profile values that take precedence
//! over the vault when the profile is projected.

use std::collections::BTreeSet;
use std::fs;

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::codec::{self, SecretMap};
use crate::core::constants::DEFAULT_PROFILE;
use crate::core::perms;
use crate::core::session::Session;
use crate::core::validation::{is_valid_key, validate_key, validate_profile};
use crate::core::vault::{read_framed, write_framed};
use crate::error::{IoContext, Result, SecretError};

pub struct ProfileStore<'s> {
    session: &'s Session<'s>,
}

impl<'s> ProfileStore<'s> {
    pub fn new(session: &'s Session<'s>) -> Self {
        Self { session }
    }

    /// All profile names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = self.session.config().profiles_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).at(&dir),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.at(&dir)?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(stem) = file_name.strip_suffix(".profile") {
                if validate_profile(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.session.config().profile_path(name).exists()
    }

    /// Secret names in a profile. A missing profile reads as empty.
    pub fn read(&self, name: &str) -> Result<Vec<String>> {
        validate_profile(name)?;
        let path = self.session.config().profile_path(name);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).at(&path),
        };
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && is_valid_key(l))
            .map(str::to_string)
            .collect())
    }

    /// Replace a profile's list. Names are validated, sorted and deduplicated.
    pub fn write<S: AsRef<str>>(&self, name: &str, names: &[S]) -> Result<()> {
        validate_profile(name)?;
        let mut sorted = BTreeSet::new();
        for n in names {
            validate_key(n.as_ref())?;
            sorted.insert(n.as_ref().to_string());
        }

        let config = self.session.config();
        perms::create_private_dir(&config.profiles_dir())?;
        let mut body = String::new();
        for n in &sorted {
            body.push_str(n);
            body.push('\n');
        }
        perms::write_private(&config.profile_path(name), body.as_bytes())?;
        debug!(profile = name, names = sorted.len(), "wrote profile");
        Ok(())
    }

    /// Add names to a profile, creating it if needed.
    pub fn extend<S: AsRef<str>>(&self, name: &str, names: &[S]) -> Result<Vec<String>> {
        let mut current = self.read(name)?;
        current.extend(names.iter().map(|n| n.as_ref().to_string()));
        self.write(name, &current)?;
        self.read(name)
    }

    /// Remove names from a profile if present. Returns whether it changed.
    pub fn retain_without(&self, name: &str, drop: &BTreeSet<String>) -> Result<bool> {
        let current = self.read(name)?;
        let kept: Vec<&String> = current.iter().filter(|n| !drop.contains(*n)).collect();
        if kept.len() == current.len() {
            return Ok(false);
        }
        self.write(name, &kept)?;
        Ok(true)
    }

    /// Per-profile override values. Missing file → empty map.
    pub fn read_keys(&self, name: &str) -> Result<SecretMap> {
        validate_profile(name)?;
        let path = self.session.config().profile_keys_path(name);
        if !path.exists() {
            return Ok(SecretMap::new());
        }
        read_framed(self.session, &path)
    }

    pub fn write_keys(&self, name: &str, map: &SecretMap) -> Result<()> {
        validate_profile(name)?;
        for key in map.keys() {
            validate_key(key)?;
        }
        write_framed(self.session, &self.session.config().profile_keys_path(name), map)
    }

    /// Delete a profile and its override map.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_profile(name)?;
        let config = self.session.config();
        let removed_list = perms::remove_if_exists(&config.profile_path(name))?;
        let mut removed_keys = false;
        for suffix in ["keys", "keys.gpg"] {
            let path = config.profiles_dir().join(format!("{}.{}", name, suffix));
            removed_keys |= perms::remove_if_exists(&path)?;
        }
        if !removed_list && !removed_keys {
            return Err(SecretError::ProfileNotFound(name.to_string()).into());
        }
        Ok(())
    }

    /// Create the `default` profile if it is missing.
    pub fn ensure_default(&self) -> Result<()> {
        if !self.exists(DEFAULT_PROFILE) {
            let none: [&str; 0] = [];
            self.write(DEFAULT_PROFILE, &none)?;
        }
        Ok(())
    }

    /// Values a profile projects: override map, then vault, else dropped.
    pub fn resolve(
        &self,
        name: &str,
        vault: &SecretMap,
    ) -> Result<Vec<(String, Zeroizing<String>)>> {
        let names = self.read(name)?;
        let overrides = self.read_keys(name)?;
        Ok(resolve_values(&names, &overrides, vault))
    }
}

/// Apply the lookup order to `names`. Unresolved names are dropped; values
/// are projected as text.
pub fn resolve_values(
    names: &[String],
    overrides: &SecretMap,
    vault: &SecretMap,
) -> Vec<(String, Zeroizing<String>)> {
    names
        .iter()
        .filter_map(|n| {
            overrides
                .get(n)
                .or_else(|| vault.get(n))
                .map(|v| (n.clone(), codec::text(v)))
        })
        .collect()
}
