//! Vault.
//!
//! The authoritative name → value map for one config root, stored as a
//! framed file that the session backend seals (gpg) or leaves plain.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::codec::{self, SecretMap};
use crate::core::perms;
use crate::core::session::Session;
use crate::core::validation::validate_key;
use crate::error::{IoContext, Result, SecretError};

/// Read a vault-format file. A missing file is an empty map.
pub(crate) fn read_framed(session: &Session, path: &Path) -> Result<SecretMap> {
    let data = match fs::read(path) {
        Ok(d) => Zeroizing::new(d),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no file, starting empty");
            return Ok(SecretMap::new());
        }
        Err(e) => return Err(e).at(path),
    };
    let plain = session.open(&data)?;
    let text = String::from_utf8_lossy(&plain);
    Ok(codec::decode(&text))
}

/// Write a vault-format file atomically.
///
/// The sealed bytes go to a sibling temp file that is renamed over `path`.
/// Any failure before the rename leaves the previous file untouched and the
/// temp file is removed when it drops.
pub(crate) fn write_framed(session: &Session, path: &Path, map: &SecretMap) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| crate::error::Error::Other(format!("no parent for {}", path.display())))?;
    perms::create_private_dir(dir)?;

    let framed = codec::encode(map);
    let sealed = session.seal(framed.as_bytes(), !path.exists())?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp.ak.")
        .tempfile_in(dir)
        .at(dir)?;
    perms::restrict(tmp.path())?;
    tmp.write_all(&sealed).at(tmp.path())?;
    tmp.as_file().sync_all().at(path)?;
    tmp.persist(path).map_err(|e| e.error).at(path)?;
    perms::restrict(path)?;

    debug!(path = %path.display(), entries = map.len(), "wrote framed file");
    Ok(())
}

/// Handle on the vault for one session.
pub struct Vault<'s> {
    session: &'s Session<'s>,
}

impl<'s> Vault<'s> {
    pub fn new(session: &'s Session<'s>) -> Self {
        Self { session }
    }

    pub fn path(&self) -> std::path::PathBuf {
        self.session.config().vault_path()
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Load the whole map. Missing vault → empty map.
    pub fn load(&self) -> Result<SecretMap> {
        read_framed(self.session, &self.path())
    }

    /// Replace the vault with `map`.
    pub fn save(&self, map: &SecretMap) -> Result<()> {
        write_framed(self.session, &self.path(), map)
    }

    pub fn get(&self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.load()?
            .remove(name)
            .ok_or_else(|| SecretError::NotFound(name.to_string()).into())
    }

    /// Upsert one secret. Returns `true` when it replaced an existing value.
    pub fn put(&self, name: &str, value: &[u8]) -> Result<bool> {
        validate_key(name)?;
        let mut map = self.load()?;
        let existed = map
            .insert(name.to_string(), Zeroizing::new(value.to_vec()))
            .is_some();
        self.save(&map)?;
        info!(existed, "stored secret");
        Ok(existed)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let mut map = self.load()?;
        if map.remove(name).is_none() {
            return Err(SecretError::NotFound(name.to_string()).into());
        }
        self.save(&map)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}
