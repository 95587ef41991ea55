//! Short-lived passphrase files for gpg.
//!
//! gpg reads the passphrase from `--passphrase-file`. The file is created
//! 0600 under the config root with a unique `.ak-pass-` name and unlinked
//! when the guard drops, on success and error paths alike.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::constants::PASSFILE_PREFIX;
use crate::error::{IoContext, Result};

pub struct PassphraseFile {
    file: NamedTempFile,
}

impl PassphraseFile {
    /// Write `passphrase` to a fresh owner-only file in `dir`.
    pub fn create(dir: &Path, passphrase: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(PASSFILE_PREFIX)
            .tempfile_in(dir)
            .at(dir)?;
        crate::core::perms::restrict(file.path())?;
        file.write_all(passphrase.as_bytes()).at(dir)?;
        file.flush().at(dir)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
