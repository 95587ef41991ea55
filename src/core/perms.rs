//! Owner-only file and directory helpers.
//!
//! Everything ak writes under the config root goes through here so the
//! 0700/0600 modes hold no matter what the process umask is.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{IoContext, Result};

pub const DIR_MODE: u32 = 0o700;
pub const FILE_MODE: u32 = 0o600;

/// Create a directory (and parents) and restrict it to the owner.
pub fn create_private_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).at(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(DIR_MODE)).at(path)?;
    }
    Ok(())
}

/// Open options for a new owner-only file.
pub fn private_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options
}

/// Replace a file's contents, keeping it owner-only.
///
/// Not atomic; the vault uses a temp file and rename instead.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = private_options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .at(path)?;
    file.write_all(contents).at(path)?;
    restrict(path)
}

/// Force owner-only mode on an existing file.
pub fn restrict(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE)).at(path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).at(path),
    }
}
