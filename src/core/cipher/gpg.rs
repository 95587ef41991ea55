//! GnuPG symmetric encryption.
//!
//! Data goes through gpg's stdin and stdout; the passphrase goes through a
//! [`PassphraseFile`]. No plaintext ever touches the filesystem and no
//! secret appears on a command line.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::trace;
use zeroize::Zeroizing;

use super::passfile::PassphraseFile;
use crate::error::{CipherError, Result};

/// Arguments shared by every invocation.
const COMMON_ARGS: &[&str] = &[
    "--batch",
    "--yes",
    "--quiet",
    "--no-symkey-cache",
    "--pinentry-mode",
    "loopback",
];

/// Encrypt `plaintext` with AES-256 under `passphrase`.
pub fn encrypt(gpg: &Path, scratch: &Path, passphrase: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    trace!(plaintext_len = plaintext.len(), "encrypting with gpg");

    let passfile = PassphraseFile::create(scratch, passphrase)?;
    let mut cmd = Command::new(gpg);
    cmd.args(COMMON_ARGS)
        .arg("--passphrase-file")
        .arg(passfile.path())
        .args(["--symmetric", "--cipher-algo", "AES256", "--output", "-"]);

    let out = pipe(cmd, plaintext)
        .map_err(|e| CipherError::EncryptionFailed(format!("failed to run gpg: {}", e)))?;

    if !out.success {
        return Err(CipherError::EncryptionFailed(first_line(&out.stderr)).into());
    }

    trace!(ciphertext_len = out.stdout.len(), "encrypted with gpg");
    Ok(out.stdout.to_vec())
}

/// Decrypt gpg symmetric `ciphertext` under `passphrase`.
pub fn decrypt(
    gpg: &Path,
    scratch: &Path,
    passphrase: &str,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    trace!(ciphertext_len = ciphertext.len(), "decrypting with gpg");

    let passfile = PassphraseFile::create(scratch, passphrase)?;
    let mut cmd = Command::new(gpg);
    cmd.args(COMMON_ARGS)
        .arg("--passphrase-file")
        .arg(passfile.path())
        .arg("--decrypt");

    let out = pipe(cmd, ciphertext)
        .map_err(|e| CipherError::DecryptionFailed(format!("failed to run gpg: {}", e)))?;

    if !out.success {
        return Err(CipherError::DecryptionFailed(first_line(&out.stderr)).into());
    }

    Ok(out.stdout)
}

struct Piped {
    success: bool,
    stdout: Zeroizing<Vec<u8>>,
    stderr: Vec<u8>,
}

/// Run `cmd`, feeding `input` on stdin while draining stdout.
///
/// The writer runs on its own thread so a large input cannot deadlock
/// against a full stdout pipe.
fn pipe(mut cmd: Command, input: &[u8]) -> std::io::Result<Piped> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdin = child.stdin.take();
    let mut stdout = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let mut collected = Zeroizing::new(Vec::new());
    let mut stderr = Vec::new();

    std::thread::scope(|s| -> std::io::Result<()> {
        let writer = s.spawn(move || -> std::io::Result<()> {
            if let Some(mut pipe) = stdin {
                // gpg may exit early (bad passphrase); a broken pipe is reported via its status.
                match pipe.write_all(input) {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok(())
        });
        let err_reader = s.spawn(move || {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });

        if let Some(pipe) = stdout.as_mut() {
            pipe.read_to_end(&mut collected)?;
        }
        stderr = err_reader.join().unwrap_or_default();
        writer
            .join()
            .map_err(|_| std::io::Error::other("stdin writer panicked"))??;
        Ok(())
    })?;

    let status = child.wait()?;
    Ok(Piped {
        success: status.success(),
        stdout: collected,
        stderr,
    })
}

fn first_line(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .map(|l| l.trim_start_matches("gpg: ").trim())
        .find(|l| !l.is_empty())
        .unwrap_or("gpg exited with an error")
        .to_string()
}
