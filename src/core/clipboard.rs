//! Clipboard access through whichever copy tool is installed.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clipboard {
    Pbcopy(PathBuf),
    WlCopy(PathBuf),
    Xclip(PathBuf),
}

impl Clipboard {
    /// First available tool in the order pbcopy, wl-copy, xclip.
    pub fn detect() -> Result<Self> {
        if let Ok(p) = which::which("pbcopy") {
            return Ok(Clipboard::Pbcopy(p));
        }
        if let Ok(p) = which::which("wl-copy") {
            return Ok(Clipboard::WlCopy(p));
        }
        if let Ok(p) = which::which("xclip") {
            return Ok(Clipboard::Xclip(p));
        }
        Err(Error::ToolMissing {
            tool: "clipboard tool",
            hint: "install pbcopy, wl-copy or xclip",
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Clipboard::Pbcopy(_) => "pbcopy",
            Clipboard::WlCopy(_) => "wl-copy",
            Clipboard::Xclip(_) => "xclip",
        }
    }

    fn command(&self) -> Command {
        match self {
            Clipboard::Pbcopy(bin) | Clipboard::WlCopy(bin) => Command::new(bin),
            Clipboard::Xclip(bin) => {
                let mut cmd = Command::new(bin);
                cmd.args(["-selection", "clipboard"]);
                cmd
            }
        }
    }

    /// Pipe `text` into the tool's stdin.
    pub fn copy(&self, value: &[u8]) -> Result<()> {
        debug!(tool = self.name(), "copying to clipboard");
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(value)?;
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(Error::Other(format!("{} exited with {}", self.name(), status)));
        }
        Ok(())
    }
}
