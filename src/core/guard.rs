//! Git pre-commit hook that blocks commits containing likely secrets.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::core::constants::GUARD_MARKER;
use crate::error::{Error, IoContext, Result};

/// Hook body. Uses gitleaks when present, a regex scan otherwise.
pub fn hook_script() -> String {
    format!(
        r#"#!/usr/bin/env bash
{marker}
# Installed by `ak guard enable`; remove with `ak guard disable`.
set -euo pipefail
if [ -z "$(git diff --cached --name-only --diff-filter=ACM)" ]; then
  exit 0
fi
if command -v gitleaks >/dev/null 2>&1; then
  exec gitleaks protect --staged
fi
pattern='AKIA[0-9A-Z]{{16}}|ASIA[0-9A-Z]{{16}}|ghp_[A-Za-z0-9]{{36}}|xox[baprs]-|sk-[A-Za-z0-9_-]{{20,}}|-----BEGIN ([A-Z]+ )?PRIVATE KEY-----|_API_KEY=|_TOKEN='
if git diff --cached --name-only -z --diff-filter=ACM | xargs -0 grep -EIHn -- "$pattern"; then
  echo "ak guard: possible secrets detected in staged files above." >&2
  echo "Commit aborted. Override with: git commit -n" >&2
  exit 1
fi
exit 0
"#,
        marker = GUARD_MARKER
    )
}

/// Path of the pre-commit hook for the repository containing `cwd`, or
/// `None` outside a repository.
pub fn hook_path(cwd: &Path) -> Result<Option<PathBuf>> {
    let git = which::which("git").map_err(|_| Error::ToolMissing {
        tool: "git",
        hint: "install git to use ak guard",
    })?;
    let output = Command::new(git)
        .args(["rev-parse", "--git-path", "hooks/pre-commit"])
        .current_dir(cwd)
        .output()?;
    if !output.status.success() {
        debug!("not inside a git repository");
        return Ok(None);
    }
    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(cwd.join(raw)))
}

fn is_ours(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|body| body.lines().take(2).any(|l| l.trim() == GUARD_MARKER))
        .unwrap_or(false)
}

/// Install the hook. An existing hook not written by ak is left alone.
pub fn enable(cwd: &Path) -> Result<PathBuf> {
    let hook = hook_path(cwd)?.ok_or_else(|| Error::Usage("not a git repository".to_string()))?;
    if hook.exists() && !is_ours(&hook) {
        return Err(Error::Usage(format!(
            "{} already exists and was not installed by ak",
            hook.display()
        )));
    }
    if let Some(parent) = hook.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    fs::write(&hook, hook_script()).at(&hook)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).at(&hook)?;
    }
    Ok(hook)
}

#[derive(Debug, PartialEq, Eq)]
pub enum Removal {
    Removed(PathBuf),
    NotInstalled,
    /// A hook exists but ak did not write it.
    Foreign(PathBuf),
    NotRepository,
}

/// Remove the hook if ak installed it.
pub fn disable(cwd: &Path) -> Result<Removal> {
    let Some(hook) = hook_path(cwd)? else {
        return Ok(Removal::NotRepository);
    };
    if !hook.exists() {
        return Ok(Removal::NotInstalled);
    }
    if !is_ours(&hook) {
        return Ok(Removal::Foreign(hook));
    }
    fs::remove_file(&hook).at(&hook)?;
    Ok(Removal::Removed(hook))
}
