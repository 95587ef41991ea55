//! Shell integration: init scripts, rc file wiring and the auto-load hook.
//!
//! The init script defines an `ak` function that evaluates the stdout of
//! `load`, `unload` and `env` in the calling shell, and a directory hook
//! that reads `persist/HEX16.map` and evaluates the matching bundles. The
//! hook never runs the CLI; it needs only a SHA-256 tool and gpg.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::config::Config;
use crate::core::constants::{BUNDLE_PASSPHRASE_PREFIX, ENV_WRAPPER_ACTIVE, HASH_PREFIX_LEN, RC_MARKER};
use crate::core::perms;
use crate::core::projector::escape;
use crate::error::{IoContext, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
    Other,
}

impl ShellKind {
    /// Classify a login shell path such as `/usr/bin/zsh`.
    pub fn from_path(shell: &str) -> Self {
        let name = Path::new(shell)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match name.as_str() {
            "bash" => ShellKind::Bash,
            "zsh" => ShellKind::Zsh,
            "fish" => ShellKind::Fish,
            _ => ShellKind::Other,
        }
    }

    /// The rc file this shell reads, relative to `home`.
    pub fn rc_file(&self, home: &Path) -> PathBuf {
        match self {
            ShellKind::Bash => home.join(".bashrc"),
            ShellKind::Zsh => home.join(".zshrc"),
            ShellKind::Fish => home.join(".config").join("fish").join("config.fish"),
            ShellKind::Other => home.join(".profile"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Fish => "fish",
            ShellKind::Other => "sh",
        }
    }
}

/// The user whose shell gets wired up. Under sudo this is the invoking
/// user, not root.
#[derive(Debug, Clone)]
pub struct TargetUser {
    pub name: String,
    pub home: PathBuf,
    pub shell: ShellKind,
}

impl TargetUser {
    pub fn resolve(config: &Config) -> Self {
        if let Some(sudo_user) = env::var("SUDO_USER").ok().filter(|u| !u.is_empty()) {
            if let Some((home, shell)) = passwd_entry(&sudo_user) {
                debug!(user = %sudo_user, "using invoking user from sudo");
                return Self {
                    name: sudo_user,
                    home,
                    shell: ShellKind::from_path(&shell),
                };
            }
        }
        let shell = env::var("SHELL").unwrap_or_default();
        Self {
            name: config.user.clone(),
            home: config.home.clone(),
            shell: ShellKind::from_path(&shell),
        }
    }

    /// Every rc file we might have touched.
    pub fn rc_candidates(&self) -> Vec<PathBuf> {
        [ShellKind::Bash, ShellKind::Zsh, ShellKind::Fish, ShellKind::Other]
            .iter()
            .map(|k| k.rc_file(&self.home))
            .collect()
    }
}

#[cfg(unix)]
fn passwd_entry(name: &str) -> Option<(PathBuf, String)> {
    use std::ffi::{CStr, CString};

    let c_name = CString::new(name).ok()?;
    // SAFETY: getpwnam returns null or a pointer to static storage that
    // stays valid until the next getpw* call; both fields are copied out
    // before returning.
    unsafe {
        let pw = libc::getpwnam(c_name.as_ptr());
        if pw.is_null() || (*pw).pw_dir.is_null() {
            return None;
        }
        let home = CStr::from_ptr((*pw).pw_dir).to_string_lossy().into_owned();
        let shell = if (*pw).pw_shell.is_null() {
            String::new()
        } else {
            CStr::from_ptr((*pw).pw_shell).to_string_lossy().into_owned()
        };
        Some((PathBuf::from(home), shell))
    }
}

#[cfg(not(unix))]
fn passwd_entry(_name: &str) -> Option<(PathBuf, String)> {
    None
}

/// Single-quote a string for POSIX sh.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Single-quote a string for fish.
fn fish_quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', r"\\").replace('\'', r"\'"))
}

/// The bash/zsh init script.
pub fn posix_init_script(config: &Config) -> String {
    let persist = sh_quote(&config.persist_dir().to_string_lossy());
    format!(
        r#"# ak shell integration, generated by `ak install-shell`. Do not edit.

ak() {{
    case "$1" in
        load|unload|env)
            case " $* " in
                *" -h "*|*" --help "*) command ak "$@"; return $? ;;
            esac
            local __ak_out
            __ak_out="$({wrapper}=1 command ak "$@")" || return $?
            eval "$__ak_out"
            ;;
        *)
            command ak "$@"
            ;;
    esac
}}

__ak_hash() {{
    if command -v sha256sum >/dev/null 2>&1; then
        printf '%s' "$1" | sha256sum | cut -c1-{hash_len}
    else
        printf '%s' "$1" | shasum -a 256 | cut -c1-{hash_len}
    fi
}}

__ak_autoload() {{
    local dir map line stored rest profile bundle tab
    dir="$(pwd -P)"
    [ "$dir" = "${{__AK_LAST_DIR:-}}" ] && return 0
    __AK_LAST_DIR="$dir"
    map={persist}/"$(__ak_hash "$dir")".map
    [ -r "$map" ] || return 0
    command -v gpg >/dev/null 2>&1 || return 0
    tab="$(printf '\t')"
    IFS= read -r line < "$map" || [ -n "$line" ] || return 0
    stored="${{line%%"$tab"*}}"
    [ "$stored" = "$dir" ] || return 0
    rest="${{line#*"$tab"}},"
    while [ -n "$rest" ]; do
        profile="${{rest%%,*}}"
        rest="${{rest#*,}}"
        [ -n "$profile" ] || continue
        bundle={persist}/"$profile".bundle
        [ -r "$bundle" ] || continue
        eval "$(printf '%s' "{bundle_prefix}${{USER:-user}}" | gpg --batch --quiet --pinentry-mode loopback --passphrase-fd 0 --decrypt "$bundle" 2>/dev/null)"
    done
}}

if [ -n "${{ZSH_VERSION:-}}" ]; then
    autoload -Uz add-zsh-hook 2>/dev/null && add-zsh-hook chpwd __ak_autoload
elif [ -n "${{BASH_VERSION:-}}" ]; then
    case ";${{PROMPT_COMMAND:-}};" in
        *";__ak_autoload;"*) ;;
        *) PROMPT_COMMAND="__ak_autoload${{PROMPT_COMMAND:+;$PROMPT_COMMAND}}" ;;
    esac
fi

__ak_autoload
"#,
        wrapper = ENV_WRAPPER_ACTIVE,
        hash_len = HASH_PREFIX_LEN,
        persist = persist,
        bundle_prefix = BUNDLE_PASSPHRASE_PREFIX,
    )
}

/// The fish init script. `unset` lines become `set -e`.
pub fn fish_init_script(config: &Config) -> String {
    let persist = fish_quote(&config.persist_dir().to_string_lossy());
    format!(
        r#"# ak shell integration, generated by `ak install-shell`. Do not edit.

function ak
    switch "$argv[1]"
        case load unload env
            if contains -- --help $argv; or contains -- -h $argv
                command ak $argv
                return $status
            end
            set -l out (env {wrapper}=1 command ak $argv)
            or return $status
            printf '%s\n' $out | string replace -r '^unset ' 'set -e ' | source
        case '*'
            command ak $argv
    end
end

function __ak_autoload --on-variable PWD
    set -l dir (pwd -P)
    test "$dir" = "$__ak_last_dir"; and return
    set -g __ak_last_dir $dir
    set -l hash
    if command -sq sha256sum
        set hash (printf '%s' $dir | sha256sum | string sub -l {hash_len})
    else
        set hash (printf '%s' $dir | shasum -a 256 | string sub -l {hash_len})
    end
    set -l map {persist}/$hash.map
    test -r $map; or return
    command -sq gpg; or return
    read -l line < $map
    set -l fields (string split -m 1 \t -- $line)
    test "$fields[1]" = "$dir"; or return
    set -l user $USER
    test -n "$user"; or set user user
    for profile in (string split , -- $fields[2])
        test -n "$profile"; or continue
        set -l bundle {persist}/$profile.bundle
        test -r $bundle; or continue
        printf '%s' "{bundle_prefix}$user" | gpg --batch --quiet --pinentry-mode loopback --passphrase-fd 0 --decrypt $bundle 2>/dev/null | string replace -r '^unset ' 'set -e ' | source
    end
end

__ak_autoload
"#,
        wrapper = ENV_WRAPPER_ACTIVE,
        hash_len = HASH_PREFIX_LEN,
        persist = persist,
        bundle_prefix = BUNDLE_PASSPHRASE_PREFIX,
    )
}

/// `source "<path>"`, as written into rc files.
pub fn source_line(init: &Path) -> String {
    format!("source \"{}\"", escape(&init.to_string_lossy()))
}

#[derive(Debug)]
pub struct InstallReport {
    pub init_path: PathBuf,
    pub rc_file: PathBuf,
    /// False when the rc file already sourced the init script.
    pub rc_updated: bool,
}

/// Write the init script(s) and source them from the user's rc file.
pub fn install(config: &Config, user: &TargetUser) -> Result<InstallReport> {
    perms::create_private_dir(&config.root)?;
    perms::write_private(&config.shell_init_path(), posix_init_script(config).as_bytes())?;

    let init_path = if user.shell == ShellKind::Fish {
        perms::write_private(&config.fish_init_path(), fish_init_script(config).as_bytes())?;
        config.fish_init_path()
    } else {
        config.shell_init_path()
    };

    let rc_file = user.shell.rc_file(&user.home);
    let line = source_line(&init_path);
    let existing = match fs::read_to_string(&rc_file) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).at(&rc_file),
    };

    let rc_updated = !existing.lines().any(|l| l.trim() == line);
    if rc_updated {
        if let Some(parent) = rc_file.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        let mut updated = existing;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&format!("\n{}\n{}\n", RC_MARKER, line));
        fs::write(&rc_file, updated).at(&rc_file)?;
        debug!(rc = %rc_file.display(), "added source line");
    }

    Ok(InstallReport {
        init_path,
        rc_file,
        rc_updated,
    })
}

/// Remove our source and marker lines from every rc file and delete the
/// init scripts. Returns the rc files that changed.
pub fn uninstall(config: &Config, user: &TargetUser) -> Result<Vec<PathBuf>> {
    let ours = [
        source_line(&config.shell_init_path()),
        source_line(&config.fish_init_path()),
        RC_MARKER.to_string(),
    ];

    let mut changed = Vec::new();
    for rc in user.rc_candidates() {
        let body = match fs::read_to_string(&rc) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e).at(&rc),
        };
        let kept: Vec<&str> = body
            .lines()
            .filter(|l| !ours.iter().any(|o| l.trim() == o))
            .collect();
        if kept.len() == body.lines().count() {
            continue;
        }
        let mut rewritten = kept.join("\n");
        while rewritten.ends_with("\n\n") {
            rewritten.pop();
        }
        if !rewritten.is_empty() && !rewritten.ends_with('\n') {
            rewritten.push('\n');
        }
        fs::write(&rc, rewritten).at(&rc)?;
        changed.push(rc);
    }

    perms::remove_if_exists(&config.shell_init_path())?;
    perms::remove_if_exists(&config.fish_init_path())?;
    Ok(changed)
}

/// Whether an rc file sources our init script.
pub fn is_installed(config: &Config, user: &TargetUser) -> bool {
    let lines = [
        source_line(&config.shell_init_path()),
        source_line(&config.fish_init_path()),
    ];
    user.rc_candidates().iter().any(|rc| {
        fs::read_to_string(rc)
            .map(|body| body.lines().any(|l| lines.iter().any(|s| l.trim() == s)))
            .unwrap_or(false)
    })
}
