//! Housekeeping commands: welcome, doctor, audit, backend, purge, version.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;

use chrono::Local;
use colored::Colorize;
use dialoguer::Confirm;
use serde_json::json;
use tracing::{debug, warn};

use crate::cli::{output, Context};
use crate::core::clipboard::Clipboard;
use crate::core::constants::DEFAULT_PROFILE;
use crate::core::perms;
use crate::core::persist::DirPersistence;
use crate::core::shell::{self, TargetUser};
use crate::error::{IoContext, Result};

/// Print the getting-started guide.
pub fn welcome(_ctx: &Context) -> Result<()> {
    println!("{} - keep developer credentials in one encrypted vault", "ak".bold());
    println!();
    println!("Getting started:");
    println!("  {}   store a secret (prompts for the value)", output::cmd("ak set OPENAI_API_KEY"));
    println!("  {}              list stored names, values masked", output::cmd("ak ls"));
    println!("  {}       group names into a profile", output::cmd("ak save dev NAME..."));
    println!("  {}       one-time setup for `ak load` in your shell", output::cmd("ak install-shell"));
    println!("  {}   export a profile into this shell", output::cmd("ak load dev --persist"));
    println!("  {}   run a command with the profile set", output::cmd("ak run -p dev -- CMD"));
    println!("  {}            check stored keys against providers", output::cmd("ak test"));
    println!();
    println!("Run {} for every command.", output::cmd("ak --help"));
    Ok(())
}

/// Report backend, tools and state.
pub fn doctor(ctx: &Context) -> Result<()> {
    let config = ctx.config();
    let backend = ctx.session.backend_name();
    let backend_error = ctx.session.backend().err().map(|e| e.to_string());
    let clipboard = Clipboard::detect().map(|c| c.name()).ok();
    let profiles = ctx.profiles().list()?;
    let vault = ctx.vault();
    let user = TargetUser::resolve(config);
    let shell_installed = shell::is_installed(config, &user);
    let mappings = DirPersistence::new(config).mapping_count();

    if ctx.json {
        return output::json(&json!({
            "backend": backend,
            "backendError": backend_error,
            "gpg": config.gpg,
            "clipboard": clipboard,
            "configRoot": config.root,
            "vault": vault.path(),
            "vaultExists": vault.exists(),
            "profiles": profiles.len(),
            "shellInstalled": shell_installed,
            "shell": user.shell.name(),
            "persistedDirs": mappings,
        }));
    }

    output::section("ak doctor");
    output::kv("backend", backend);
    if let Some(err) = &backend_error {
        output::warn(err);
    }
    output::kv(
        "gpg",
        config
            .gpg
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found".to_string()),
    );
    output::kv("clipboard", clipboard.unwrap_or("none"));
    output::kv("config", config.root.display());
    let state = if vault.exists() { "" } else { " (not created yet)" };
    output::kv("vault", format!("{}{}", vault.path().display(), state));
    output::kv("profiles", profiles.len());
    output::kv(
        "shell",
        format!(
            "{} ({})",
            user.shell.name(),
            if shell_installed { "installed" } else { "not installed" }
        ),
    );
    output::kv("auto-load", format!("{} directories", mappings));
    if !shell_installed {
        output::hint(&format!("enable `ak load` with {}", output::cmd("ak install-shell")));
    }
    Ok(())
}

/// Print the last `count` audit lines.
pub fn audit(ctx: &Context, count: usize) -> Result<()> {
    let lines = ctx.session.audit_sink().tail(count)?;
    if ctx.json {
        return output::json(&lines);
    }
    if lines.is_empty() {
        output::dimmed("audit log is empty");
    }
    for line in &lines {
        println!("{}", line);
    }
    Ok(())
}

pub fn backend(ctx: &Context) -> Result<()> {
    if ctx.json {
        return output::json(&json!({ "backend": ctx.session.backend_name() }));
    }
    println!("{}", ctx.session.backend_name());
    Ok(())
}

pub fn version(ctx: &Context) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if ctx.json {
        return output::json(&json!({ "version": version }));
    }
    println!("ak {}", version);
    Ok(())
}

/// Copy the vault and every profile file into a timestamped directory.
fn snapshot(ctx: &Context, vault_path: &Path) -> Result<std::path::PathBuf> {
    let config = ctx.config();
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dest = config.backups_dir().join(format!("purge_{}", stamp));
    perms::create_private_dir(&config.backups_dir())?;
    perms::create_private_dir(&dest)?;

    let mut sources = Vec::new();
    if vault_path.exists() {
        sources.push(vault_path.to_path_buf());
    }
    let profiles_dir = config.profiles_dir();
    if profiles_dir.exists() {
        for entry in fs::read_dir(&profiles_dir).at(&profiles_dir)? {
            let path = entry.at(&profiles_dir)?.path();
            if path.is_file() {
                sources.push(path);
            }
        }
    }

    let profile_dest = dest.join("profiles");
    for src in sources {
        let Some(name) = src.file_name() else { continue };
        let target = if src.starts_with(&profiles_dir) {
            perms::create_private_dir(&profile_dest)?;
            profile_dest.join(name)
        } else {
            dest.join(name)
        };
        fs::copy(&src, &target).at(&src)?;
        perms::restrict(&target)?;
    }
    debug!(dest = %dest.display(), "wrote purge snapshot");
    Ok(dest)
}

/// Whether there is anything beyond an empty default profile.
fn has_state(ctx: &Context) -> Result<bool> {
    if ctx.vault().exists() {
        return Ok(true);
    }
    let store = ctx.profiles();
    for profile in store.list()? {
        if profile != DEFAULT_PROFILE || !store.read(&profile)?.is_empty() {
            return Ok(true);
        }
        if !store.read_keys(&profile)?.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Delete every secret, profile and directory mapping.
pub fn purge(ctx: &Context, backup: bool, yes: bool) -> Result<()> {
    if !has_state(ctx)? {
        return ctx.done("nothing to purge", json!({ "purged": false }));
    }

    let vault = ctx.vault();
    let vault_path = vault.path();
    let names = match vault.list() {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, "could not read vault before purge");
            Vec::new()
        }
    };
    let profiles = ctx.profiles().list()?;

    if !yes && io::stdin().is_terminal() {
        let prompt = format!(
            "Delete {} secrets and {} profiles?",
            names.len(),
            profiles.len()
        );
        if !Confirm::new().with_prompt(prompt).default(false).interact()? {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    let backup_dir = if backup {
        Some(snapshot(ctx, &vault_path)?)
    } else {
        None
    };

    let config = ctx.config();
    perms::remove_if_exists(&vault_path)?;
    let profiles_dir = config.profiles_dir();
    match fs::remove_dir_all(&profiles_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).at(&profiles_dir),
    }
    DirPersistence::new(config).clear()?;
    config.ensure_dirs()?;
    ctx.profiles().ensure_default()?;
    ctx.session.forget_passphrase();
    ctx.session.audit("purge", &names);

    if let Some(dir) = &backup_dir {
        if !ctx.json {
            output::dimmed(&format!("backup written to {}", dir.display()));
        }
    }
    ctx.done(
        &format!("purged {} secrets and {} profiles", names.len(), profiles.len()),
        json!({
            "purged": true,
            "secrets": names.len(),
            "profiles": profiles.len(),
            "backup": backup_dir,
        }),
    )
}
