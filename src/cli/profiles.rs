//! Profile commands: save, load, unload, env, profiles.
//!
//! `load`, `unload` and `env` write shell code to stdout for the wrapper
//! function to evaluate. They keep doing so under `--json`, which only
//! silences the not-applied warning.

use std::env;
use std::io::{self, IsTerminal};

use serde_json::json;
use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::{output, Context};
use crate::core::codec::SecretMap;
use crate::core::constants::ENV_WRAPPER_ACTIVE;
use crate::core::persist::{physical_dir, DirPersistence};
use crate::core::profile::resolve_values;
use crate::core::projector::{export_script, unset_script};
use crate::core::validation::validate_profile;
use crate::error::Result;

/// Resolved `(name, value)` pairs for a profile.
///
/// The vault is only opened when some listed name lacks an override, so an
/// empty profile never asks for a passphrase.
pub fn projection(ctx: &Context, profile: &str) -> Result<Vec<(String, Zeroizing<String>)>> {
    let store = ctx.profiles();
    let names = store.read(profile)?;
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let overrides = store.read_keys(profile)?;
    let vault = if names.iter().all(|n| overrides.contains_key(n)) {
        SecretMap::new()
    } else {
        ctx.vault().load()?
    };
    Ok(resolve_values(&names, &overrides, &vault))
}

/// Re-project a profile's bundle if it has one.
pub fn refresh_bundle(ctx: &Context, profile: &str) -> Result<()> {
    let persist = DirPersistence::new(ctx.config());
    if !persist.bundle_path(profile).exists() {
        return Ok(());
    }
    let script = export_script(&projection(ctx, profile)?);
    if persist.refresh_bundle(profile, &script)? {
        debug!(profile, "refreshed bundle");
    }
    Ok(())
}

fn warn_if_not_applied(ctx: &Context, verb: &str, args: &str) {
    if ctx.json || env::var_os(ENV_WRAPPER_ACTIVE).is_some() || !io::stdout().is_terminal() {
        return;
    }
    output::warn("not applied to the current shell");
    output::hint(&format!(
        "use {} or install the shell integration with {}",
        output::cmd(&format!("eval \"$(ak {} {})\"", verb, args)),
        output::cmd("ak install-shell")
    ));
}

/// Write a profile's key list. With no names, every vault name is used.
pub fn save(ctx: &Context, profile: &str, names: &[String]) -> Result<()> {
    validate_profile(profile)?;
    let store = ctx.profiles();
    let vault = ctx.vault().load()?;

    let chosen: Vec<String> = if names.is_empty() {
        vault.keys().cloned().collect()
    } else {
        let overrides = store.read_keys(profile)?;
        let mut kept = Vec::new();
        for name in names {
            if vault.contains_key(name) || overrides.contains_key(name) {
                kept.push(name.clone());
            } else {
                output::warn(&format!("{} is not in the vault; skipped", output::key(name)));
            }
        }
        kept
    };

    store.write(profile, &chosen)?;
    refresh_bundle(ctx, profile)?;
    ctx.session.audit("save", &chosen);
    ctx.done(
        &format!("saved profile {} ({} keys)", profile, chosen.len()),
        json!({ "profile": profile, "keys": chosen }),
    )
}

/// Print a profile's export script, optionally persisting it for the cwd.
pub fn load(ctx: &Context, profile: &str, persist: bool) -> Result<()> {
    validate_profile(profile)?;
    let store = ctx.profiles();
    if !store.exists(profile) {
        let none: [&str; 0] = [];
        store.write(profile, &none)?;
        debug!(profile, "created empty profile on load");
    }

    warn_if_not_applied(ctx, "load", profile);
    let pairs = projection(ctx, profile)?;
    let script = export_script(&pairs);
    output::raw(&script);

    if persist {
        let dir = physical_dir(&env::current_dir()?)?;
        let persistence = DirPersistence::new(ctx.config());
        persistence.add(&dir, &[profile.to_string()])?;
        if persistence.write_bundle(profile, &script)? {
            output::success(&format!("profile {} will auto-load in {}", profile, output::path(&dir)));
        } else {
            output::warn("mapping saved, but no bundle was written; auto-load needs gpg");
        }
    }

    let names: Vec<&String> = pairs.iter().map(|(n, _)| n).collect();
    ctx.session.audit("load", &names);
    Ok(())
}

/// `load` without persistence.
pub fn env(ctx: &Context, profile: &str) -> Result<()> {
    load(ctx, profile, false)
}

/// Print an unset script for the named profiles, or all of them.
pub fn unload(ctx: &Context, profiles: &[String], persist: bool) -> Result<()> {
    let store = ctx.profiles();
    let targets = if profiles.is_empty() {
        store.list()?
    } else {
        for p in profiles {
            validate_profile(p)?;
        }
        profiles.to_vec()
    };

    let mut names = Vec::new();
    for profile in &targets {
        names.extend(store.read(profile)?);
    }

    warn_if_not_applied(ctx, "unload", &targets.join(" "));
    output::raw(&unset_script(&names));
    ctx.session.audit("unload", &names);

    if persist {
        let dir = physical_dir(&env::current_dir()?)?;
        let remaining = DirPersistence::new(ctx.config()).remove(&dir, &targets)?;
        debug!(remaining = remaining.len(), "updated directory mapping");
        output::success(&format!("stopped auto-loading in {}", output::path(&dir)));
    }
    Ok(())
}

/// List profile names.
pub fn list(ctx: &Context) -> Result<()> {
    let names = ctx.profiles().list()?;
    if ctx.json {
        return output::json(&names);
    }
    for name in &names {
        println!("{}", name);
    }
    Ok(())
}
