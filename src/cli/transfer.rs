//! Import, export and migrate.

use std::fs;
use std::path::Path;

use serde_json::json;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::cli::{output, profiles, Context};
use crate::core::catalog::Catalog;
use crate::core::constants::DEFAULT_PROFILE;
use crate::core::import;
use crate::core::perms;
use crate::core::projector::{render, Format};
use crate::core::validation::validate_profile;
use crate::error::{Error, IoContext, Result, SecretError};

/// Guess a format from a file extension; env otherwise.
pub fn format_for(path: &Path) -> Format {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => Format::Json,
        Some("yaml") | Some("yml") => Format::Yaml,
        _ => Format::Env,
    }
}

/// Write a profile's resolved values in `format`.
pub fn export(ctx: &Context, profile: &str, format: Format, dest: Option<&Path>) -> Result<()> {
    validate_profile(profile)?;
    if !ctx.profiles().exists(profile) {
        return Err(SecretError::ProfileNotFound(profile.to_string()).into());
    }
    let pairs = profiles::projection(ctx, profile)?;
    let rendered = render(format, &pairs)?;
    let names: Vec<&String> = pairs.iter().map(|(n, _)| n).collect();

    let Some(dest) = dest else {
        output::raw(&rendered);
        ctx.session.audit("export", &names);
        return Ok(());
    };

    perms::write_private(dest, rendered.as_bytes())?;
    ctx.session.audit("export", &names);
    ctx.done(
        &format!(
            "exported {} keys from {} to {}",
            pairs.len(),
            profile,
            output::path(dest.display())
        ),
        json!({ "profile": profile, "format": format.to_string(), "count": pairs.len(), "output": dest }),
    )
}

/// Upsert parsed pairs in one vault write, then add their names to `profile`.
///
/// The profile is read before the vault changes. If writing it still fails,
/// the previous vault is put back so no imported value is left outside the
/// profile.
fn store_pairs(ctx: &Context, profile: &str, pairs: Vec<(String, String)>) -> Result<Vec<String>> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }
    let store = ctx.profiles();
    store.read(profile)?;

    let previous = ctx.vault().load()?;
    let mut vault = previous.clone();
    let mut names = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        vault.insert(name.clone(), Zeroizing::new(value.into_bytes()));
        names.push(name);
    }
    ctx.vault().save(&vault)?;

    if let Err(e) = store.extend(profile, &names) {
        warn!(error = %e, profile, "profile update failed; restoring vault");
        if let Err(restore) = ctx.vault().save(&previous) {
            return Err(Error::Other(format!(
                "{}; restoring the vault also failed ({}), so {} imported values are stored but not listed in profile {}",
                e,
                restore,
                names.len(),
                profile
            )));
        }
        return Err(e);
    }
    profiles::refresh_bundle(ctx, profile)?;
    Ok(names)
}

/// Read secrets from a file into the vault and a profile.
pub fn import(ctx: &Context, profile: &str, format: Option<Format>, file: &Path, known_only: bool) -> Result<()> {
    validate_profile(profile)?;
    let format = format.unwrap_or_else(|| format_for(file));
    let text = Zeroizing::new(fs::read_to_string(file).at(file)?);
    let mut pairs = import::parse(format, &text)?;
    debug!(parsed = pairs.len(), %format, "parsed import file");

    if known_only {
        let known = Catalog::load(ctx.config())?.known_key_names();
        pairs.retain(|(name, _)| {
            let keep = known.contains(name);
            if !keep {
                output::dimmed(&format!("skipping {} (not a known service key)", name));
            }
            keep
        });
    }
    pairs.retain(|(name, value)| {
        if value.is_empty() {
            output::warn(&format!("{} has an empty value; skipped", output::key(name)));
        }
        !value.is_empty()
    });

    let names = store_pairs(ctx, profile, pairs)?;
    ctx.session.audit("import", &names);
    ctx.done(
        &format!("imported {} keys into profile {}", names.len(), profile),
        json!({ "profile": profile, "keys": names }),
    )
}

/// Import `export NAME=value` lines into the vault and the default profile.
pub fn migrate_exports(ctx: &Context, file: &Path) -> Result<()> {
    let text = Zeroizing::new(fs::read_to_string(file).at(file)?);
    let pairs: Vec<(String, String)> = import::parse_env(&text)
        .into_iter()
        .filter(|(_, v)| !v.is_empty() && v != "omitted")
        .collect();

    let names = store_pairs(ctx, DEFAULT_PROFILE, pairs)?;
    ctx.session.audit("import", &names);
    ctx.done(
        &format!("migrated {} keys from {}", names.len(), output::path(file.display())),
        json!({ "profile": DEFAULT_PROFILE, "keys": names }),
    )
}
