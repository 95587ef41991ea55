//! Secret commands: set, add, get, ls, rm, search, cp.

use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Read, Write};

use dialoguer::Password;
use serde_json::json;
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::{output, profiles, Context};
use crate::core::clipboard::Clipboard;
use crate::core::codec;
use crate::core::persist::DirPersistence;
use crate::core::validation::{mask, validate_key, validate_profile, validate_value};
use crate::error::{Error, Result};

/// Read a value from piped stdin, or prompt with hidden input.
fn read_value(name: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut input = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut input)?;
        let trimmed = input.trim_end_matches(['\n', '\r']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }
    Ok(Zeroizing::new(
        Password::new()
            .with_prompt(format!("Value for {}", output::key(name)))
            .interact()?,
    ))
}

/// Store a secret, prompting for its value.
pub fn set(ctx: &Context, name: &str) -> Result<()> {
    validate_key(name)?;
    let value = read_value(name)?;
    validate_value(name, &value)?;

    let existed = ctx.vault().put(name, value.as_bytes())?;
    ctx.session.audit(if existed { "update" } else { "add" }, &[name]);
    ctx.done(
        &format!("{} {}", if existed { "updated" } else { "stored" }, output::key(name)),
        json!({ "name": name, "updated": existed }),
    )
}

/// Split `NAME VALUE...` or `NAME=VALUE` into its parts.
fn split_assignment(name: &str, words: &[String]) -> (String, Option<String>) {
    if !words.is_empty() {
        return (name.to_string(), Some(words.join(" ")));
    }
    match name.split_once('=') {
        Some((n, v)) => (n.to_string(), Some(v.to_string())),
        None => (name.to_string(), None),
    }
}

/// Store a secret non-interactively, optionally into a profile.
pub fn add(ctx: &Context, profile: Option<&str>, local: bool, raw_name: &str, words: &[String]) -> Result<()> {
    let (name, value) = split_assignment(raw_name, words);
    validate_key(&name)?;
    let value = match value {
        Some(v) => Zeroizing::new(v),
        None if !io::stdin().is_terminal() => read_value(&name)?,
        None => {
            return Err(Error::Usage(format!(
                "missing value: ak add {} VALUE (or {}=VALUE)",
                name, name
            )))
        }
    };
    validate_value(&name, &value)?;

    let Some(profile) = profile else {
        let existed = ctx.vault().put(&name, value.as_bytes())?;
        ctx.session.audit(if existed { "update" } else { "add" }, &[&name]);
        return ctx.done(
            &format!("{} {}", if existed { "updated" } else { "stored" }, output::key(&name)),
            json!({ "name": name, "updated": existed }),
        );
    };

    validate_profile(profile)?;
    let store = ctx.profiles();
    let existed = if local {
        let mut overrides = store.read_keys(profile)?;
        let existed = overrides.insert(name.clone(), codec::bytes(&value)).is_some();
        store.write_keys(profile, &overrides)?;
        ctx.session.audit(if existed { "update_profile" } else { "add_profile" }, &[&name]);
        existed
    } else {
        let existed = ctx.vault().put(&name, value.as_bytes())?;
        ctx.session.audit(if existed { "update" } else { "add" }, &[&name]);
        existed
    };
    store.extend(profile, &[&name])?;
    profiles::refresh_bundle(ctx, profile)?;

    info!(profile, local, "added secret to profile");
    let place = if local { "profile-local value" } else { "value" };
    ctx.done(
        &format!(
            "{} {} {} in profile {}",
            if existed { "updated" } else { "stored" },
            place,
            output::key(&name),
            profile
        ),
        json!({ "name": name, "profile": profile, "local": local, "updated": existed }),
    )
}

/// Print a secret, masked unless `full`.
///
/// `--full` writes the stored bytes unchanged so binary values survive a
/// pipe.
pub fn get(ctx: &Context, name: &str, full: bool) -> Result<()> {
    let value = ctx.vault().get(name)?;
    ctx.session.audit("get", &[name]);
    if ctx.json {
        let shown = if full {
            codec::text(&value)
        } else {
            Zeroizing::new(mask(&codec::text(&value)))
        };
        return output::json(&json!({ "name": name, "value": shown.as_str(), "masked": !full }));
    }
    if !full {
        println!("{}", mask(&codec::text(&value)));
        return Ok(());
    }
    // Plain output for scripting - no decoration
    let mut out = io::stdout().lock();
    out.write_all(&value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// List names with masked values.
pub fn ls(ctx: &Context) -> Result<()> {
    let map = ctx.vault().load()?;
    let names: Vec<&String> = map.keys().collect();
    ctx.session.audit("ls", &names);

    if ctx.json {
        let items: Vec<_> = map
            .iter()
            .map(|(k, v)| json!({ "name": k, "masked": mask(&codec::text(v)) }))
            .collect();
        return output::json(&items);
    }
    if map.is_empty() {
        output::dimmed("no secrets stored");
        output::hint(&format!("add one with {}", output::cmd("ak set NAME")));
        return Ok(());
    }
    for (name, value) in &map {
        println!("{:<34} {}", name, mask(&codec::text(value)));
    }
    Ok(())
}

/// Delete a secret and drop it from profiles that have no override for it.
pub fn rm(ctx: &Context, name: &str) -> Result<()> {
    ctx.vault().delete(name)?;

    let store = ctx.profiles();
    let dropped: BTreeSet<String> = [name.to_string()].into();
    let mut touched = Vec::new();
    for profile in store.list()? {
        if store.read_keys(&profile)?.contains_key(name) {
            continue;
        }
        if store.retain_without(&profile, &dropped)? {
            profiles::refresh_bundle(ctx, &profile)?;
            touched.push(profile);
        }
    }

    ctx.session.audit("rm", &[name]);
    ctx.done(
        &format!("removed {}", output::key(name)),
        json!({ "name": name, "profiles": touched }),
    )
}

/// Delete a profile, its override map, its bundle and its directory
/// mappings.
pub fn rm_profile(ctx: &Context, profile: &str) -> Result<()> {
    ctx.profiles().delete(profile)?;
    let dirs = DirPersistence::new(ctx.config()).forget_profile(profile)?;
    let none: [&str; 0] = [];
    ctx.session.audit("rm_profile", &none);
    ctx.done(
        &format!("removed profile {}", profile),
        json!({ "profile": profile, "unmapped": dirs }),
    )
}

/// Names containing `pattern`, ignoring case.
pub fn search(ctx: &Context, pattern: &str) -> Result<()> {
    let needle = pattern.to_lowercase();
    let hits: Vec<String> = ctx
        .vault()
        .list()?
        .into_iter()
        .filter(|n| n.to_lowercase().contains(&needle))
        .collect();
    ctx.session.audit("search", &hits);

    if ctx.json {
        return output::json(&hits);
    }
    if hits.is_empty() {
        output::dimmed(&format!("no names match '{}'", pattern));
    }
    for hit in &hits {
        println!("{}", hit);
    }
    Ok(())
}

/// Copy a secret's value to the clipboard.
pub fn cp(ctx: &Context, name: &str) -> Result<()> {
    let clipboard = Clipboard::detect()?;
    let value = ctx.vault().get(name)?;
    clipboard.copy(&value)?;
    ctx.session.audit("cp", &[name]);
    ctx.done(
        &format!("copied {} to clipboard", output::key(name)),
        json!({ "name": name, "tool": clipboard.name() }),
    )
}
