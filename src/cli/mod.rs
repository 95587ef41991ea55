//! Command-line interface.
//!
//! Arguments go through two passes before clap sees them: clustered short
//! flags are rewritten to their long forms, then every `--json` ahead of a
//! `--` separator is pulled out as a global switch.

pub mod admin;
pub mod output;
pub mod profiles;
pub mod run;
pub mod secrets;
pub mod service;
pub mod shell;
pub mod transfer;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crate::core::catalog::{AuthLocation, AuthMethod, HttpMethod};
use crate::core::config::Config;
use crate::core::constants::AUDIT_TAIL_DEFAULT;
use crate::core::profile::ProfileStore;
use crate::core::projector::Format;
use crate::core::session::Session;
use crate::core::vault::Vault;
use crate::error::Result;

/// ak - keep developer credentials in one encrypted vault.
#[derive(Parser, Debug)]
#[command(
    name = "ak",
    about = "Keep developer credentials in one encrypted vault",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a short getting-started guide
    Welcome,

    /// Store a secret, prompting for its value
    Set {
        /// Secret name (e.g. OPENAI_API_KEY)
        name: String,
    },

    /// Store a secret non-interactively: NAME VALUE or NAME=VALUE
    Add {
        /// Also add the name to this profile
        #[arg(long)]
        profile: Option<String>,
        /// With --profile, keep the value in the profile instead of the vault
        #[arg(long, requires = "profile")]
        local: bool,
        name: String,
        /// Value; the remaining words are joined with spaces
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        value: Vec<String>,
    },

    /// Print a secret (masked unless --full)
    Get {
        name: String,
        #[arg(long)]
        full: bool,
    },

    /// List secret names with masked values
    Ls,

    /// Remove a secret, or a profile with --profile
    Rm {
        /// Treat NAME as a profile
        #[arg(long)]
        profile: bool,
        name: String,
    },

    /// Case-insensitive search over secret names
    Search { pattern: String },

    /// Copy a secret to the clipboard
    Cp { name: String },

    /// Write a profile's key list (all vault names if none are given)
    Save {
        profile: String,
        names: Vec<String>,
    },

    /// Print an export script for a profile
    Load {
        profile: String,
        /// Auto-load this profile in the current directory
        #[arg(long)]
        persist: bool,
    },

    /// Print an unset script for profiles (all if none are given)
    Unload {
        profiles: Vec<String>,
        /// Also stop auto-loading them in the current directory
        #[arg(long)]
        persist: bool,
    },

    /// Print an export script for a profile without persisting
    Env {
        #[arg(long, default_value = "default")]
        profile: String,
    },

    /// Write a profile's values to a file
    Export {
        #[arg(long, default_value = "default")]
        profile: String,
        #[arg(long, value_enum, default_value_t = Format::Env)]
        format: Format,
        /// Destination; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Read secrets from a file into the vault and a profile
    Import {
        #[arg(long, default_value = "default")]
        profile: String,
        /// Input format; guessed from the file extension when omitted
        #[arg(long, value_enum)]
        format: Option<Format>,
        #[arg(long)]
        file: PathBuf,
        /// Keep only names the service catalog knows
        #[arg(long)]
        keys: bool,
    },

    /// Run a command with a profile's values in its environment
    Run {
        #[arg(long, default_value = "default")]
        profile: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Test stored credentials against provider endpoints
    Test {
        /// Services to test; every configured service when omitted
        services: Vec<String>,
        /// Test every testable service
        #[arg(long, conflicts_with = "services")]
        all: bool,
        /// Resolve credentials from this profile first
        #[arg(long)]
        profile: Option<String>,
        /// Stop scheduling tests after the first failure
        #[arg(long)]
        fail_fast: bool,
    },

    /// Install or remove the git pre-commit secret scanner
    Guard {
        #[command(subcommand)]
        action: GuardAction,
    },

    /// Report backend, tools and state
    Doctor,

    /// Show the last audit log lines
    Audit {
        #[arg(default_value_t = AUDIT_TAIL_DEFAULT)]
        count: usize,
    },

    /// Install the shell integration
    InstallShell,

    /// Remove the shell integration (keeps secrets and profiles)
    Uninstall,

    /// Print the storage backend: gpg or plain
    Backend,

    /// Delete every secret and profile
    Purge {
        /// Skip the backup snapshot
        #[arg(long)]
        no_backup: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List profiles
    Profiles,

    /// Inspect or edit the service catalog
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },

    /// Bring secrets in from other tools
    Migrate {
        #[command(subcommand)]
        source: MigrateSource,
    },

    /// Print the version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum GuardAction {
    Enable,
    Disable,
}

#[derive(Subcommand, Debug)]
pub enum ServiceAction {
    /// List services
    Ls,
    /// Show one service
    Show { name: String },
    /// Add or replace a user service
    Add(ServiceSpec),
    /// Remove a user service
    Rm { name: String },
}

/// Fields of a user service descriptor.
#[derive(clap::Args, Debug)]
pub struct ServiceSpec {
    pub name: String,
    /// Environment variable holding the credential
    #[arg(long)]
    pub key: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// HTTPS endpoint probed by `ak test`
    #[arg(long)]
    pub endpoint: Option<String>,
    #[arg(long, value_enum, default_value_t = HttpMethod::Get)]
    pub method: HttpMethod,
    #[arg(long, value_enum, default_value_t = AuthMethod::Bearer)]
    pub auth: AuthMethod,
    #[arg(long, value_enum, default_value_t = AuthLocation::Header)]
    pub location: AuthLocation,
    #[arg(long, default_value = "Authorization")]
    pub parameter: String,
    /// Prefix before the credential; defaults to "Bearer " for bearer auth
    #[arg(long, allow_hyphen_values = true)]
    pub prefix: Option<String>,
    /// Request body; `{credential}` is replaced for body auth
    #[arg(long, allow_hyphen_values = true)]
    pub body: Option<String>,
    /// Extra header as NAME:VALUE (repeatable)
    #[arg(long = "header")]
    pub headers: Vec<String>,
    /// Alternative variable names (repeatable)
    #[arg(long = "alias")]
    pub aliases: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum MigrateSource {
    /// Import `export NAME=value` lines from a shell file
    Exports { file: PathBuf },
}

/// Short flags understood in clusters like `-pj`, and whether each takes a
/// value.
const SHORT_FLAGS: &[(char, &str, bool)] = &[
    ('p', "--profile", true),
    ('f', "--format", true),
    ('o', "--output", true),
    ('i', "--file", true),
    ('j', "--json", false),
    ('h', "--help", false),
    ('v', "--version", false),
];

fn long_flag(c: char) -> Option<(&'static str, bool)> {
    SHORT_FLAGS
        .iter()
        .find(|(s, _, _)| *s == c)
        .map(|(_, l, takes)| (*l, *takes))
}

/// Rewrite `-pj` style tokens into long flags. Tokens with any unknown
/// letter are left alone, as is everything after `--`.
///
/// In a cluster, value-taking flags claim the tokens that follow in order,
/// so `-pf dev json` reads as `--profile dev --format json`.
pub fn expand_short_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    let mut args = args.into_iter().peekable();
    while let Some(arg) = args.next() {
        if passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let expanded = arg
            .strip_prefix('-')
            .filter(|rest| !rest.is_empty() && !rest.starts_with('-'))
            .and_then(|rest| rest.chars().map(long_flag).collect::<Option<Vec<_>>>());
        let Some(flags) = expanded else {
            out.push(arg);
            continue;
        };
        let cluster = flags.len() > 1;
        for (long, takes_value) in flags {
            out.push(long.to_string());
            if cluster && takes_value {
                if let Some(value) = args.next_if(|a| a != "--") {
                    out.push(value);
                }
            }
        }
    }
    out
}

/// Remove `--json` tokens ahead of `--`; returns whether any was present.
pub fn extract_json(args: Vec<String>) -> (Vec<String>, bool) {
    let mut json = false;
    let mut passthrough = false;
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if !passthrough && arg == "--json" {
            json = true;
            continue;
        }
        if arg == "--" {
            passthrough = true;
        }
        out.push(arg);
    }
    (out, json)
}

/// Everything a command needs.
pub struct Context<'a> {
    pub session: &'a Session<'a>,
    pub json: bool,
}

impl<'a> Context<'a> {
    pub fn config(&self) -> &'a Config {
        self.session.config()
    }

    pub fn vault(&self) -> Vault<'a> {
        Vault::new(self.session)
    }

    pub fn profiles(&self) -> ProfileStore<'a> {
        ProfileStore::new(self.session)
    }

    /// Report a finished mutation: `{"ok":true,...detail}` under `--json`,
    /// a success line otherwise.
    pub fn done(&self, message: &str, detail: Value) -> Result<()> {
        if self.json {
            let mut object = Map::new();
            object.insert("ok".to_string(), Value::Bool(true));
            if let Value::Object(fields) = detail {
                object.extend(fields);
            }
            output::json(&Value::Object(object))
        } else {
            output::success(message);
            Ok(())
        }
    }
}

/// Run a parsed command. Returns the process exit code.
pub fn execute(command: Option<Command>, config: &Config, json: bool) -> Result<i32> {
    use Command::*;

    let session = Session::new(config);
    let ctx = Context {
        session: &session,
        json,
    };
    config.ensure_dirs()?;
    ctx.profiles().ensure_default()?;

    let Some(command) = command else {
        return admin::welcome(&ctx).map(|_| 0);
    };

    match command {
        Welcome => admin::welcome(&ctx)?,
        Set { name } => secrets::set(&ctx, &name)?,
        Add {
            profile,
            local,
            name,
            value,
        } => secrets::add(&ctx, profile.as_deref(), local, &name, &value)?,
        Get { name, full } => secrets::get(&ctx, &name, full)?,
        Ls => secrets::ls(&ctx)?,
        Rm { profile: true, name } => secrets::rm_profile(&ctx, &name)?,
        Rm { name, .. } => secrets::rm(&ctx, &name)?,
        Search { pattern } => secrets::search(&ctx, &pattern)?,
        Cp { name } => secrets::cp(&ctx, &name)?,
        Save { profile, names } => profiles::save(&ctx, &profile, &names)?,
        Load { profile, persist } => profiles::load(&ctx, &profile, persist)?,
        Unload { profiles: names, persist } => profiles::unload(&ctx, &names, persist)?,
        Env { profile } => profiles::env(&ctx, &profile)?,
        Profiles => profiles::list(&ctx)?,
        Export {
            profile,
            format,
            output,
        } => transfer::export(&ctx, &profile, format, output.as_deref())?,
        Import {
            profile,
            format,
            file,
            keys,
        } => transfer::import(&ctx, &profile, format, &file, keys)?,
        Migrate {
            source: MigrateSource::Exports { file },
        } => transfer::migrate_exports(&ctx, &file)?,
        Run { profile, command } => return run::execute(&ctx, &profile, &command),
        Test {
            services,
            all,
            profile,
            fail_fast,
        } => return test::execute(&ctx, &services, all, profile.as_deref(), fail_fast),
        Guard { action } => shell::guard(&ctx, action)?,
        InstallShell => shell::install(&ctx)?,
        Uninstall => shell::uninstall(&ctx)?,
        Doctor => admin::doctor(&ctx)?,
        Audit { count } => admin::audit(&ctx, count)?,
        Backend => admin::backend(&ctx)?,
        Purge { no_backup, yes } => admin::purge(&ctx, !no_backup, yes)?,
        Service { action } => service::execute(&ctx, action)?,
        Version => admin::version(&ctx)?,
    }
    Ok(0)
}
