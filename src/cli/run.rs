//! Run command.
//!
//! Executes a command with a profile's values injected as environment
//! variables. On unix the process is replaced; elsewhere the child's exit
//! code is passed through.

use std::process::Command;

use tracing::debug;

use crate::cli::{profiles, Context};
use crate::core::validation::validate_profile;
use crate::error::{Error, Result, SecretError};

/// Build the child command with the profile's values in its environment.
fn prepare(ctx: &Context, profile: &str, command: &[String]) -> Result<Command> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Usage("no command specified".to_string()))?;
    validate_profile(profile)?;
    if !ctx.profiles().exists(profile) {
        return Err(SecretError::ProfileNotFound(profile.to_string()).into());
    }

    let pairs = profiles::projection(ctx, profile)?;
    let names: Vec<&String> = pairs.iter().map(|(n, _)| n).collect();
    ctx.session.audit("load", &names);
    debug!(profile, count = pairs.len(), program = %program, "running command");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(cmd)
}

/// Run `command` under `profile`. Only returns on failure to start, or on
/// platforms without `exec`.
pub fn execute(ctx: &Context, profile: &str, command: &[String]) -> Result<i32> {
    let mut cmd = prepare(ctx, profile, command)?;

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = cmd.exec();
        Err(Error::Other(format!("failed to run {}: {}", command[0], err)))
    }

    #[cfg(not(unix))]
    {
        let status = cmd.status()?;
        Ok(status.code().unwrap_or(1))
    }
}
