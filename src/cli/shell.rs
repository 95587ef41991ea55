//! Shell integration and the git guard hook.

use std::env;

use serde_json::json;

use crate::cli::{output, Context, GuardAction};
use crate::core::guard::{self, Removal};
use crate::core::shell::{self, TargetUser};
use crate::error::Result;

/// Write the init script and source it from the user's rc file.
pub fn install(ctx: &Context) -> Result<()> {
    let user = TargetUser::resolve(ctx.config());
    let report = shell::install(ctx.config(), &user)?;

    if ctx.json {
        return output::json(&json!({
            "ok": true,
            "user": user.name,
            "shell": user.shell.name(),
            "init": report.init_path,
            "rc": report.rc_file,
            "updated": report.rc_updated,
        }));
    }
    if report.rc_updated {
        output::success(&format!(
            "installed shell integration in {}",
            output::path(report.rc_file.display())
        ));
    } else {
        output::success(&format!(
            "shell integration already present in {}",
            output::path(report.rc_file.display())
        ));
    }
    output::hint(&format!(
        "reload with {} or open a new terminal",
        output::cmd(&format!("source {}", report.rc_file.display()))
    ));
    Ok(())
}

/// Remove the rc lines and init scripts. Secrets and profiles stay.
pub fn uninstall(ctx: &Context) -> Result<()> {
    let user = TargetUser::resolve(ctx.config());
    let changed = shell::uninstall(ctx.config(), &user)?;
    if !ctx.json {
        for rc in &changed {
            output::dimmed(&format!("cleaned {}", rc.display()));
        }
    }
    ctx.done(
        "removed shell integration (secrets and profiles kept)",
        json!({ "rcFiles": changed }),
    )
}

pub fn guard(ctx: &Context, action: GuardAction) -> Result<()> {
    let cwd = env::current_dir()?;
    match action {
        GuardAction::Enable => {
            let hook = guard::enable(&cwd)?;
            ctx.done(
                &format!("guard installed at {}", output::path(hook.display())),
                json!({ "hook": hook }),
            )
        }
        GuardAction::Disable => match guard::disable(&cwd)? {
            Removal::Removed(hook) => ctx.done(
                &format!("guard removed from {}", output::path(hook.display())),
                json!({ "hook": hook, "removed": true }),
            ),
            Removal::NotInstalled => ctx.done(
                "guard was not installed",
                json!({ "removed": false }),
            ),
            Removal::Foreign(hook) => {
                output::warn(&format!(
                    "{} was not installed by ak; left in place",
                    output::path(hook.display())
                ));
                ctx.done("nothing removed", json!({ "hook": hook, "removed": false }))
            }
            Removal::NotRepository => Err(crate::error::Error::Usage(
                "not a git repository".to_string(),
            )),
        },
    }
}
