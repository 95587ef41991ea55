//! ak - keep developer credentials in one encrypted vault.

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ak::cli::output;
use ak::cli::{execute, expand_short_flags, extract_json, Cli};
use ak::core::config::Config;
use ak::core::constants::ENV_LOG;

fn main() {
    let args = std::env::args_os().map(|a| a.to_string_lossy().into_owned());
    let (args, json) = extract_json(expand_short_flags(args));

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            if json {
                let rendered = e.to_string();
                let first = rendered.lines().next().unwrap_or("invalid arguments");
                output::json_error(first.trim_start_matches("error: "));
            } else {
                let _ = e.print();
            }
            std::process::exit(1);
        }
    };

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("ak=debug")
        } else {
            EnvFilter::new("ak=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = Config::from_env().and_then(|config| execute(cli.command, &config, json));
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if json {
                output::json_error(&e.to_string());
            } else {
                output::error(&e.to_string());
                if let Some(hint) = e.hint() {
                    output::hint(hint);
                }
            }
            std::process::exit(e.exit_code());
        }
    }
}
