//! Constants used throughout ak.
//!
//! Centralizes magic strings and configuration values.

/// Directory name under the XDG config home.
pub const APP_DIR: &str = "ak";

/// Name of the profile that always exists.
pub const DEFAULT_PROFILE: &str = "default";

/// Opt-out switch for gpg; the vault is then stored as plain framed text.
pub const ENV_DISABLE_GPG: &str = "AK_DISABLE_GPG";

/// Preset vault passphrase for non-interactive use.
pub const ENV_PASSPHRASE: &str = "AK_PASSPHRASE";

/// Set by the installed shell wrapper when it evaluates our stdout.
pub const ENV_WRAPPER_ACTIVE: &str = "AK_SHELL_WRAPPER_ACTIVE";

/// Print per-test diagnostics from `ak test` to stderr.
pub const ENV_DEBUG_TESTS: &str = "AK_DEBUG_TESTS";

/// Log filter override.
pub const ENV_LOG: &str = "AK_LOG";

/// Prefix of short-lived passphrase files.
pub const PASSFILE_PREFIX: &str = ".ak-pass-";

/// Constant mixed with the user name to derive the bundle passphrase.
pub const BUNDLE_PASSPHRASE_PREFIX: &str = "ak-persist-";

/// Length of `instance.id`.
pub const INSTANCE_ID_LEN: usize = 24;

/// Hex digits kept from SHA-256 for audit hashes and mapping filenames.
pub const HASH_PREFIX_LEN: usize = 16;

/// Line written above the `source` line in shell rc files.
pub const RC_MARKER: &str = "# Added by ak installer";

/// First line of the git hook installed by `ak guard enable`.
pub const GUARD_MARKER: &str = "# ak-guard";

/// Concurrent connectivity probes.
pub const TEST_WORKERS: usize = 8;

/// Probe connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Probe total timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 12;

/// Default number of lines shown by `ak audit`.
pub const AUDIT_TAIL_DEFAULT: usize = 10;

/// Environment names `import --keys` accepts besides catalog key names.
pub const COMPANION_KEYS: &[&str] = &[
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "GOOGLE_CLOUD_PROJECT",
    "AZURE_CLIENT_SECRET",
    "AZURE_TENANT_ID",
    "GITHUB_CLIENT_ID",
    "GITHUB_CLIENT_SECRET",
    "DOCKER_USERNAME",
    "DOCKER_PASSWORD",
    "STRIPE_PUBLISHABLE_KEY",
    "SENDGRID_FROM_EMAIL",
    "TWILIO_ACCOUNT_SID",
    "SLACK_WEBHOOK_URL",
    "DISCORD_CLIENT_ID",
    "DISCORD_CLIENT_SECRET",
];
