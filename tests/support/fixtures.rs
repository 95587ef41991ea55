//! Test fixtures and constants.

/// Standard test secrets used across multiple tests.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("OPENAI_API_KEY", "sk-test-1234567890abcdef"),
    ("JWT_SECRET", "super-secret-jwt-token"),
    ("REDIS_URL", "redis://localhost:6379"),
];

/// Sample .env file content for import tests.
pub const SAMPLE_ENV: &str = "KEY1=value1\nKEY2=value2\nKEY3=value3\n";

/// Sample .env with edge cases.
pub const SAMPLE_ENV_COMPLEX: &str = r#"
# This is a comment
SIMPLE=value
QUOTED="quoted value"
SINGLE_QUOTED='single $literal'
export EXPORTED=from-shell
EMPTY=
alias ll='ls -l'

# Another comment
SPECIAL_CHARS=p@ssw0rd!#%
"#;

/// A shell rc fragment as found in real dotfiles.
pub const SAMPLE_EXPORTS: &str = r#"
# tokens
export GITHUB_TOKEN="ghp_exampletoken"
export STRIPE_SECRET_KEY=sk_live_example
export PLACEHOLDER=omitted
export BLANK=""
if [[ -f ~/.local ]]; then source ~/.local; fi
"#;
