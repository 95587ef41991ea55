//! ak - a user-scoped secret manager for developer credentials.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── mod           # Argument model, short-flag expansion, dispatch
//! │   ├── output        # Colored terminal output
//! │   ├── secrets       # set/get/ls/rm/search/cp
//! │   ├── profiles      # save/load/unload/env/profiles
//! │   ├── transfer      # import/export/migrate
//! │   ├── run           # Run a command with a profile injected
//! │   ├── test          # Connectivity tests
//! │   ├── service       # User service catalog
//! │   ├── shell         # install-shell/uninstall/guard
//! │   └── admin         # doctor/audit/backend/purge/version/welcome
//! └── core/             # Core library components
//!     ├── config        # Paths and AK_* switches
//!     ├── session       # Backend choice, passphrase cache, audit sink
//!     ├── cipher/       # gpg invocation and passphrase files
//!     ├── codec         # base64 record framing
//!     ├── vault         # keys.env[.gpg]
//!     ├── profile       # Profile key lists and overrides
//!     ├── projector     # export/unset scripts and export formats
//!     ├── persist       # Directory mappings and auto-load bundles
//!     ├── catalog       # Provider descriptors
//!     ├── tester        # Parallel HTTP probes
//!     ├── shell         # Init scripts and rc wiring
//!     └── audit         # Append-only audit log
//! ```
//!
//! The CLI never mutates its parent shell. `load`, `unload` and `env` print
//! a script on stdout that the installed `ak` shell function evaluates.

pub mod cli;
pub mod core;
pub mod error;
