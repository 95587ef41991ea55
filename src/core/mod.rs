//! Core library components.
//!
//! Storage, encryption, projection and the provider catalog. Nothing in
//! here prints to the terminal; the CLI layer owns presentation.

pub mod audit;
pub mod catalog;
pub mod cipher;
pub mod clipboard;
pub mod codec;
pub mod config;
pub mod constants;
pub mod guard;
pub mod import;
pub mod perms;
pub mod persist;
pub mod profile;
pub mod projector;
pub mod session;
pub mod shell;
pub mod tester;
pub mod validation;
pub mod vault;
