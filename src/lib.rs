//! Compose `AGENTS.md` from modular markdown rule fragments.
//!
//! A run goes through four stages:
//!
//! 1. [`ruleset`]: read and validate `agent-ruleset.json`
//! 2. [`source`]: resolve the rules source (local directory or cached GitHub checkout)
//! 3. [`collect`]: gather `global/`, `domains/<name>/` and extra fragments in order
//! 4. [`compose`]: render the document and write it with its companion file
//!
//! [`commands`] wires the stages together for the CLI.

pub mod collect;
pub mod commands;
pub mod compose;
pub mod error;
pub mod ruleset;
pub mod source;

pub use error::{ComposeError, Result, SchemaViolation};
