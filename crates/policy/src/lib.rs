//! Tool-selection policy.
//!
//! Core principle: **a tool is dispatchable only if it is explicitly selected.**
//!
//! Selections come from a `--tools` list (`all` or comma-separated names) or
//! from the `[tools]` table of a TOML file, with `deny` overriding `allow`.

mod error;
mod selection;

pub use error::{Error, Result};
pub use selection::{Decision, ToolPolicy};
