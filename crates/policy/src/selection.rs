//! Tool selection and enforcement.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Selects which tools a server exposes.
///
/// Patterns are exact tool names (`invoices.create`), a product wildcard
/// (`invoices.*`), or `*` / `all` for everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicy {
    /// Tools that are explicitly selected.
    #[serde(default)]
    pub allow: Vec<String>,

    /// Tools that are explicitly excluded (overrides allow).
    #[serde(default)]
    pub deny: Vec<String>,
}

/// Result of a selection check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl ToolPolicy {
    /// Load a policy from a TOML file with top-level `allow`/`deny` keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a policy from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Build a policy from a `--tools` style list: `all` or `a.b,c.d`.
    pub fn from_list(list: &str) -> Result<Self> {
        let allow: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();

        if allow.is_empty() {
            return Err(Error::Invalid("no tools given".to_string()));
        }

        Ok(Self {
            allow,
            deny: Vec::new(),
        })
    }

    /// Whether no tool can ever be selected.
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty()
    }

    /// Check every pattern against the known tool names. A pattern that
    /// matches nothing is an error listing the accepted names.
    pub fn validate(&self, known: &[&str]) -> Result<()> {
        for pattern in self.allow.iter().chain(&self.deny) {
            if !known.iter().any(|name| matches(pattern, name)) {
                return Err(Error::UnknownTool {
                    name: pattern.clone(),
                    accepted: known.iter().map(|s| s.to_string()).collect(),
                });
            }
        }
        Ok(())
    }

    /// Check if a tool is selected.
    pub fn check(&self, tool: &str) -> Decision {
        if let Some(pattern) = self.deny.iter().find(|p| matches(p, tool)) {
            return Decision::Deny {
                reason: format!("{tool} is denied by policy ({pattern})"),
            };
        }

        if self.allow.iter().any(|p| matches(p, tool)) {
            Decision::Allow
        } else {
            Decision::Deny {
                reason: format!("{tool} not in allowlist"),
            }
        }
    }
}

fn matches(pattern: &str, tool: &str) -> bool {
    if pattern == "*" || pattern.eq_ignore_ascii_case("all") {
        return true;
    }
    if let Some(product) = pattern.strip_suffix(".*") {
        return tool
            .strip_prefix(product)
            .is_some_and(|rest| rest.starts_with('.'));
    }
    pattern == tool
}
