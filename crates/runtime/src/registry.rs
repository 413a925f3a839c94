//! The set of tools a server exposes.

use policy::ToolPolicy;
use std::collections::HashMap;
use tracing::debug;

use crate::catalog;
use crate::definition::ToolDefinition;
use crate::{Error, Result};

/// Tools keyed by dotted name, with identifier-safe aliases.
///
/// Lookup accepts either form, so `invoices.create` and `create_invoice`
/// resolve to the same definition.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<&'static ToolDefinition>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Build a registry from definitions, rejecting duplicate names.
    pub fn new(tools: impl IntoIterator<Item = &'static ToolDefinition>) -> Result<Self> {
        let mut registry = Self::default();
        for tool in tools {
            registry.insert(tool)?;
        }
        Ok(registry)
    }

    /// Every built-in tool.
    pub fn full() -> Result<Self> {
        Self::new(catalog::all())
    }

    /// The built-in tools selected by `policy`.
    ///
    /// Patterns that match no built-in tool are an error, as is a policy that
    /// leaves nothing selected.
    pub fn from_policy(policy: &ToolPolicy) -> Result<Self> {
        policy.validate(&catalog::names())?;

        let selected = catalog::all().filter(|tool| {
            let decision = policy.check(tool.name);
            if !decision.is_allowed() {
                debug!(tool = tool.name, ?decision, "tool not selected");
            }
            decision.is_allowed()
        });
        let registry = Self::new(selected)?;
        if registry.is_empty() {
            return Err(Error::NoTools);
        }
        Ok(registry)
    }

    fn insert(&mut self, tool: &'static ToolDefinition) -> Result<()> {
        for key in [tool.name, tool.alias] {
            if self.index.contains_key(key) {
                return Err(Error::DuplicateTool(key.to_string()));
            }
        }
        let slot = self.tools.len();
        self.index.insert(tool.name, slot);
        self.index.insert(tool.alias, slot);
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by dotted name or alias.
    pub fn get(&self, name: &str) -> Option<&'static ToolDefinition> {
        self.index.get(name).map(|&slot| self.tools[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tools in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &'static ToolDefinition> + '_ {
        self.tools.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|tool| tool.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
