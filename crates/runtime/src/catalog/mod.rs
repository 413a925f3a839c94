//! The built-in PayPal tool catalog.

mod disputes;
mod invoices;
mod orders;
mod products;
mod shipments;
mod subscriptions;
mod transactions;

pub use transactions::MAX_WINDOW_DAYS;

use crate::definition::ToolDefinition;

/// Every built-in tool, grouped by product.
pub fn all() -> impl Iterator<Item = &'static ToolDefinition> {
    [
        invoices::TOOLS,
        products::TOOLS,
        subscriptions::TOOLS,
        shipments::TOOLS,
        orders::TOOLS,
        disputes::TOOLS,
        transactions::TOOLS,
    ]
    .into_iter()
    .flatten()
}

/// Dotted names of every built-in tool.
pub fn names() -> Vec<&'static str> {
    all().map(|tool| tool.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Kind, Location};
    use std::collections::HashSet;

    #[test]
    fn names_and_aliases_are_unique() {
        let mut seen = HashSet::new();
        for tool in all() {
            assert!(seen.insert(tool.name), "duplicate name {}", tool.name);
            assert!(seen.insert(tool.alias), "duplicate alias {}", tool.alias);
        }
        assert_eq!(names().len(), 26);
    }

    #[test]
    fn aliases_are_identifier_safe() {
        for tool in all() {
            assert!(
                tool.alias.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{}",
                tool.alias
            );
        }
    }

    #[test]
    fn every_tool_is_documented() {
        for tool in all() {
            assert!(!tool.title.is_empty(), "{} has no title", tool.name);
            assert!(!tool.description.is_empty(), "{} has no description", tool.name);
        }
    }

    #[test]
    fn path_placeholders_match_path_params() {
        for tool in all() {
            let placeholders: HashSet<&str> = tool
                .path
                .split('/')
                .filter_map(|s| s.strip_prefix('{')?.strip_suffix('}'))
                .collect();
            let path_params: HashSet<&str> = tool
                .params
                .iter()
                .filter(|p| p.location == Location::Path)
                .map(|p| p.name)
                .collect();
            assert_eq!(placeholders, path_params, "{}", tool.name);
        }
    }

    fn check_defaults(fields: &[Field], tool: &str) {
        for field in fields {
            if let Some(default) = field.constraints.default {
                assert!(!field.required, "{tool}: required field {} has a default", field.name);
                let value = default.to_value();
                let ok = match field.kind {
                    Kind::Enum(values) => value.as_str().is_some_and(|v| values.contains(&v)),
                    Kind::Integer => value.is_i64(),
                    Kind::Number => value.is_number(),
                    Kind::Boolean => value.is_boolean(),
                    Kind::String => value.is_string(),
                    _ => true,
                };
                assert!(ok, "{tool}: bad default for {}", field.name);
            }
            if let Kind::Object(nested) = field.kind {
                check_defaults(nested, tool);
            }
            if let Kind::Array(Kind::Object(nested)) = field.kind {
                check_defaults(nested, tool);
            }
        }
    }

    #[test]
    fn defaults_match_declared_kinds() {
        for tool in all() {
            check_defaults(tool.params, tool.name);
        }
    }
}
