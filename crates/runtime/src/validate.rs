//! Argument validation against a [`Field`] table.
//!
//! Every tool goes through the same validator: unknown keys are dropped,
//! defaults are filled in, loosely typed scalars are coerced to the declared
//! kind, and every problem is collected rather than stopping at the first.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::schema::{Constraints, Field, Kind};

/// One problem with the supplied arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path to the offending value, e.g. `items[0].quantity`.
    pub path: String,
    pub reason: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Validate `arguments` against `fields`, returning the normalized object.
///
/// `null` is treated as an empty argument object.
pub fn validate(fields: &[Field], arguments: Value) -> Result<Map<String, Value>, Vec<Violation>> {
    let input = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(vec![Violation::new(
                "",
                format!("arguments must be an object, got {}", json_type(&other)),
            )]);
        }
    };

    let mut violations = Vec::new();
    let output = validate_object(fields, input, "", &mut violations);
    if violations.is_empty() {
        Ok(output)
    } else {
        Err(violations)
    }
}

fn validate_object(
    fields: &[Field],
    mut input: Map<String, Value>,
    prefix: &str,
    violations: &mut Vec<Violation>,
) -> Map<String, Value> {
    let mut output = Map::new();

    for field in fields {
        let path = join(prefix, field.name);
        match input.remove(field.name) {
            None | Some(Value::Null) => {
                if let Some(default) = field.constraints.default {
                    output.insert(field.name.to_string(), default.to_value());
                } else if field.required {
                    violations.push(Violation::new(path, "is required"));
                }
            }
            Some(value) => {
                if let Some(value) =
                    validate_value(&field.kind, &field.constraints, value, &path, violations)
                {
                    output.insert(field.name.to_string(), value);
                }
            }
        }
    }

    output
}

fn validate_value(
    kind: &Kind,
    constraints: &Constraints,
    value: Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    let value = match kind {
        Kind::Any => value,
        Kind::String => match value {
            Value::String(s) => Value::String(s),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => return mismatch(kind, &other, path, violations),
        },
        Kind::Integer => match as_integer(&value) {
            Some(n) => Value::from(n),
            None => return mismatch(kind, &value, path, violations),
        },
        Kind::Number => match as_number(&value) {
            Some(n) => Value::Number(n),
            None => return mismatch(kind, &value, path, violations),
        },
        Kind::Boolean => match &value {
            Value::Bool(b) => Value::Bool(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
            _ => return mismatch(kind, &value, path, violations),
        },
        Kind::Enum(allowed) => {
            let Value::String(s) = &value else {
                return mismatch(kind, &value, path, violations);
            };
            match allowed.iter().find(|a| a.eq_ignore_ascii_case(s)) {
                Some(canonical) => Value::from(*canonical),
                None => {
                    violations.push(Violation::new(
                        path,
                        format!("must be one of {}, got {s:?}", allowed.join(", ")),
                    ));
                    return None;
                }
            }
        }
        Kind::Array(item) => {
            let items = match value {
                Value::Array(items) => items,
                other => return mismatch(kind, &other, path, violations),
            };
            if let Some(max) = constraints.max_items.filter(|max| items.len() > *max) {
                violations.push(Violation::new(
                    path,
                    format!("must have at most {max} items, got {}", items.len()),
                ));
                return None;
            }
            let items = items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    validate_value(item, &Constraints::NONE, v, &format!("{path}[{i}]"), violations)
                })
                .collect();
            Value::Array(items)
        }
        Kind::Object(fields) => {
            let map = match value {
                Value::Object(map) => map,
                other => return mismatch(kind, &other, path, violations),
            };
            Value::Object(validate_object(fields, map, path, violations))
        }
    };

    if let Some(n) = value.as_f64() {
        if let Some(min) = constraints.min.filter(|min| n < *min) {
            violations.push(Violation::new(path, format!("must be at least {min}, got {n}")));
            return None;
        }
        if let Some(max) = constraints.max.filter(|max| n > *max) {
            violations.push(Violation::new(path, format!("must be at most {max}, got {n}")));
            return None;
        }
    }

    Some(value)
}

fn mismatch(
    kind: &Kind,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    violations.push(Violation::new(
        path,
        format!("expected {}, got {}", kind.type_name(), json_type(value)),
    ));
    None
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
