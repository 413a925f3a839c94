//! Declarative parameter schema.
//!
//! Tool parameters are described by `'static` [`Field`] tables built with
//! `const fn` constructors, so the whole catalog lives in read-only data.

use serde_json::{Map, Value, json};

/// Where a top-level argument goes in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Body,
}

/// Value type of a field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    String,
    Integer,
    Number,
    Boolean,
    /// A string restricted to the listed values.
    Enum(&'static [&'static str]),
    Array(&'static Kind),
    /// An object with declared fields; undeclared keys are dropped.
    Object(&'static [Field]),
    /// Any JSON value, passed through untouched.
    Any,
}

/// A default applied when an optional field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Num(f64),
    Bool(bool),
    Str(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            Self::Int(n) => Value::from(n),
            Self::Num(n) => Value::from(n),
            Self::Bool(b) => Value::Bool(b),
            Self::Str(s) => Value::from(s),
        }
    }
}

/// Bounds and defaults for a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub max_items: Option<usize>,
    pub default: Option<DefaultValue>,
}

impl Constraints {
    pub const NONE: Self = Self {
        min: None,
        max: None,
        max_items: None,
        default: None,
    };
}

/// One named parameter (or nested object member).
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub required: bool,
    pub location: Location,
    pub description: &'static str,
    pub constraints: Constraints,
}

impl Field {
    pub const fn new(name: &'static str, kind: Kind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            location: Location::Body,
            description,
            constraints: Constraints::NONE,
        }
    }

    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, Kind::String, description)
    }

    pub const fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, Kind::Integer, description)
    }

    pub const fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, Kind::Number, description)
    }

    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, Kind::Boolean, description)
    }

    pub const fn one_of(
        name: &'static str,
        values: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self::new(name, Kind::Enum(values), description)
    }

    pub const fn array(name: &'static str, items: &'static Kind, description: &'static str) -> Self {
        Self::new(name, Kind::Array(items), description)
    }

    pub const fn object(
        name: &'static str,
        fields: &'static [Field],
        description: &'static str,
    ) -> Self {
        Self::new(name, Kind::Object(fields), description)
    }

    pub const fn any(name: &'static str, description: &'static str) -> Self {
        Self::new(name, Kind::Any, description)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn in_path(mut self) -> Self {
        self.location = Location::Path;
        self.required = true;
        self
    }

    pub const fn in_query(mut self) -> Self {
        self.location = Location::Query;
        self
    }

    pub const fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub const fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    pub const fn max_items(mut self, max_items: usize) -> Self {
        self.constraints.max_items = Some(max_items);
        self
    }

    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.constraints.default = Some(value);
        self
    }

    /// JSON Schema for this field's value.
    pub fn schema(&self) -> Value {
        let mut schema = self.kind.schema();
        if let Value::Object(map) = &mut schema {
            if !self.description.is_empty() {
                map.insert("description".into(), Value::from(self.description));
            }
            let c = &self.constraints;
            if let Some(min) = c.min {
                map.insert("minimum".into(), Value::from(min));
            }
            if let Some(max) = c.max {
                map.insert("maximum".into(), Value::from(max));
            }
            if let Some(max_items) = c.max_items {
                map.insert("maxItems".into(), Value::from(max_items));
            }
            if let Some(default) = c.default {
                map.insert("default".into(), default.to_value());
            }
        }
        schema
    }
}

impl Kind {
    /// Short type name used in messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Any => "any",
        }
    }

    /// JSON Schema for a value of this kind.
    pub fn schema(&self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Integer => json!({"type": "integer"}),
            Self::Number => json!({"type": "number"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::Enum(values) => json!({"type": "string", "enum": values}),
            Self::Array(items) => json!({"type": "array", "items": items.schema()}),
            Self::Object(fields) => object_schema(fields),
            Self::Any => json!({}),
        }
    }
}

/// JSON Schema of an object with the given fields.
pub fn object_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        properties.insert(field.name.to_string(), field.schema());
    }

    let required: Vec<&str> = fields.iter().filter(|f| f.required).map(|f| f.name).collect();

    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: Field = Field::integer("page", "Page number")
        .in_query()
        .min(1.0)
        .default(DefaultValue::Int(1));
    const TAGS_KIND: Kind = Kind::String;
    const FIELDS: &[Field] = &[
        Field::string("invoice_id", "Invoice ID").in_path(),
        PAGE,
        Field::array("tags", &TAGS_KIND, "").max_items(3),
        Field::one_of("state", &["OPEN", "CLOSED"], "State"),
    ];

    #[test]
    fn builders_set_location_and_requiredness() {
        assert_eq!(FIELDS[0].location, Location::Path);
        assert!(FIELDS[0].required);
        assert_eq!(PAGE.location, Location::Query);
        assert!(!PAGE.required);
    }

    #[test]
    fn object_schema_lists_required_fields() {
        let schema = object_schema(FIELDS);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["invoice_id"]));
        assert_eq!(schema["properties"]["page"]["minimum"], 1.0);
        assert_eq!(schema["properties"]["page"]["default"], 1);
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["properties"]["tags"]["maxItems"], 3);
        assert!(schema["properties"]["tags"].get("description").is_none());
        assert_eq!(schema["properties"]["state"]["enum"], json!(["OPEN", "CLOSED"]));
    }

    #[test]
    fn schema_without_required_fields_omits_the_key() {
        let schema = object_schema(&[PAGE]);
        assert!(schema.get("required").is_none());
    }
}
