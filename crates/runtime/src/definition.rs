//! Tool definitions and request rendering.

use serde_json::{Map, Value};
use std::fmt;

use crate::backend::ApiRequest;
use crate::schema::{Field, Location, object_schema};
use crate::validate::Violation;

/// HTTP method of a tool's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a request body from validated arguments.
pub type BodyBuilder = fn(&Map<String, Value>) -> Result<Value, Vec<Violation>>;

/// Adjusts validated arguments before rendering (cross-field rules, derived
/// defaults).
pub type Prepare = fn(&mut Map<String, Value>) -> Result<(), Vec<Violation>>;

/// How the request body is produced.
#[derive(Debug, Clone, Copy)]
pub enum Body {
    /// No body.
    None,
    /// An empty JSON object.
    Empty,
    /// Every body-located argument, as one object.
    Fields,
    /// The value of one argument is the whole body.
    Field(&'static str),
    /// A tool-specific shaper.
    Build(BodyBuilder),
}

/// Static description of one tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolDefinition {
    /// Dotted name, e.g. `invoices.create`.
    pub name: &'static str,
    /// Identifier-safe alias exposed to MCP clients, e.g. `create_invoice`.
    pub alias: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub http_method: HttpMethod,
    /// Endpoint path with `{param}` placeholders.
    pub path: &'static str,
    pub params: &'static [Field],
    pub body: Body,
    pub prepare: Option<Prepare>,
}

impl ToolDefinition {
    const fn new(
        name: &'static str,
        alias: &'static str,
        http_method: HttpMethod,
        path: &'static str,
        body: Body,
    ) -> Self {
        Self {
            name,
            alias,
            title: "",
            description: "",
            http_method,
            path,
            params: &[],
            body,
            prepare: None,
        }
    }

    pub const fn get(name: &'static str, alias: &'static str, path: &'static str) -> Self {
        Self::new(name, alias, HttpMethod::Get, path, Body::None)
    }

    pub const fn post(name: &'static str, alias: &'static str, path: &'static str) -> Self {
        Self::new(name, alias, HttpMethod::Post, path, Body::Fields)
    }

    pub const fn patch(name: &'static str, alias: &'static str, path: &'static str) -> Self {
        Self::new(name, alias, HttpMethod::Patch, path, Body::Fields)
    }

    pub const fn titled(mut self, title: &'static str) -> Self {
        self.title = title;
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn params(mut self, params: &'static [Field]) -> Self {
        self.params = params;
        self
    }

    pub const fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub const fn prepare(mut self, prepare: Prepare) -> Self {
        self.prepare = Some(prepare);
        self
    }

    /// JSON Schema describing the tool's arguments.
    pub fn input_schema(&self) -> Value {
        object_schema(self.params)
    }

    /// Render validated arguments into an outbound request.
    pub fn render(&self, args: &Map<String, Value>) -> Result<ApiRequest, Vec<Violation>> {
        let path = self.render_path(args)?;

        let query = self
            .params
            .iter()
            .filter(|p| p.location == Location::Query)
            .filter_map(|p| {
                let value = args.get(p.name).and_then(query_value)?;
                Some((p.name.to_string(), value))
            })
            .collect();

        let body = match self.body {
            Body::None => None,
            Body::Empty => Some(Value::Object(Map::new())),
            Body::Fields => {
                let fields = self
                    .params
                    .iter()
                    .filter(|p| p.location == Location::Body)
                    .filter_map(|p| Some((p.name.to_string(), args.get(p.name)?.clone())))
                    .collect();
                Some(Value::Object(fields))
            }
            Body::Field(name) => Some(
                args.get(name)
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new())),
            ),
            Body::Build(build) => Some(build(args)?),
        };

        Ok(ApiRequest {
            method: self.http_method,
            path,
            query,
            body,
        })
    }

    fn render_path(&self, args: &Map<String, Value>) -> Result<String, Vec<Violation>> {
        let mut path = String::with_capacity(self.path.len());
        let mut violations = Vec::new();
        let mut rest = self.path;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            path.push_str(&rest[..start]);
            let name = &rest[start + 1..start + len];
            match args.get(name).and_then(scalar_text) {
                Some(value) if value.is_empty() => violations.push(Violation::new(name, "is required")),
                Some(value) if is_dot_segment(&value) => {
                    violations.push(Violation::new(name, "must not be a relative path segment"))
                }
                Some(value) => path.push_str(&urlencoding::encode(&value)),
                None => violations.push(Violation::new(name, "is required")),
            }
            rest = &rest[start + len + 1..];
        }
        path.push_str(rest);

        if violations.is_empty() {
            Ok(path)
        } else {
            Err(violations)
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Query string form of a value; `None` drops the parameter.
fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
        scalar => scalar_text(scalar),
    }
}

/// `.` and `..` (raw or percent-encoded) would be collapsed when the URL is
/// resolved, moving the request to another endpoint.
fn is_dot_segment(value: &str) -> bool {
    let decoded = urlencoding::decode(value)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| value.to_string());
    matches!(decoded.as_str(), "." | "..")
}
