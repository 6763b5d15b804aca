//! Core types for parameter binding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Media type a body-bound endpoint accepts.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Returns true if a `Content-Type` value declares JSON.
///
/// Only the essence is compared (case-insensitive); parameters such as
/// `charset` are ignored.
pub fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Where a field is declared to be read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Source {
    /// No explicit source. Read from the body unless the shape is query-bound.
    #[default]
    Implicit,
    /// Explicitly read from the query string, optionally under another key.
    Query(Option<String>),
}

impl Source {
    pub fn is_query(&self) -> bool {
        matches!(self, Source::Query(_))
    }
}

/// Value type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Free-form string.
    #[default]
    String,
    /// Closed set of allowed values.
    Enum(Vec<String>),
}

impl ValueType {
    /// Returns true if `value` is acceptable for this type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ValueType::String => true,
            ValueType::Enum(variants) => variants.iter().any(|v| v == value),
        }
    }
}

/// A per-field constraint.
///
/// New constraint kinds are added here and in [`Constraint::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Value must be present.
    Required,
    /// Value must be present and contain a non-whitespace character.
    NonBlank,
}

impl Constraint {
    /// Check a resolved value, returning the violation message on failure.
    pub fn check(&self, value: Option<&str>) -> Option<&'static str> {
        match self {
            Constraint::Required => value.is_none().then_some("must not be null"),
            Constraint::NonBlank => match value {
                Some(v) if !v.trim().is_empty() => None,
                _ => Some("must not be empty"),
            },
        }
    }

    /// Whether this constraint makes the field mandatory in documentation.
    pub fn implies_required(&self) -> bool {
        matches!(self, Constraint::Required | Constraint::NonBlank)
    }
}

/// Description of one field of a bindable object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub source: Source,
    pub value_type: ValueType,
    /// Evaluated in declaration order.
    pub constraints: Vec<Constraint>,
}

impl FieldSpec {
    /// Create an implicit-source string field with no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Source::Implicit,
            value_type: ValueType::String,
            constraints: Vec::new(),
        }
    }

    /// Read this field from the query string under its own name.
    pub fn query(mut self) -> Self {
        self.source = Source::Query(None);
        self
    }

    /// Read this field from the query string under `key`.
    pub fn query_key(mut self, key: impl Into<String>) -> Self {
        self.source = Source::Query(Some(key.into()));
        self
    }

    /// Restrict values to a closed set.
    pub fn one_of<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_type = ValueType::Enum(variants.into_iter().map(Into::into).collect());
        self
    }

    pub fn required(self) -> Self {
        self.constraint(Constraint::Required)
    }

    pub fn non_blank(self) -> Self {
        self.constraint(Constraint::NonBlank)
    }

    /// Add a constraint. Adding the same kind twice has no effect.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    /// Key used to look this field up in the query string.
    pub fn query_name(&self) -> &str {
        match &self.source {
            Source::Query(Some(key)) => key,
            _ => &self.name,
        }
    }

    /// Whether documentation should mark this field as mandatory.
    pub fn is_mandatory(&self) -> bool {
        self.constraints.iter().any(Constraint::implies_required)
    }
}

/// Which source owns binding for a whole shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    QueryBound,
    BodyBound,
}

impl BindingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingMode::QueryBound => "query_bound",
            BindingMode::BodyBound => "body_bound",
        }
    }
}

impl std::fmt::Display for BindingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
