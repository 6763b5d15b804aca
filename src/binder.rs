//! Binding - fills a shape's fields from the query string or the body.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::BindError;
use crate::types::{is_json_media_type, json_type_name, BindingMode, FieldSpec, ValueType};

/// The parts of an HTTP request that binding looks at.
///
/// Repeated query keys are kept in arrival order; lookups take the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingRequest {
    query: Vec<(String, String)>,
    content_type: Option<String>,
    body: Option<Vec<u8>>,
}

impl BindingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from a raw, percent-encoded query string.
    ///
    /// A leading `?` is ignored.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            query: url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            ..Self::default()
        }
    }

    /// Append a decoded query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value for `key`, if any.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn content_type_value(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Resolved field values of a bound object, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundFields {
    values: Vec<(String, Option<String>)>,
}

impl BoundFields {
    /// Value of a field; `None` if the field is absent or unknown.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    /// True if no field has a value.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|(_, v)| v.is_none())
    }

    /// Flat JSON object; absent fields are `null`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(n, v)| (n.clone(), v.clone().map_or(Value::Null, Value::String)))
            .collect();
        Value::Object(map)
    }
}

/// Result of binding, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundObject {
    /// No object was supplied at all.
    Absent,
    /// An object was supplied; any of its fields may still be absent.
    Present(BoundFields),
}

impl BoundObject {
    pub fn fields(&self) -> Option<&BoundFields> {
        match self {
            BoundObject::Absent => None,
            BoundObject::Present(fields) => Some(fields),
        }
    }
}

/// Content-negotiation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    Accepted,
    UnsupportedMediaType,
}

/// Bound object together with the negotiation outcome that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub object: BoundObject,
    pub negotiation: Negotiation,
}

impl Binding {
    fn accepted(object: BoundObject) -> Self {
        Self {
            object,
            negotiation: Negotiation::Accepted,
        }
    }

    fn unsupported() -> Self {
        Self {
            object: BoundObject::Absent,
            negotiation: Negotiation::UnsupportedMediaType,
        }
    }
}

/// Bind a request to a shape's fields using the shape's resolved mode.
///
/// Query-bound shapes never look at the body or its content type.
/// Body-bound shapes never look at the query string.
///
/// # Errors
///
/// Returns `BindError::MalformedBody` if a JSON body cannot be read as a flat
/// object of strings, and `BindError::InvalidValue` if a value is outside an
/// enum field's variants.
pub fn bind(
    mode: BindingMode,
    fields: &[FieldSpec],
    request: &BindingRequest,
) -> Result<Binding, BindError> {
    let binding = match mode {
        BindingMode::QueryBound => Binding::accepted(bind_query(fields, request)?),
        BindingMode::BodyBound => bind_body(fields, request)?,
    };
    debug!(
        %mode,
        negotiation = ?binding.negotiation,
        absent = matches!(binding.object, BoundObject::Absent),
        "bound request"
    );
    Ok(binding)
}

// --- Internal implementation ---

fn bind_query(fields: &[FieldSpec], request: &BindingRequest) -> Result<BoundObject, BindError> {
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let raw = request.query_value(field.query_name());
        // An empty value cannot name an enum variant; treat it as not given.
        let raw = match (&field.value_type, raw) {
            (ValueType::Enum(_), Some("")) => None,
            (_, raw) => raw,
        };
        let value = raw.map(|v| check_value(field, v)).transpose()?;
        values.push((field.name.clone(), value));
    }
    Ok(BoundObject::Present(BoundFields { values }))
}

fn bind_body(fields: &[FieldSpec], request: &BindingRequest) -> Result<Binding, BindError> {
    match request.content_type_value() {
        Some(ct) if is_json_media_type(ct) => {}
        _ => return Ok(Binding::unsupported()),
    }

    let body = request.body_bytes().unwrap_or_default();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Binding::accepted(BoundObject::Absent));
    }

    let parsed: Value = serde_json::from_slice(body).map_err(|e| BindError::MalformedBody {
        message: e.to_string(),
    })?;

    let map = match parsed {
        Value::Null => return Ok(Binding::accepted(BoundObject::Absent)),
        Value::Object(map) => map,
        other => {
            return Err(BindError::MalformedBody {
                message: format!("expected object, got {}", json_type_name(&other)),
            })
        }
    };

    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let value = match map.get(&field.name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(check_value(field, s)?),
            // Scalars are read as their JSON text for free-form fields.
            Some(scalar @ (Value::Number(_) | Value::Bool(_)))
                if field.value_type == ValueType::String =>
            {
                Some(scalar.to_string())
            }
            Some(other) => {
                return Err(BindError::MalformedBody {
                    message: format!(
                        "field '{}': expected string, got {}",
                        field.name,
                        json_type_name(other)
                    ),
                })
            }
        };
        values.push((field.name.clone(), value));
    }

    Ok(Binding::accepted(BoundObject::Present(BoundFields {
        values,
    })))
}

fn check_value(field: &FieldSpec, value: &str) -> Result<String, BindError> {
    match &field.value_type {
        ValueType::Enum(variants) if !field.value_type.accepts(value) => {
            Err(BindError::InvalidValue {
                field: field.name.clone(),
                value: value.to_string(),
                expected: variants.clone(),
            })
        }
        _ => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JSON_MEDIA_TYPE;
    use serde_json::json;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("title").one_of(["MR", "MRS", "MISS", "SIGNORA"]),
            FieldSpec::new("name"),
            FieldSpec::new("suffix"),
        ]
    }

    fn present(binding: Binding) -> BoundFields {
        assert_eq!(binding.negotiation, Negotiation::Accepted);
        match binding.object {
            BoundObject::Present(fields) => fields,
            BoundObject::Absent => panic!("expected a present object"),
        }
    }

    #[test]
    fn query_string_is_decoded() {
        let request = BindingRequest::from_query_string("?name=a%20b&suffix=x+y");
        assert_eq!(request.query_value("name"), Some("a b"));
        assert_eq!(request.query_value("suffix"), Some("x y"));
        assert_eq!(request.query_value("title"), None);
    }

    #[test]
    fn repeated_query_key_first_wins() {
        let request = BindingRequest::from_query_string("name=first&name=second");
        assert_eq!(request.query_value("name"), Some("first"));
        assert_eq!(request.query_pairs().len(), 2);
    }

    #[test]
    fn query_bound_reads_query_and_ignores_body() {
        let request = BindingRequest::new()
            .query("title", "SIGNORA")
            .query("name", "--query-name--")
            .content_type(JSON_MEDIA_TYPE)
            .body(r#"{"title":"MR","name":"bean","suffix":"whatever"}"#);

        let bound = present(bind(BindingMode::QueryBound, &fields(), &request).unwrap());
        assert_eq!(bound.get("title"), Some("SIGNORA"));
        assert_eq!(bound.get("name"), Some("--query-name--"));
        assert_eq!(bound.get("suffix"), None);
    }

    #[test]
    fn query_bound_without_matching_keys_is_present_but_empty() {
        let request = BindingRequest::from_query_string("other=1");
        let bound = present(bind(BindingMode::QueryBound, &fields(), &request).unwrap());
        assert!(bound.is_empty());
        assert_eq!(bound.iter().count(), 3);
    }

    #[test]
    fn query_bound_uses_key_alias() {
        let fields = [FieldSpec::new("suffix").query_key("sfx")];
        let request = BindingRequest::from_query_string("suffix=no&sfx=yes");
        let bound = present(bind(BindingMode::QueryBound, &fields, &request).unwrap());
        assert_eq!(bound.get("suffix"), Some("yes"));
    }

    #[test]
    fn query_bound_rejects_unknown_enum_value() {
        let request = BindingRequest::from_query_string("title=DR");
        let err = bind(BindingMode::QueryBound, &fields(), &request).unwrap_err();
        assert!(matches!(err, BindError::InvalidValue { ref field, .. } if field == "title"));
    }

    #[test]
    fn query_bound_empty_enum_value_is_absent() {
        let request = BindingRequest::from_query_string("title=&name=");
        let bound = present(bind(BindingMode::QueryBound, &fields(), &request).unwrap());
        assert_eq!(bound.get("title"), None);
        assert_eq!(bound.get("name"), Some(""));
    }

    #[test]
    fn body_bound_without_content_type_is_unsupported() {
        let request = BindingRequest::new()
            .query("name", "x")
            .body(r#"{"name":"bean"}"#);
        let binding = bind(BindingMode::BodyBound, &fields(), &request).unwrap();
        assert_eq!(binding.negotiation, Negotiation::UnsupportedMediaType);
        assert_eq!(binding.object, BoundObject::Absent);
    }

    #[test]
    fn body_bound_with_other_content_type_is_unsupported() {
        let request = BindingRequest::new()
            .content_type("text/plain")
            .body(r#"{"name":"bean"}"#);
        let binding = bind(BindingMode::BodyBound, &fields(), &request).unwrap();
        assert_eq!(binding.negotiation, Negotiation::UnsupportedMediaType);
    }

    #[test]
    fn body_bound_empty_body_is_absent() {
        for request in [
            BindingRequest::new().content_type(JSON_MEDIA_TYPE),
            BindingRequest::new().content_type(JSON_MEDIA_TYPE).body(""),
            BindingRequest::new().content_type(JSON_MEDIA_TYPE).body("  \n"),
            BindingRequest::new().content_type(JSON_MEDIA_TYPE).body("null"),
        ] {
            let binding = bind(BindingMode::BodyBound, &fields(), &request).unwrap();
            assert_eq!(binding, Binding::accepted(BoundObject::Absent));
        }
    }

    #[test]
    fn body_bound_parses_body_and_ignores_query() {
        let request = BindingRequest::from_query_string("title=SIGNORA&name=q")
            .content_type("application/json; charset=utf-8")
            .body(r#"{"title":"MR","name":"bean","suffix":"whatever","extra":1}"#);

        let bound = present(bind(BindingMode::BodyBound, &fields(), &request).unwrap());
        assert_eq!(
            bound.to_json(),
            json!({"title": "MR", "name": "bean", "suffix": "whatever"})
        );
    }

    #[test]
    fn body_bound_null_field_is_absent() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body(r#"{"title":null}"#);
        let bound = present(bind(BindingMode::BodyBound, &fields(), &request).unwrap());
        assert!(bound.is_empty());
        assert_eq!(
            bound.to_json(),
            json!({"title": null, "name": null, "suffix": null})
        );
    }

    #[test]
    fn body_bound_malformed_json() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body("{not json");
        let err = bind(BindingMode::BodyBound, &fields(), &request).unwrap_err();
        assert_eq!(err.kind(), "malformed_body");
    }

    #[test]
    fn body_bound_rejects_non_object() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body("[1,2]");
        let err = bind(BindingMode::BodyBound, &fields(), &request).unwrap_err();
        assert_eq!(
            err,
            BindError::MalformedBody {
                message: "expected object, got array".into()
            }
        );
    }

    #[test]
    fn body_bound_reads_scalars_into_string_fields() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body(r#"{"name":42,"suffix":true}"#);
        let bound = present(bind(BindingMode::BodyBound, &fields(), &request).unwrap());
        assert_eq!(bound.get("name"), Some("42"));
        assert_eq!(bound.get("suffix"), Some("true"));
    }

    #[test]
    fn body_bound_rejects_structured_field_value() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body(r#"{"name":["bean"]}"#);
        let err = bind(BindingMode::BodyBound, &fields(), &request).unwrap_err();
        assert_eq!(
            err,
            BindError::MalformedBody {
                message: "field 'name': expected string, got array".into()
            }
        );
    }

    #[test]
    fn body_bound_rejects_number_for_enum_field() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body(r#"{"title":1}"#);
        let err = bind(BindingMode::BodyBound, &fields(), &request).unwrap_err();
        assert_eq!(
            err,
            BindError::MalformedBody {
                message: "field 'title': expected string, got number".into()
            }
        );
    }

    #[test]
    fn body_bound_rejects_unknown_enum_value() {
        let request = BindingRequest::new()
            .content_type(JSON_MEDIA_TYPE)
            .body(r#"{"title":"DR"}"#);
        let err = bind(BindingMode::BodyBound, &fields(), &request).unwrap_err();
        assert_eq!(err.kind(), "invalid_value");
    }

    #[test]
    fn bound_fields_serialize_in_declaration_order() {
        let request = BindingRequest::from_query_string("suffix=s&name=n&title=MR");
        let bound = present(bind(BindingMode::QueryBound, &fields(), &request).unwrap());
        assert_eq!(
            bound.to_json().to_string(),
            r#"{"title":"MR","name":"n","suffix":"s"}"#
        );
    }
}
