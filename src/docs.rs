//! Endpoint documentation derived from shapes.
//!
//! Works only from the resolved shape, so what is documented always agrees
//! with how requests are bound: a query-bound shape documents one query
//! parameter per field and no request body, a body-bound shape documents a
//! JSON request body and no parameters.

use serde_json::{json, Map, Value};

use crate::shape::{ResolvedShape, ShapeRegistry};
use crate::types::{BindingMode, FieldSpec, ValueType, JSON_MEDIA_TYPE};

/// Document a single shape.
///
/// The result carries `mode` plus either `parameters` or `requestBody`.
pub fn document(resolved: &ResolvedShape) -> Value {
    let mut doc = Map::new();
    doc.insert("name".into(), Value::String(resolved.name().to_string()));
    doc.insert("mode".into(), Value::String(resolved.mode().to_string()));

    match resolved.mode() {
        BindingMode::QueryBound => {
            let params: Vec<Value> = resolved.fields().iter().map(query_parameter).collect();
            doc.insert("parameters".into(), Value::Array(params));
        }
        BindingMode::BodyBound => {
            doc.insert(
                "requestBody".into(),
                json!({
                    "required": false,
                    "content": {
                        JSON_MEDIA_TYPE: { "schema": body_schema(resolved.fields()) }
                    }
                }),
            );
        }
    }

    Value::Object(doc)
}

/// Document every shape in a registry, keyed by shape name.
pub fn document_registry(registry: &ShapeRegistry) -> Value {
    let shapes: Map<String, Value> = registry
        .iter()
        .map(|r| (r.name().to_string(), document(r)))
        .collect();
    json!({ "shapes": shapes })
}

/// JSON Schema of the request body for a set of fields.
pub fn body_schema(fields: &[FieldSpec]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| (f.name.clone(), value_schema(&f.value_type)))
        .collect();
    let required: Vec<Value> = fields
        .iter()
        .filter(|f| f.is_mandatory())
        .map(|f| Value::String(f.name.clone()))
        .collect();

    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

fn query_parameter(field: &FieldSpec) -> Value {
    json!({
        "name": field.query_name(),
        "in": "query",
        "required": field.is_mandatory(),
        "schema": value_schema(&field.value_type),
    })
}

fn value_schema(value_type: &ValueType) -> Value {
    match value_type {
        ValueType::String => json!({ "type": "string" }),
        ValueType::Enum(variants) => json!({ "type": "string", "enum": variants }),
    }
}
