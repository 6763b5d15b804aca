//! Shape definitions loaded from JSON files.
//!
//! A definition file is first checked against an embedded meta-schema so
//! every structural problem is reported at once with its JSON pointer, then
//! deserialised and registered.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::LoadError;
use crate::shape::{Shape, ShapeRegistry};
use crate::types::{Constraint, FieldSpec, Source, ValueType};

const DEFINITIONS_META_SCHEMA: &str = r##"{
  "type": "object",
  "required": ["shapes"],
  "additionalProperties": false,
  "properties": {
    "shapes": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["name", "fields"],
        "additionalProperties": false,
        "properties": {
          "name": { "type": "string", "minLength": 1 },
          "fields": { "type": "array", "items": { "$ref": "#/$defs/field" } }
        }
      }
    }
  },
  "$defs": {
    "field": {
      "type": "object",
      "required": ["name"],
      "additionalProperties": false,
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "source": {
          "oneOf": [
            { "enum": ["implicit", "query"] },
            {
              "type": "object",
              "required": ["query"],
              "additionalProperties": false,
              "properties": { "query": { "type": "string", "minLength": 1 } }
            }
          ]
        },
        "type": {
          "oneOf": [
            { "const": "string" },
            {
              "type": "object",
              "required": ["enum"],
              "additionalProperties": false,
              "properties": {
                "enum": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
              }
            }
          ]
        },
        "constraints": {
          "type": "array",
          "items": { "enum": ["required", "non_blank"] }
        }
      }
    }
  }
}"##;

#[derive(Debug, Deserialize)]
struct DefinitionFile {
    shapes: Vec<ShapeDef>,
}

#[derive(Debug, Deserialize)]
struct ShapeDef {
    name: String,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    #[serde(default)]
    source: SourceDef,
    #[serde(default, rename = "type")]
    value_type: ValueType,
    #[serde(default)]
    constraints: Vec<Constraint>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceDef {
    Named(SourceName),
    Keyed { query: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SourceName {
    Implicit,
    Query,
}

impl Default for SourceDef {
    fn default() -> Self {
        SourceDef::Named(SourceName::Implicit)
    }
}

impl From<SourceDef> for Source {
    fn from(def: SourceDef) -> Self {
        match def {
            SourceDef::Named(SourceName::Implicit) => Source::Implicit,
            SourceDef::Named(SourceName::Query) => Source::Query(None),
            SourceDef::Keyed { query } => Source::Query(Some(query)),
        }
    }
}

impl From<FieldDef> for FieldSpec {
    fn from(def: FieldDef) -> Self {
        let mut field = FieldSpec::new(def.name);
        field.source = def.source.into();
        field.value_type = def.value_type;
        def.constraints
            .into_iter()
            .fold(field, |field, c| field.constraint(c))
    }
}

/// Load shape definitions from a file and build a registry.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` / `LoadError::ReadError` on IO
/// failure, `LoadError::InvalidJson` for unparsable content,
/// `LoadError::InvalidDefinitions` if the content breaks the definition
/// format, and `LoadError::Shape` if a shape cannot be built or registered.
pub fn load_definitions(path: &Path) -> Result<ShapeRegistry, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_definitions_str(&content)
}

/// Load shape definitions from a JSON string and build a registry.
///
/// # Errors
///
/// Same as [`load_definitions`], minus the IO errors.
pub fn load_definitions_str(content: &str) -> Result<ShapeRegistry, LoadError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    check_definitions(&value)?;

    let file: DefinitionFile =
        serde_json::from_value(value).map_err(|source| LoadError::InvalidJson { source })?;

    let mut registry = ShapeRegistry::builder();
    for def in file.shapes {
        let shape = def
            .fields
            .into_iter()
            .fold(Shape::builder(def.name), |b, f| b.field(f.into()))
            .build()?;
        registry = registry.register(shape)?;
    }
    Ok(registry.build())
}

/// Check a parsed definition document against the definition format.
///
/// # Errors
///
/// Returns `LoadError::InvalidDefinitions` listing every problem found.
pub fn check_definitions(value: &Value) -> Result<(), LoadError> {
    let meta: Value = serde_json::from_str(DEFINITIONS_META_SCHEMA)
        .map_err(|source| LoadError::InvalidJson { source })?;
    let validator = jsonschema::validator_for(&meta).map_err(|e| LoadError::InvalidDefinitions {
        problems: vec![format!("meta-schema: {}", e)],
    })?;

    let problems: Vec<String> = validator
        .iter_errors(value)
        .map(|e| {
            let path = e.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            format!("{}: {}", path, e)
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(LoadError::InvalidDefinitions { problems })
    }
}
