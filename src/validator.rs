//! Constraint validation of bound objects.

use serde::Serialize;

use crate::binder::BoundObject;
use crate::types::FieldSpec;

/// A single failed constraint on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a bound object against its fields' constraints.
///
/// Every field and every constraint is evaluated; the result lists one
/// violation per failing constraint, in field declaration order and then
/// constraint declaration order. An absent object is not validated.
pub fn validate(object: &BoundObject, fields: &[FieldSpec]) -> Vec<Violation> {
    let Some(bound) = object.fields() else {
        return Vec::new();
    };

    fields
        .iter()
        .flat_map(|field| {
            let value = bound.get(&field.name);
            field
                .constraints
                .iter()
                .filter_map(move |c| c.check(value))
                .map(move |message| Violation {
                    field: field.name.clone(),
                    message: message.to_string(),
                })
        })
        .collect()
}
