//! Source resolution - decides which request part owns binding for a shape.

use crate::types::{BindingMode, FieldSpec};

/// Resolve the binding mode of a shape from its field declarations.
///
/// A single field declaring a query source makes the whole shape
/// query-bound; fields without one are then read from the query string
/// under their own name. A shape with no query-sourced field is body-bound.
/// The decision never looks at a request.
pub fn resolve_mode(fields: &[FieldSpec]) -> BindingMode {
    if fields.iter().any(|f| f.source.is_query()) {
        BindingMode::QueryBound
    } else {
        BindingMode::BodyBound
    }
}
