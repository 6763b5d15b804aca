//! Parameter Binding
//!
//! Resolves a flat parameter object for an HTTP request from either the
//! query string or the JSON body, validates it and reports the result.
//!
//! Which source owns binding is decided per shape, once, from the field
//! declarations: a single field declaring a query source makes the whole
//! object query-bound, otherwise it is body-bound.
//!
//! # Example
//!
//! ```
//! use param_binding::{process, BindingRequest, FieldSpec, ResolvedShape, Shape};
//!
//! let shape = Shape::builder("Hello")
//!     .field(FieldSpec::new("title").query().one_of(["MR", "MRS"]).required())
//!     .field(FieldSpec::new("name").required().non_blank())
//!     .build()
//!     .unwrap();
//! let resolved = ResolvedShape::new(shape);
//!
//! let request = BindingRequest::from_query_string("title=MR&name=bean");
//! let response = process(&resolved, &request).into_response();
//! assert_eq!(response.status, 200);
//!
//! let response = process(&resolved, &BindingRequest::new()).into_response();
//! assert_eq!(response.status, 400);
//! assert_eq!(response.body.unwrap()["violations"].as_array().unwrap().len(), 3);
//! ```
//!
//! # Outcomes
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | `UnsupportedMediaType` | 415 | none |
//! | `NoContent` | 204 | none |
//! | `BindFailed` | 400 | `{"error": ..., "message": ...}` |
//! | `ValidationFailed` | 400 | `{"violations": [{"field": ..., "message": ...}]}` |
//! | `Success` | 200 | the bound object |

mod binder;
mod docs;
mod error;
pub mod greeting;
mod loader;
mod reporter;
mod resolver;
mod shape;
mod types;
mod validator;

pub use binder::{bind, Binding, BindingRequest, BoundFields, BoundObject, Negotiation};
pub use docs::{body_schema, document, document_registry};
pub use error::{BindError, LoadError, ShapeError};
pub use loader::{check_definitions, load_definitions, load_definitions_str};
pub use reporter::{process, report, Outcome, Response, VIOLATIONS_KEY};
pub use resolver::resolve_mode;
pub use shape::{describe, Bindable, RegistryBuilder, ResolvedShape, Shape, ShapeBuilder, ShapeRegistry};
pub use types::{
    is_json_media_type, BindingMode, Constraint, FieldSpec, Source, ValueType, JSON_MEDIA_TYPE,
};
pub use validator::{validate, Violation};
