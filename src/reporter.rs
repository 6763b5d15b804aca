//! Result reporting - turns binding and validation results into a response.

use http::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use crate::binder::{bind, Binding, BindingRequest, BoundFields, BoundObject, Negotiation};
use crate::error::BindError;
use crate::shape::ResolvedShape;
use crate::validator::{validate, Violation};

/// Key under which violations are reported.
pub const VIOLATIONS_KEY: &str = "violations";

/// Final state of a request. Every state is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Body-bound endpoint without a JSON content type.
    UnsupportedMediaType,
    /// Body-bound endpoint with a JSON content type but no body.
    NoContent,
    /// The object could not be constructed from the request.
    BindFailed(BindError),
    /// The object was constructed but broke at least one constraint.
    ValidationFailed(Vec<Violation>),
    Success(BoundFields),
}

impl Outcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Outcome::NoContent => StatusCode::NO_CONTENT,
            Outcome::BindFailed(_) | Outcome::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Outcome::Success(_) => StatusCode::OK,
        }
    }

    /// Response body, if the state carries one.
    pub fn body(&self) -> Option<Value> {
        match self {
            Outcome::UnsupportedMediaType | Outcome::NoContent => None,
            Outcome::BindFailed(err) => Some(json!({
                "error": err.kind(),
                "message": err.to_string(),
            })),
            Outcome::ValidationFailed(violations) => Some(json!({ VIOLATIONS_KEY: violations })),
            Outcome::Success(fields) => Some(fields.to_json()),
        }
    }

    pub fn into_response(self) -> Response {
        Response {
            status: self.status(),
            body: self.body(),
        }
    }
}

/// Status and JSON body handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Option<Value>,
}

/// Map a binding and its violations to the final state.
///
/// Content negotiation is checked first, then absence, then violations.
pub fn report(binding: Binding, violations: Vec<Violation>) -> Outcome {
    if binding.negotiation == Negotiation::UnsupportedMediaType {
        return Outcome::UnsupportedMediaType;
    }
    match binding.object {
        BoundObject::Absent => Outcome::NoContent,
        BoundObject::Present(_) if !violations.is_empty() => Outcome::ValidationFailed(violations),
        BoundObject::Present(fields) => Outcome::Success(fields),
    }
}

/// Run the whole bind-validate-report sequence for one request.
pub fn process(resolved: &ResolvedShape, request: &BindingRequest) -> Outcome {
    let binding = match bind(resolved.mode(), resolved.fields(), request) {
        Ok(binding) => binding,
        Err(err) => {
            debug!(shape = resolved.name(), error = %err, "request could not be bound");
            return Outcome::BindFailed(err);
        }
    };

    let violations = validate(&binding.object, resolved.fields());
    let violation_count = violations.len();
    let outcome = report(binding, violations);
    debug!(
        shape = resolved.name(),
        status = outcome.status().as_u16(),
        violations = violation_count,
        "request processed"
    );
    outcome
}
