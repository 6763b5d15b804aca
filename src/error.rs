//! Error types for shape construction, definition loading and binding.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while building or looking up shapes.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("shape name must not be empty")]
    EmptyShapeName,

    #[error("shape '{shape}' has a field with an empty name")]
    EmptyFieldName { shape: String },

    #[error("shape '{shape}' declares field '{field}' more than once")]
    DuplicateField { shape: String, field: String },

    #[error("field '{field}' of shape '{shape}' is an enum without variants")]
    EmptyEnum { shape: String, field: String },

    #[error("shape '{shape}' is registered more than once")]
    DuplicateShape { shape: String },

    #[error("unknown shape '{shape}'")]
    UnknownShape { shape: String },
}

impl ShapeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading shape definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Definition errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid shape definitions: {}", problems.join("; "))]
    InvalidDefinitions { problems: Vec<String> },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::Shape(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Client errors that prevent an object from being bound at all.
///
/// These never reach validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("malformed body: {message}")]
    MalformedBody { message: String },

    #[error("invalid value \"{value}\" for field '{field}': expected one of {}", expected.join(", "))]
    InvalidValue {
        field: String,
        value: String,
        expected: Vec<String>,
    },
}

impl BindError {
    /// Machine-readable indicator used in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            BindError::MalformedBody { .. } => "malformed_body",
            BindError::InvalidValue { .. } => "invalid_value",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("shapes.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::InvalidDefinitions {
            problems: vec!["/shapes: not an array".into()],
        };
        assert_eq!(err.exit_code(), 2);

        let err = LoadError::from(ShapeError::DuplicateShape {
            shape: "HelloParam".into(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_value_display() {
        let err = BindError::InvalidValue {
            field: "title".into(),
            value: "DR".into(),
            expected: vec!["MR".into(), "MRS".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"DR\" for field 'title': expected one of MR, MRS"
        );
        assert_eq!(err.kind(), "invalid_value");
    }

    #[test]
    fn malformed_body_kind() {
        let err = BindError::MalformedBody {
            message: "expected value at line 1 column 1".into(),
        };
        assert_eq!(err.kind(), "malformed_body");
        assert!(err.to_string().starts_with("malformed body: "));
    }
}
