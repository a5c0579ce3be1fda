#![deny(missing_docs)]

//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Compliance findings are *not* errors in this sense: they are collected as
//! [`crate::report::ComplianceError`] values. `AppError` is reserved for
//! infrastructure failures (unreadable files, unparseable documents, malformed
//! schemas) and for the single aggregate failure raised by the orchestrator.

use derive_more::{Display, From};

/// The Global Error Enum.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The document could not be parsed as YAML/JSON or has an invalid shape.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// A `$ref` could not be resolved inside the document.
    #[from(ignore)]
    #[display("Reference Error: {_0}")]
    Reference(String),

    /// A schema is structurally invalid (e.g. conflicting `allOf` types).
    #[from(ignore)]
    #[display("Malformed Schema: {_0}")]
    MalformedSchema(String),

    /// The implementation does not comply with the base spec.
    /// Carries the formatted report.
    #[from(ignore)]
    #[display("Spec validation failed:\n{_0}")]
    ValidationFailed(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::NotFound, "missing.yaml");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_validation_failed_prefix() {
        let err = AppError::ValidationFailed("Found 1 error".into());
        assert_eq!(err.to_string(), "Spec validation failed:\nFound 1 error");
    }

    #[test]
    fn test_malformed_schema_display() {
        let err = AppError::MalformedSchema("conflicting allOf types".into());
        assert_eq!(err.to_string(), "Malformed Schema: conflicting allOf types");
    }
}
