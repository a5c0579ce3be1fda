#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use apicheck_core::AppError;
use derive_more::{Display, From};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// Failure reported by the core library, including non-compliance.
    #[display("{}", _0)]
    Core(AppError),

    /// The machine-readable report could not be serialized.
    #[display("Failed to serialize report: {}", _0)]
    Json(serde_json::Error),

    /// Logging could not be initialised.
    #[display("Failed to initialise logging: {}", _0)]
    #[from(ignore)]
    Logging(String),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// `String` payloads do not implement `std::error::Error`, so `source()`
/// cannot be derived.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
