#![deny(missing_docs)]

//! # API Check Core
//!
//! Checks that an implementation's OpenAPI document stays compatible with a
//! shared base document.
//!
//! ```no_run
//! use apicheck_core::{check_compliance, CheckOptions, Document, ErrorFormatter};
//! use std::path::Path;
//!
//! let base = Document::load(Path::new("base.yaml"))?;
//! let implementation = Document::load(Path::new("impl.yaml"))?;
//! let errors = check_compliance(&base, &implementation, &CheckOptions::default())?;
//! println!("{}", ErrorFormatter::format(&errors));
//! # Ok::<(), apicheck_core::AppError>(())
//! ```

/// Shared error types.
pub mod error;

/// OpenAPI document model and loading.
pub mod oas;

/// Compliance checks.
pub mod compliance;

/// Findings, collections and report formatting.
pub mod report;

pub use compliance::{
    check_compliance, check_matching_routes, check_schema, extra_routes, missing_routes,
    normalize_value, validate_compliance, CheckContext, CheckOptions, EnumPolicy,
    SchemaNormalizer, DEFAULT_MAX_SCHEMA_DEPTH, DEFAULT_RESERVED_PREFIX,
};
pub use error::{AppError, AppResult};
pub use oas::{Document, Endpoint, Method, Schema, SchemaKind};
pub use report::{
    ComplianceError, ConflictSubType, ConflictType, ErrorCollection, ErrorFormatter, ErrorLevel,
    ErrorRecord, ErrorType, RouteConflict,
};
