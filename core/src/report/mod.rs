#![deny(missing_docs)]

//! # Compliance Reporting
//!
//! - **error**: Typed findings ([`ComplianceError`]) and their flat record form.
//! - **collection**: The append-only [`ErrorCollection`].
//! - **formatter**: Human-readable rendering via [`ErrorFormatter`].

pub mod collection;
pub mod error;
pub mod formatter;

pub use collection::ErrorCollection;
pub use error::{
    ComplianceError, ConflictSubType, ConflictType, ErrorLevel, ErrorRecord, ErrorType,
    RouteConflict,
};
pub use formatter::{ErrorFormatter, NO_ERRORS};
