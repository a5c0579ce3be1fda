#![deny(missing_docs)]

//! # Compliance Checking
//!
//! Compares an implementation document against a base document and collects
//! every incompatibility into an [`ErrorCollection`].
//!
//! - **route_set**: Missing and extra routes.
//! - **normalizer**: `allOf` / `anyOf` / `oneOf` flattening.
//! - **schema_check**: Recursive schema compatibility.
//! - **route_check**: Status codes, query parameters and bodies of shared routes.

pub mod normalizer;
pub mod route_check;
pub mod route_set;
pub mod schema_check;

pub use normalizer::{normalize_value, SchemaNormalizer, DEFAULT_MAX_SCHEMA_DEPTH};
pub use route_check::check_matching_routes;
pub use route_set::{extra_routes, missing_routes};
pub use schema_check::{check_schema, CheckContext, EnumPolicy};

use crate::error::{AppError, AppResult};
use crate::oas::Document;
use crate::report::{ErrorCollection, ErrorFormatter};

/// Namespace reserved by the base document.
pub const DEFAULT_RESERVED_PREFIX: &str = "/common-grants/";

/// Tunables for a compliance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Paths under this prefix must all be declared by the base document.
    pub reserved_prefix: String,
    /// Direction of the enum compatibility rule.
    pub enum_policy: EnumPolicy,
    /// Nesting limit applied while normalizing schemas.
    pub max_schema_depth: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            enum_policy: EnumPolicy::default(),
            max_schema_depth: DEFAULT_MAX_SCHEMA_DEPTH,
        }
    }
}

impl CheckOptions {
    /// Sets the reserved namespace prefix.
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    /// Sets the enum rule direction.
    pub fn with_enum_policy(mut self, policy: EnumPolicy) -> Self {
        self.enum_policy = policy;
        self
    }

    /// Sets the schema nesting limit.
    pub fn with_max_schema_depth(mut self, depth: usize) -> Self {
        self.max_schema_depth = depth;
        self
    }
}

/// Runs every check and returns the findings.
///
/// Findings are ordered: missing routes, extra routes, then conflicts on
/// shared routes. An `Err` means a document could not be processed, not that
/// it is non-compliant.
pub fn check_compliance(
    base: &Document,
    implementation: &Document,
    options: &CheckOptions,
) -> AppResult<ErrorCollection> {
    let mut errors = ErrorCollection::new();

    errors.add_all(missing_routes(base, implementation));
    errors.add_all(extra_routes(base, implementation, &options.reserved_prefix));
    errors.add_all(check_matching_routes(base, implementation, options)?);

    tracing::info!(
        errors = errors.count(),
        endpoints = errors.endpoint_count(),
        "compliance check finished"
    );
    Ok(errors)
}

/// Like [`check_compliance`], but fails with the formatted report when any
/// finding exists.
pub fn validate_compliance(
    base: &Document,
    implementation: &Document,
    options: &CheckOptions,
) -> AppResult<()> {
    let errors = check_compliance(base, implementation, options)?;
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(ErrorFormatter::format(&errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ErrorType;

    fn doc(yaml: &str) -> Document {
        Document::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_default_options() {
        let options = CheckOptions::default();
        assert_eq!(options.reserved_prefix, "/common-grants/");
        assert_eq!(options.enum_policy, EnumPolicy::ImplSubsetOfBase);
        assert_eq!(options.max_schema_depth, DEFAULT_MAX_SCHEMA_DEPTH);

        let custom = CheckOptions::default()
            .with_reserved_prefix("/api/")
            .with_enum_policy(EnumPolicy::BaseSubsetOfImpl)
            .with_max_schema_depth(8);
        assert_eq!(custom.reserved_prefix, "/api/");
        assert_eq!(custom.enum_policy, EnumPolicy::BaseSubsetOfImpl);
        assert_eq!(custom.max_schema_depth, 8);
    }

    #[test]
    fn test_findings_are_ordered_by_phase() {
        let base = doc(r#"
paths:
  /common-grants/a:
    get:
      tags: [required]
      responses:
        "200": {description: OK}
  /common-grants/b:
    get:
      tags: [required]
      responses: {}
"#);
        let implementation = doc(r#"
paths:
  /common-grants/a:
    get:
      responses: {}
  /common-grants/extra:
    get:
      responses: {}
"#);
        let errors = check_compliance(&base, &implementation, &CheckOptions::default()).unwrap();
        let types: Vec<ErrorType> = errors.iter().map(|e| e.error_type()).collect();
        assert_eq!(
            types,
            vec![
                ErrorType::MissingRoute,
                ErrorType::ExtraRoute,
                ErrorType::RouteConflict
            ]
        );
        assert_eq!(errors.endpoint_count(), 3);
    }

    #[test]
    fn test_custom_reserved_prefix() {
        let base = doc("paths: {}");
        let implementation = doc(r#"
paths:
  /common-grants/x:
    get:
      responses: {}
  /api/y:
    get:
      responses: {}
"#);
        let options = CheckOptions::default().with_reserved_prefix("/api/");
        let errors = check_compliance(&base, &implementation, &options).unwrap();
        assert_eq!(errors.count(), 1);
        assert_eq!(errors.errors()[0].endpoint().path, "/api/y");
    }

    #[test]
    fn test_validate_compliance() {
        let base = doc(r#"
paths:
  /common-grants/a:
    get:
      tags: [required]
      responses: {}
"#);
        assert!(validate_compliance(&base, &base, &CheckOptions::default()).is_ok());

        let err = validate_compliance(&base, &doc("paths: {}"), &CheckOptions::default())
            .unwrap_err();
        match err {
            AppError::ValidationFailed(report) => {
                assert!(report.starts_with("Found 1 error across 1 endpoint"));
                assert!(report.contains("Missing required route: GET /common-grants/a"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
