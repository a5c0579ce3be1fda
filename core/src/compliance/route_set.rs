#![deny(missing_docs)]

//! # Route Set Analysis
//!
//! Compares the route sets of the two documents:
//! - base routes tagged `required` / `optional` that the implementation lacks;
//! - implementation routes inside the reserved namespace the base never declares.

use crate::oas::{Document, Endpoint};
use crate::report::ComplianceError;

/// Base routes tagged `required` or `optional` that are absent from the
/// implementation. Required routes are errors, optional ones warnings.
pub fn missing_routes(base: &Document, implementation: &Document) -> Vec<ComplianceError> {
    base.operations()
        .filter(|(_, _, op)| op.is_required() || op.is_optional())
        .filter(|(path, method, _)| implementation.operation(path, *method).is_none())
        .map(|(path, method, op)| {
            ComplianceError::missing_route(Endpoint::new(method, path), op.is_required())
        })
        .collect()
}

/// Implementation routes under `reserved_prefix` that the base does not declare.
///
/// Paths outside the prefix are implementation-specific and never reported.
pub fn extra_routes(
    base: &Document,
    implementation: &Document,
    reserved_prefix: &str,
) -> Vec<ComplianceError> {
    implementation
        .operations()
        .filter(|(path, _, _)| path.starts_with(reserved_prefix))
        .filter(|(path, method, _)| base.operation(path, *method).is_none())
        .map(|(path, method, _)| ComplianceError::extra_route(Endpoint::new(method, path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ErrorLevel, ErrorType};

    const PREFIX: &str = "/common-grants/";

    fn doc(yaml: &str) -> Document {
        Document::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_missing_required_and_optional() {
        let base = doc(r#"
paths:
  /common-grants/opportunities:
    get:
      tags: [required]
      responses: {}
    post:
      tags: [optional]
      responses: {}
  /common-grants/untagged:
    get:
      responses: {}
"#);
        let implementation = doc("paths: {}");

        let errors = missing_routes(&base, &implementation);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].endpoint().to_string(), "GET /common-grants/opportunities");
        assert_eq!(errors[0].level(), ErrorLevel::Error);
        assert_eq!(errors[1].endpoint().to_string(), "POST /common-grants/opportunities");
        assert_eq!(errors[1].level(), ErrorLevel::Warning);
        assert!(errors.iter().all(|e| e.error_type() == ErrorType::MissingRoute));
    }

    #[test]
    fn test_present_route_is_not_missing() {
        let base = doc(r#"
paths:
  /x:
    get:
      tags: [required]
      responses: {}
"#);
        let implementation = doc(r#"
paths:
  /x:
    get:
      responses: {}
    post:
      responses: {}
"#);
        assert!(missing_routes(&base, &implementation).is_empty());
    }

    #[test]
    fn test_extra_routes_in_namespace() {
        let base = doc(r#"
paths:
  /common-grants/opportunities:
    get:
      responses: {}
"#);
        let implementation = doc(r#"
paths:
  /common-grants/opportunities:
    get:
      responses: {}
    delete:
      responses: {}
  /common-grants/custom:
    get:
      responses: {}
    put:
      responses: {}
  /internal/health:
    get:
      responses: {}
"#);

        let errors = extra_routes(&base, &implementation, PREFIX);
        let endpoints: Vec<String> = errors.iter().map(|e| e.endpoint().to_string()).collect();
        assert_eq!(
            endpoints,
            vec![
                "DELETE /common-grants/opportunities",
                "GET /common-grants/custom",
                "PUT /common-grants/custom",
            ]
        );
        assert!(errors.iter().all(|e| e.level() == ErrorLevel::Error));
    }

    #[test]
    fn test_paths_outside_namespace_never_extra() {
        let base = doc("paths: {}");
        let implementation = doc(r#"
paths:
  /anything:
    get:
      responses: {}
  /common-grantsish/x:
    get:
      responses: {}
"#);
        assert!(extra_routes(&base, &implementation, PREFIX).is_empty());
    }
}
