#![deny(missing_docs)]

//! # OpenAPI Document Model
//!
//! The dereferenced view of an OpenAPI document that the compliance checks
//! operate on: paths, operations, parameters, bodies and responses. Schemas
//! are referenced by [`SchemaId`] into the document's [`SchemaArena`].

use crate::error::{AppError, AppResult};
use crate::oas::loader::load_document;
use crate::oas::normalization::convert_to_oas30;
use crate::oas::schema::{SchemaArena, SchemaId};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// HTTP methods that may carry an operation on a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
}

impl Method {
    /// All methods, in the order they are reported.
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Options,
        Method::Head,
    ];

    /// The lowercase key used in a Path Item Object.
    pub fn key(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Patch => "patch",
            Method::Options => "options",
            Method::Head => "head",
        }
    }

    /// The uppercase HTTP spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(method, path)` pair, rendered as `"GET /path"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// Path template, e.g. `/users/{id}`.
    pub path: String,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// `in: query`
    Query,
    /// `in: path`
    Path,
    /// `in: header`
    Header,
    /// `in: cookie`
    Cookie,
}

impl ParameterLocation {
    /// Parses the `in` keyword.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    pub location: ParameterLocation,
    /// Whether the parameter must be supplied.
    pub required: bool,
    /// The parameter schema, if declared.
    pub schema: Option<SchemaId>,
}

/// A Media Type Object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaType {
    /// The payload schema, if declared.
    pub schema: Option<SchemaId>,
}

/// MIME type -> Media Type mapping.
pub type Content = IndexMap<String, MediaType>;

/// A Request Body Object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    /// Payload per MIME type.
    pub content: Content,
}

/// A Response Object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    /// Payload per MIME type.
    pub content: Content,
}

/// Tag marking an operation every implementation must provide.
pub const TAG_REQUIRED: &str = "required";
/// Tag marking an operation implementations may provide.
pub const TAG_OPTIONAL: &str = "optional";
/// Tag marking an operation exempt from compatibility checks.
pub const TAG_EXPERIMENTAL: &str = "experimental";

/// An Operation Object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Operation {
    /// Operation tags.
    pub tags: BTreeSet<String>,
    /// Parameters, including those inherited from the path item.
    pub parameters: Vec<Parameter>,
    /// The request body, if declared.
    pub request_body: Option<Body>,
    /// Responses keyed by status code (`"200"`, `"4XX"`, `"default"`).
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// Tagged `required`.
    pub fn is_required(&self) -> bool {
        self.tags.contains(TAG_REQUIRED)
    }

    /// Tagged `optional`.
    pub fn is_optional(&self) -> bool {
        self.tags.contains(TAG_OPTIONAL)
    }

    /// Tagged `experimental`.
    pub fn is_experimental(&self) -> bool {
        self.tags.contains(TAG_EXPERIMENTAL)
    }

    /// Query parameters in declaration order.
    pub fn query_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Query)
    }

    /// Finds a query parameter by name.
    pub fn query_parameter(&self, name: &str) -> Option<&Parameter> {
        self.query_parameters().find(|p| p.name == name)
    }
}

/// A Path Item Object: the operations defined on one path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathItem {
    /// Operations keyed by method; a key is present iff the method is defined.
    pub operations: IndexMap<Method, Operation>,
}

impl PathItem {
    /// Returns the operation for `method`, if defined.
    pub fn operation(&self, method: Method) -> Option<&Operation> {
        self.operations.get(&method)
    }
}

/// A dereferenced OpenAPI document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Path items keyed by path template.
    pub paths: IndexMap<String, PathItem>,
    /// Storage for every schema reachable from the paths.
    pub schemas: SchemaArena,
}

impl Document {
    /// Parses a YAML (or JSON, which is valid YAML) OpenAPI document.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| AppError::Parse(format!("Failed to parse OpenAPI YAML: {}", e)))?;
        Self::from_value(yaml_to_json(yaml)?)
    }

    /// Parses a JSON OpenAPI document.
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| AppError::Parse(format!("Failed to parse OpenAPI JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Builds a document from an already-parsed JSON value.
    ///
    /// OpenAPI 3.1 constructs are converted to 3.0 shape first.
    pub fn from_value(mut value: Value) -> AppResult<Self> {
        convert_to_oas30(&mut value);
        load_document(&value)
    }

    /// Reads and parses a document from disk. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded spec file");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Returns the path item for `path`, if present.
    pub fn path(&self, path: &str) -> Option<&PathItem> {
        self.paths.get(path)
    }

    /// Returns the operation at `(path, method)`, if present.
    pub fn operation(&self, path: &str, method: Method) -> Option<&Operation> {
        self.path(path).and_then(|item| item.operation(method))
    }

    /// Iterates every `(path, method, operation)` in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, Method, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations
                .iter()
                .map(move |(method, op)| (path.as_str(), *method, op))
        })
    }
}

/// Converts a YAML value into JSON, stringifying scalar mapping keys
/// (status codes such as `200:` are integers in YAML).
fn yaml_to_json(value: serde_yaml::Value) -> AppResult<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| AppError::Parse(format!("Unsupported number '{}'", n)))?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<AppResult<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = serde_json::Map::new();
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => {
                        return Err(AppError::Parse(format!(
                            "Unsupported mapping key: {:?}",
                            other
                        )))
                    }
                };
                map.insert(key, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let endpoint = Endpoint::new(Method::Post, "/common-grants/opportunities");
        assert_eq!(endpoint.to_string(), "POST /common-grants/opportunities");
    }

    #[test]
    fn test_method_order() {
        let mut methods = vec![Method::Head, Method::Post, Method::Get];
        methods.sort();
        assert_eq!(methods, vec![Method::Get, Method::Post, Method::Head]);
    }

    #[test]
    fn test_yaml_integer_status_codes() {
        let doc = Document::from_yaml_str(
            r#"
openapi: 3.0.0
paths:
  /x:
    get:
      responses:
        200:
          description: OK
"#,
        )
        .unwrap();
        let op = doc.operation("/x", Method::Get).unwrap();
        assert!(op.responses.contains_key("200"));
    }

    #[test]
    fn test_operation_tags() {
        let doc = Document::from_yaml_str(
            r#"
paths:
  /x:
    get:
      tags: [required, experimental]
      responses: {}
"#,
        )
        .unwrap();
        let op = doc.operation("/x", Method::Get).unwrap();
        assert!(op.is_required());
        assert!(op.is_experimental());
        assert!(!op.is_optional());
    }

    #[test]
    fn test_unparseable_yaml() {
        let err = Document::from_yaml_str("paths: [unclosed").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("spec.json");
        std::fs::write(&json_path, r#"{"paths": {"/a": {"get": {"responses": {}}}}}"#).unwrap();
        let doc = Document::load(&json_path).unwrap();
        assert!(doc.operation("/a", Method::Get).is_some());

        let yaml_path = dir.path().join("spec.yml");
        std::fs::write(&yaml_path, "paths:\n  /b:\n    delete:\n      responses: {}\n").unwrap();
        let doc = Document::load(&yaml_path).unwrap();
        assert!(doc.operation("/b", Method::Delete).is_some());

        // `.json` files never fall back to the YAML parser.
        let bad_json = dir.path().join("bad.json");
        std::fs::write(&bad_json, "paths: {}").unwrap();
        assert!(matches!(Document::load(&bad_json), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Document::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
