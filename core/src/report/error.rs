#![deny(missing_docs)]

//! # Compliance Errors
//!
//! A compliance finding is one [`ComplianceError`]. Each variant carries only
//! the fields meaningful for its kind; [`ErrorRecord`] provides the flat,
//! serializable view used for machine-readable reports.

use crate::oas::Endpoint;
use serde::Serialize;
use std::fmt;

/// Top-level classification of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// A base route tagged required/optional is absent.
    MissingRoute,
    /// An undeclared route inside the reserved namespace.
    ExtraRoute,
    /// A shared route whose contract differs.
    RouteConflict,
}

impl ErrorType {
    /// Report order of the sections.
    pub const ALL: [ErrorType; 3] = [
        ErrorType::MissingRoute,
        ErrorType::ExtraRoute,
        ErrorType::RouteConflict,
    ];

    /// Wire spelling, e.g. `MISSING_ROUTE`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::MissingRoute => "MISSING_ROUTE",
            ErrorType::ExtraRoute => "EXTRA_ROUTE",
            ErrorType::RouteConflict => "ROUTE_CONFLICT",
        }
    }

    /// Human label used as a report heading.
    pub fn label(self) -> &'static str {
        match self {
            ErrorType::MissingRoute => "Missing routes",
            ErrorType::ExtraRoute => "Extra routes",
            ErrorType::RouteConflict => "Route conflicts",
        }
    }
}

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorLevel {
    /// Breaks compliance.
    Error,
    /// Worth reporting, e.g. a missing optional route.
    Warning,
}

impl ErrorLevel {
    /// Wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorLevel::Error => "ERROR",
            ErrorLevel::Warning => "WARNING",
        }
    }
}

/// Which part of a shared route conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSubType {
    /// A base status code is not declared by the implementation.
    MissingStatusCode,
    /// Request bodies differ.
    RequestBodyConflict,
    /// Response bodies differ.
    ResponseBodyConflict,
    /// Query parameters differ.
    QueryParamConflict,
}

impl ConflictSubType {
    /// Human label.
    pub fn label(self) -> &'static str {
        match self {
            ConflictSubType::MissingStatusCode => "Missing status code",
            ConflictSubType::RequestBodyConflict => "Request body conflict",
            ConflictSubType::ResponseBodyConflict => "Response body conflict",
            ConflictSubType::QueryParamConflict => "Query parameter conflict",
        }
    }
}

/// Kind of schema mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    /// `type` differs.
    TypeConflict,
    /// A base field is absent from the implementation.
    MissingField,
    /// The implementation adds a field the base does not allow.
    ExtraField,
    /// Enum values are incompatible.
    EnumConflict,
}

impl ConflictType {
    /// Human label.
    pub fn label(self) -> &'static str {
        match self {
            ConflictType::TypeConflict => "Type conflict",
            ConflictType::MissingField => "Missing field",
            ConflictType::ExtraField => "Extra field",
            ConflictType::EnumConflict => "Enum conflict",
        }
    }
}

/// Details of a conflict on a route present in both documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConflict {
    /// The affected route.
    pub endpoint: Endpoint,
    /// Which part of the route conflicts.
    pub sub_type: ConflictSubType,
    /// Schema mismatch kind, for schema-level findings.
    pub conflict_type: Option<ConflictType>,
    /// Dot path into the schema (`response.items[0].id`).
    pub location: Option<String>,
    /// Response status code, for response findings.
    pub status_code: Option<String>,
    /// MIME type of the compared payload.
    pub mime_type: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl RouteConflict {
    /// A conflict without schema details.
    pub fn new(endpoint: Endpoint, sub_type: ConflictSubType, message: impl Into<String>) -> Self {
        Self {
            endpoint,
            sub_type,
            conflict_type: None,
            location: None,
            status_code: None,
            mime_type: None,
            message: message.into(),
        }
    }

    /// Sets the status code.
    pub fn with_status_code(mut self, code: impl Into<String>) -> Self {
        self.status_code = Some(code.into());
        self
    }

    /// Sets the MIME type.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Sets the schema location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the schema mismatch kind.
    pub fn with_conflict_type(mut self, conflict_type: ConflictType) -> Self {
        self.conflict_type = Some(conflict_type);
        self
    }
}

/// One compliance finding.
#[derive(Debug, Clone, PartialEq)]
pub enum ComplianceError {
    /// A base route is missing from the implementation.
    MissingRoute {
        /// The missing route.
        endpoint: Endpoint,
        /// `Error` for required routes, `Warning` for optional ones.
        level: ErrorLevel,
        /// Human-readable description.
        message: String,
    },
    /// The implementation declares a route the base does not know.
    ExtraRoute {
        /// The undeclared route.
        endpoint: Endpoint,
        /// Human-readable description.
        message: String,
    },
    /// A shared route differs.
    RouteConflict(RouteConflict),
}

impl ComplianceError {
    /// A missing base route; `required` selects the level.
    pub fn missing_route(endpoint: Endpoint, required: bool) -> Self {
        let (level, status) = if required {
            (ErrorLevel::Error, "required")
        } else {
            (ErrorLevel::Warning, "optional")
        };
        let message = format!("Missing {} route: {}", status, endpoint);
        ComplianceError::MissingRoute {
            endpoint,
            level,
            message,
        }
    }

    /// An undeclared route in the reserved namespace.
    pub fn extra_route(endpoint: Endpoint) -> Self {
        let message = format!("Route {} is not defined in the base spec", endpoint);
        ComplianceError::ExtraRoute { endpoint, message }
    }

    /// The classification of this finding.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ComplianceError::MissingRoute { .. } => ErrorType::MissingRoute,
            ComplianceError::ExtraRoute { .. } => ErrorType::ExtraRoute,
            ComplianceError::RouteConflict(_) => ErrorType::RouteConflict,
        }
    }

    /// The severity of this finding.
    pub fn level(&self) -> ErrorLevel {
        match self {
            ComplianceError::MissingRoute { level, .. } => *level,
            ComplianceError::ExtraRoute { .. } | ComplianceError::RouteConflict(_) => {
                ErrorLevel::Error
            }
        }
    }

    /// The affected route.
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            ComplianceError::MissingRoute { endpoint, .. }
            | ComplianceError::ExtraRoute { endpoint, .. } => endpoint,
            ComplianceError::RouteConflict(conflict) => &conflict.endpoint,
        }
    }

    /// The human-readable description.
    pub fn message(&self) -> &str {
        match self {
            ComplianceError::MissingRoute { message, .. }
            | ComplianceError::ExtraRoute { message, .. } => message,
            ComplianceError::RouteConflict(conflict) => &conflict.message,
        }
    }

    /// Conflict details, for `RouteConflict` findings.
    pub fn as_conflict(&self) -> Option<&RouteConflict> {
        match self {
            ComplianceError::RouteConflict(conflict) => Some(conflict),
            _ => None,
        }
    }
}

impl From<RouteConflict> for ComplianceError {
    fn from(conflict: RouteConflict) -> Self {
        ComplianceError::RouteConflict(conflict)
    }
}

impl fmt::Display for ComplianceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.level().as_str(),
            self.error_type().as_str(),
            self.endpoint(),
            self.message()
        )
    }
}

/// Flat, serializable view of a finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// Finding classification.
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    /// Severity.
    pub level: ErrorLevel,
    /// `"METHOD /path"`.
    pub endpoint: String,
    /// Conflict sub type, for route conflicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<ConflictSubType>,
    /// Schema mismatch kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_type: Option<ConflictType>,
    /// Schema location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    /// MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Description.
    pub message: String,
}

impl From<&ComplianceError> for ErrorRecord {
    fn from(error: &ComplianceError) -> Self {
        let conflict = error.as_conflict();
        ErrorRecord {
            error_type: error.error_type(),
            level: error.level(),
            endpoint: error.endpoint().to_string(),
            sub_type: conflict.map(|c| c.sub_type),
            conflict_type: conflict.and_then(|c| c.conflict_type),
            location: conflict.and_then(|c| c.location.clone()),
            status_code: conflict.and_then(|c| c.status_code.clone()),
            mime_type: conflict.and_then(|c| c.mime_type.clone()),
            message: error.message().to_string(),
        }
    }
}
