#![deny(missing_docs)]

//! # Report Formatting
//!
//! Renders a finished [`ErrorCollection`] as a human-readable report.

use crate::oas::Endpoint;
use crate::report::collection::ErrorCollection;
use crate::report::error::{ComplianceError, ErrorType, RouteConflict};
use indexmap::IndexMap;
use std::fmt;

/// Text returned for an empty collection.
pub const NO_ERRORS: &str = "No errors found";

/// Human-readable renderer for compliance findings.
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Formats the whole collection.
    ///
    /// Sections appear in the fixed order missing routes, extra routes,
    /// route conflicts; empty sections are omitted. Route conflicts are
    /// grouped by endpoint in first-seen order.
    pub fn format(collection: &ErrorCollection) -> String {
        if collection.is_empty() {
            return NO_ERRORS.to_string();
        }
        Report(collection).to_string().trim_end().to_string()
    }
}

/// A non-empty collection rendered section by section.
struct Report<'a>(&'a ErrorCollection);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let collection = self.0;
        writeln!(
            f,
            "Found {} across {}",
            plural(collection.count(), "error"),
            plural(collection.endpoint_count(), "endpoint")
        )?;

        for error_type in ErrorType::ALL {
            let section = collection.filter_by_type(|t| t == error_type);
            if section.is_empty() {
                continue;
            }

            writeln!(f, "\n{} ({}):", error_type.label(), section.count())?;
            match error_type {
                ErrorType::MissingRoute | ErrorType::ExtraRoute => {
                    for error in &section {
                        write_route_entry(f, error)?;
                    }
                }
                ErrorType::RouteConflict => write_conflicts(f, &section)?,
            }
        }
        Ok(())
    }
}

fn write_route_entry(f: &mut fmt::Formatter<'_>, error: &ComplianceError) -> fmt::Result {
    writeln!(
        f,
        "  - [{}] {}: {}",
        error.level().as_str(),
        error.endpoint(),
        error.message()
    )
}

fn write_conflicts(f: &mut fmt::Formatter<'_>, section: &ErrorCollection) -> fmt::Result {
    let mut by_endpoint: IndexMap<&Endpoint, Vec<&RouteConflict>> = IndexMap::new();
    for conflict in section.iter().filter_map(ComplianceError::as_conflict) {
        by_endpoint
            .entry(&conflict.endpoint)
            .or_default()
            .push(conflict);
    }

    for (endpoint, conflicts) in by_endpoint {
        writeln!(f, "  {} ({}):", endpoint, plural(conflicts.len(), "issue"))?;
        for conflict in conflicts {
            write_conflict(f, conflict)?;
        }
    }
    Ok(())
}

fn write_conflict(f: &mut fmt::Formatter<'_>, conflict: &RouteConflict) -> fmt::Result {
    write!(f, "    - {}", conflict.sub_type.label())?;
    if let Some(conflict_type) = conflict.conflict_type {
        write!(f, " / {}", conflict_type.label())?;
    }
    writeln!(f)?;

    if let Some(code) = &conflict.status_code {
        writeln!(f, "      Status code: {}", code)?;
    }
    if let Some(mime) = &conflict.mime_type {
        writeln!(f, "      MIME type: {}", mime)?;
    }
    if let Some(location) = &conflict.location {
        writeln!(f, "      Location: {}", location)?;
    }
    writeln!(f, "      Message: {}", conflict.message)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
