#![deny(missing_docs)]

//! # Error Collection
//!
//! Append-only aggregate of compliance findings. Every check appends here and
//! keeps going, so a single run surfaces every violation.

use crate::oas::Endpoint;
use crate::report::error::{ComplianceError, ErrorLevel, ErrorRecord, ErrorType};
use std::collections::BTreeSet;

/// Ordered findings plus the set of distinct endpoints they mention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCollection {
    errors: Vec<ComplianceError>,
    endpoints: BTreeSet<Endpoint>,
}

impl ErrorCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one finding.
    pub fn add(&mut self, error: impl Into<ComplianceError>) {
        let error = error.into();
        self.endpoints.insert(error.endpoint().clone());
        self.errors.push(error);
    }

    /// Appends several findings, preserving their order.
    pub fn add_all(&mut self, errors: impl IntoIterator<Item = ComplianceError>) {
        for error in errors {
            self.add(error);
        }
    }

    /// Number of findings.
    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// Number of distinct endpoints mentioned.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if at least one finding is at `ERROR` level.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.level() == ErrorLevel::Error)
    }

    /// The finding at `index`, in insertion order.
    pub fn get(&self, index: usize) -> Option<&ComplianceError> {
        self.errors.get(index)
    }

    /// All findings, in insertion order.
    pub fn errors(&self) -> &[ComplianceError] {
        &self.errors
    }

    /// Distinct endpoints, sorted.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    /// Iterates findings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComplianceError> {
        self.errors.iter()
    }

    /// A new collection with the findings matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&ComplianceError) -> bool) -> Self {
        self.iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// A new collection with the findings whose type matches.
    pub fn filter_by_type(&self, predicate: impl Fn(ErrorType) -> bool) -> Self {
        self.filter(|e| predicate(e.error_type()))
    }

    /// A new collection with the findings whose level matches.
    pub fn filter_by_level(&self, predicate: impl Fn(ErrorLevel) -> bool) -> Self {
        self.filter(|e| predicate(e.level()))
    }

    /// A new collection with the findings whose endpoint matches.
    pub fn filter_by_endpoint(&self, predicate: impl Fn(&Endpoint) -> bool) -> Self {
        self.filter(|e| predicate(e.endpoint()))
    }

    /// Warning-level findings only.
    pub fn warnings(&self) -> Self {
        self.filter_by_level(|level| level == ErrorLevel::Warning)
    }

    /// Flat records for machine-readable output.
    pub fn records(&self) -> Vec<ErrorRecord> {
        self.iter().map(ErrorRecord::from).collect()
    }
}

impl FromIterator<ComplianceError> for ErrorCollection {
    fn from_iter<I: IntoIterator<Item = ComplianceError>>(iter: I) -> Self {
        let mut collection = ErrorCollection::new();
        collection.add_all(iter);
        collection
    }
}

impl Extend<ComplianceError> for ErrorCollection {
    fn extend<I: IntoIterator<Item = ComplianceError>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

impl IntoIterator for ErrorCollection {
    type Item = ComplianceError;
    type IntoIter = std::vec::IntoIter<ComplianceError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a ComplianceError;
    type IntoIter = std::slice::Iter<'a, ComplianceError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
