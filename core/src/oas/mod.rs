#![deny(missing_docs)]

//! # OpenAPI Document Handling
//!
//! - **document**: The dereferenced document model (paths, operations, bodies).
//! - **schema**: Raw schema arena and the normalized schema tree.
//! - **loader**: Builds a document from JSON, resolving local `$ref`s.
//! - **normalization**: OpenAPI 3.1 -> 3.0 shape conversion.
//! - **ref_utils**: JSON Pointer helpers.

pub mod document;
pub mod schema;

pub(crate) mod loader;
pub(crate) mod normalization;
mod ref_utils;

pub use document::{
    Body, Content, Document, Endpoint, MediaType, Method, Operation, Parameter,
    ParameterLocation, PathItem, Response, TAG_EXPERIMENTAL, TAG_OPTIONAL, TAG_REQUIRED,
};
pub use schema::{
    AdditionalProperties, ArraySchema, ObjectSchema, RawAdditionalProperties, ScalarType,
    Schema, SchemaArena, SchemaId, SchemaKind, SchemaNode, RECURSIVE_MARKER,
};
