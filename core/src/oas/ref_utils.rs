#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Helpers for resolving `$ref` targets inside a single document.
//!
//! Only fragment references (`#/...`) are resolved. Anything else points at
//! another document and is left to the caller to treat as pending.

use crate::error::{AppError, AppResult};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Maximum number of `$ref` hops followed for non-schema objects
/// (parameters, responses, request bodies, path items).
const MAX_REF_HOPS: usize = 32;

/// Returns `true` if the reference targets the current document.
pub(crate) fn is_local_ref(ref_str: &str) -> bool {
    ref_str.starts_with('#')
}

/// Returns the `$ref` string of a JSON object, if any.
pub(crate) fn ref_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Looks up a local reference (`#/components/schemas/User`) inside `root`.
pub(crate) fn lookup_pointer<'a>(root: &'a Value, ref_str: &str) -> AppResult<&'a Value> {
    let pointer = ref_str.strip_prefix('#').ok_or_else(|| {
        AppError::Reference(format!("'{}' is not a local reference", ref_str))
    })?;

    if pointer.is_empty() {
        return Ok(root);
    }

    let pointer = pointer.strip_prefix('/').ok_or_else(|| {
        AppError::Reference(format!("'{}' is not a valid JSON pointer", ref_str))
    })?;

    let mut current = root;
    for raw_segment in pointer.split('/') {
        let segment = decode_pointer_segment(raw_segment);
        current = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| {
            AppError::Reference(format!(
                "Unable to resolve '{}': segment '{}' not found",
                ref_str, segment
            ))
        })?;
    }

    Ok(current)
}

/// Follows `$ref` chains on a non-schema object until a concrete value is reached.
///
/// External references cannot be followed and are reported as errors, since
/// a missing parameter or response definition cannot be compared at all.
pub(crate) fn resolve_object<'a>(root: &'a Value, value: &'a Value) -> AppResult<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_HOPS {
        let Some(ref_str) = ref_of(current) else {
            return Ok(current);
        };
        if !is_local_ref(ref_str) {
            return Err(AppError::Reference(format!(
                "External reference '{}' cannot be resolved",
                ref_str
            )));
        }
        current = lookup_pointer(root, ref_str)?;
    }

    Err(AppError::Reference(format!(
        "Reference chain exceeds {} hops (loop?)",
        MAX_REF_HOPS
    )))
}
