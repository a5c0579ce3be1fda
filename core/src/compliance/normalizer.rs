#![deny(missing_docs)]

//! # Schema Normalizer
//!
//! Flattens composition keywords so every schema reaching the compatibility
//! checker is composition-free:
//!
//! - `allOf` branches are merged: properties and `required` are unioned,
//!   `type` must agree, `enum` lists are intersected.
//! - `anyOf` / `oneOf`: the first branch that is not a pending reference is
//!   merged into the parent. This is a heuristic, not union semantics.
//! - Compositions nested inside merged output are flattened the same way.
//!
//! The normalizer reads the [`SchemaArena`] and never mutates it. A reference
//! back to a schema that is still being normalized becomes
//! [`SchemaKind::Recursive`]. Results are memoized by the set of
//! [`SchemaId`]s being merged, together with every set their tree reached. A
//! memoized tree is reused only if none of those sets is in progress, so the
//! output never depends on which schema was normalized first.

use crate::error::{AppError, AppResult};
use crate::oas::loader::load_schema_value;
use crate::oas::normalization::convert_schema_to_oas30;
use crate::oas::{
    AdditionalProperties, ArraySchema, ObjectSchema, RawAdditionalProperties, ScalarType, Schema,
    SchemaArena, SchemaId, SchemaKind,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Default nesting limit for normalized schemas.
pub const DEFAULT_MAX_SCHEMA_DEPTH: usize = 64;

/// Normalizes a standalone JSON schema value.
///
/// Local references (`#/$defs/...`) resolve against the value itself.
pub fn normalize_value(value: &Value) -> AppResult<Schema> {
    let mut value = value.clone();
    convert_schema_to_oas30(&mut value);
    let (arena, id) = load_schema_value(&value)?;
    SchemaNormalizer::new(&arena).normalize(id)
}

/// Composition-flattening normalizer over one document's schema arena.
pub struct SchemaNormalizer<'a> {
    arena: &'a SchemaArena,
    max_depth: usize,
    memo: HashMap<Key, Memoized>,
    /// Id sets currently being normalized, outermost first.
    in_progress: Vec<Frame>,
}

type Key = Vec<SchemaId>;

struct Memoized {
    schema: Schema,
    reached: HashSet<Key>,
}

struct Frame {
    key: Key,
    /// Every key normalized, reused or cut as a cycle below this frame.
    reached: HashSet<Key>,
}

/// A node with composition removed; children are still handles, as lists of
/// schemas that must all hold.
#[derive(Default)]
struct Flat {
    schema_type: Option<String>,
    properties: IndexMap<String, Vec<SchemaId>>,
    required: BTreeSet<String>,
    items: Vec<SchemaId>,
    additional_properties: Option<FlatAdditional>,
    enumeration: Option<Vec<Value>>,
    recursive: bool,
}

impl Flat {
    /// Only a cycle marker was merged, with nothing else constraining it.
    fn is_bare_marker(&self) -> bool {
        self.recursive
            && self.schema_type.is_none()
            && self.properties.is_empty()
            && self.required.is_empty()
            && self.items.is_empty()
            && self.additional_properties.is_none()
            && self.enumeration.is_none()
    }
}

enum FlatAdditional {
    Allowed,
    Forbidden,
    Schema(Vec<SchemaId>),
}

impl<'a> SchemaNormalizer<'a> {
    /// Creates a normalizer reading from `arena`.
    pub fn new(arena: &'a SchemaArena) -> Self {
        Self {
            arena,
            max_depth: DEFAULT_MAX_SCHEMA_DEPTH,
            memo: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Overrides the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the composition-free form of the schema at `id`.
    pub fn normalize(&mut self, id: SchemaId) -> AppResult<Schema> {
        self.normalize_set(&[id], 0)
    }

    /// Normalizes the conjunction of `ids`.
    fn normalize_set(&mut self, ids: &[SchemaId], depth: usize) -> AppResult<Schema> {
        let mut key = ids.to_vec();
        key.sort();
        key.dedup();

        if self.is_in_progress(&key) {
            self.mark_reached([key]);
            return Ok(Schema::of(SchemaKind::Recursive));
        }
        if let Some(memoized) = self.memo.get(&key) {
            if !memoized.reached.iter().any(|k| self.is_in_progress(k)) {
                let schema = memoized.schema.clone();
                let reached = memoized.reached.clone();
                self.mark_reached(reached);
                return Ok(schema);
            }
        }
        if depth > self.max_depth {
            return Err(AppError::MalformedSchema(format!(
                "schema nesting exceeds the maximum depth of {}",
                self.max_depth
            )));
        }

        self.in_progress.push(Frame {
            key: key.clone(),
            reached: HashSet::from([key.clone()]),
        });
        let result = self
            .flatten_all(ids)
            .and_then(|flat| self.build(flat, depth));
        let reached = self
            .in_progress
            .pop()
            .map(|frame| frame.reached)
            .unwrap_or_default();

        let schema = result?;
        let cuts_outer_cycle = reached.iter().any(|k| self.is_in_progress(k));
        self.mark_reached(reached.iter().cloned());
        if !cuts_outer_cycle {
            self.memo.insert(
                key,
                Memoized {
                    schema: schema.clone(),
                    reached,
                },
            );
        }
        Ok(schema)
    }

    fn is_in_progress(&self, key: &[SchemaId]) -> bool {
        self.in_progress.iter().any(|frame| frame.key == key)
    }

    fn mark_reached(&mut self, keys: impl IntoIterator<Item = Key>) {
        if let Some(frame) = self.in_progress.last_mut() {
            frame.reached.extend(keys);
        }
    }

    fn flatten_all(&mut self, ids: &[SchemaId]) -> AppResult<Flat> {
        let mut flat = Flat::default();
        let mut stack = Vec::new();
        for id in ids {
            self.flatten_into(&mut flat, *id, &mut stack)?;
        }
        Ok(flat)
    }

    /// Merges the node at `id` (and its compositions) into `flat`.
    fn flatten_into(
        &mut self,
        flat: &mut Flat,
        id: SchemaId,
        stack: &mut Vec<SchemaId>,
    ) -> AppResult<()> {
        if stack.contains(&id) {
            return Err(AppError::MalformedSchema(
                "circular allOf composition".into(),
            ));
        }

        let arena = self.arena;
        let node = arena.get(id);
        if node.is_pending() {
            return Ok(());
        }
        stack.push(id);

        flat.recursive |= node.recursive;
        merge_type(flat, node.schema_type.as_deref())?;
        for (name, prop) in &node.properties {
            flat.properties.entry(name.clone()).or_default().push(*prop);
        }
        flat.required.extend(node.required.iter().cloned());
        flat.items.extend(node.items);
        if let Some(additional) = node.additional_properties {
            merge_additional(flat, additional);
        }
        if let Some(values) = &node.enumeration {
            flat.enumeration = Some(match flat.enumeration.take() {
                Some(existing) => existing
                    .into_iter()
                    .filter(|v| values.contains(v))
                    .collect(),
                None => values.clone(),
            });
        }

        for branch in &node.all_of {
            self.flatten_into(flat, *branch, stack)?;
        }

        for branches in [&node.any_of, &node.one_of] {
            if branches.is_empty() {
                continue;
            }
            match self.select_branch(branches, stack) {
                Some(branch) => self.flatten_into(flat, branch, stack)?,
                None => tracing::warn!("no resolvable branch in anyOf/oneOf; treating as any"),
            }
        }

        stack.pop();
        Ok(())
    }

    /// First branch that is neither an unresolved reference nor a cycle back
    /// into a schema currently being normalized.
    fn select_branch(&mut self, branches: &[SchemaId], stack: &[SchemaId]) -> Option<SchemaId> {
        for branch in branches.iter().copied() {
            if self.arena.get(branch).is_pending() || stack.contains(&branch) {
                continue;
            }
            if !self.is_in_progress(&[branch]) {
                return Some(branch);
            }
            self.mark_reached([vec![branch]]);
        }
        None
    }

    fn build(&mut self, flat: Flat, depth: usize) -> AppResult<Schema> {
        if flat.is_bare_marker() {
            return Ok(Schema::of(SchemaKind::Recursive));
        }

        // Untyped schemas that declare properties or items are treated as
        // objects / arrays respectively.
        let schema_type = flat.schema_type.clone().or_else(|| {
            if !flat.properties.is_empty() {
                Some("object".to_string())
            } else if !flat.items.is_empty() {
                Some("array".to_string())
            } else {
                None
            }
        });

        let kind = match schema_type.as_deref() {
            None => SchemaKind::Any,
            Some("object") => {
                let mut properties = IndexMap::new();
                for (name, ids) in &flat.properties {
                    properties.insert(name.clone(), self.normalize_set(ids, depth + 1)?);
                }
                let additional_properties = match &flat.additional_properties {
                    None => AdditionalProperties::Unspecified,
                    Some(FlatAdditional::Allowed) => AdditionalProperties::Allowed,
                    Some(FlatAdditional::Forbidden) => AdditionalProperties::Forbidden,
                    Some(FlatAdditional::Schema(ids)) => {
                        AdditionalProperties::Schema(Box::new(self.normalize_set(ids, depth + 1)?))
                    }
                };
                SchemaKind::Object(ObjectSchema {
                    properties,
                    required: flat.required,
                    additional_properties,
                })
            }
            Some("array") => {
                let items = if flat.items.is_empty() {
                    None
                } else {
                    Some(Box::new(self.normalize_set(&flat.items, depth + 1)?))
                };
                SchemaKind::Array(ArraySchema { items })
            }
            Some(other) => ScalarType::parse(other)
                .map(SchemaKind::Scalar)
                .ok_or_else(|| AppError::MalformedSchema(format!("unknown type '{}'", other)))?,
        };

        Ok(Schema {
            kind,
            enumeration: flat.enumeration,
        })
    }
}

fn merge_type(flat: &mut Flat, schema_type: Option<&str>) -> AppResult<()> {
    let Some(new) = schema_type else {
        return Ok(());
    };
    match flat.schema_type.as_deref() {
        None => {
            flat.schema_type = Some(new.to_string());
            Ok(())
        }
        Some(existing) if existing == new => Ok(()),
        Some(existing) => Err(AppError::MalformedSchema(format!(
            "conflicting allOf types '{}' and '{}'",
            existing, new
        ))),
    }
}

/// `false` wins over a schema, which wins over `true`.
fn merge_additional(flat: &mut Flat, additional: RawAdditionalProperties) {
    let merged = match (flat.additional_properties.take(), additional) {
        (Some(FlatAdditional::Forbidden), _) | (_, RawAdditionalProperties::Forbidden) => {
            FlatAdditional::Forbidden
        }
        (Some(FlatAdditional::Schema(mut ids)), RawAdditionalProperties::Schema(id)) => {
            ids.push(id);
            FlatAdditional::Schema(ids)
        }
        (Some(FlatAdditional::Schema(ids)), RawAdditionalProperties::Allowed) => {
            FlatAdditional::Schema(ids)
        }
        (_, RawAdditionalProperties::Schema(id)) => FlatAdditional::Schema(vec![id]),
        (_, RawAdditionalProperties::Allowed) => FlatAdditional::Allowed,
    };
    flat.additional_properties = Some(merged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::RECURSIVE_MARKER;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn normalized(value: Value) -> Value {
        normalize_value(&value).unwrap().to_value()
    }

    #[test]
    fn test_all_of_merges_properties_and_required() {
        let out = normalized(json!({
            "allOf": [
                {"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]},
                {"properties": {"name": {"type": "string"}}, "required": ["name"]}
            ]
        }));
        assert_eq!(
            out,
            json!({
                "type": "object",
                "properties": {"id": {"type": "string"}, "name": {"type": "string"}},
                "required": ["id", "name"]
            })
        );
    }

    #[test]
    fn test_all_of_with_refs() {
        let out = normalized(json!({
            "$defs": {
                "Base": {"type": "object", "properties": {"id": {"type": "string"}}}
            },
            "allOf": [
                {"$ref": "#/$defs/Base"},
                {"type": "object", "properties": {"extra": {"type": "integer"}}}
            ]
        }));
        assert_eq!(
            out,
            json!({
                "type": "object",
                "properties": {"id": {"type": "string"}, "extra": {"type": "integer"}}
            })
        );
    }

    #[test]
    fn test_conflicting_all_of_types_fail() {
        let err = normalize_value(&json!({
            "allOf": [{"type": "string"}, {"type": "integer"}]
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::MalformedSchema(_)));
    }

    #[test]
    fn test_any_of_picks_first_branch() {
        let out = normalized(json!({
            "anyOf": [
                {"type": "string", "enum": ["a"]},
                {"type": "integer"}
            ]
        }));
        assert_eq!(out, json!({"type": "string", "enum": ["a"]}));
    }

    #[test]
    fn test_any_of_skips_pending_reference() {
        let out = normalized(json!({
            "anyOf": [
                {"$ref": "other.yaml#/Thing"},
                {"type": "boolean"}
            ]
        }));
        assert_eq!(out, json!({"type": "boolean"}));
    }

    #[test]
    fn test_nested_composition_in_properties_and_items() {
        let out = normalized(json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {"allOf": [{"type": "string"}, {"enum": ["x", "y"]}]}
                },
                "meta": {
                    "type": "object",
                    "additionalProperties": {"anyOf": [{"type": "number"}]}
                }
            }
        }));
        assert_eq!(
            out,
            json!({
                "type": "object",
                "properties": {
                    "tags": {"type": "array", "items": {"type": "string", "enum": ["x", "y"]}},
                    "meta": {"type": "object", "additionalProperties": {"type": "number"}}
                }
            })
        );
    }

    #[test]
    fn test_composition_inside_merged_output() {
        let out = normalized(json!({
            "allOf": [
                {"allOf": [{"type": "object"}, {"properties": {"a": {"type": "string"}}}]},
                {"anyOf": [{"required": ["a"]}]}
            ]
        }));
        assert_eq!(
            out,
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}},
                "required": ["a"]
            })
        );
    }

    #[test]
    fn test_same_property_in_two_branches_is_merged() {
        let out = normalized(json!({
            "allOf": [
                {"type": "object", "properties": {"status": {"type": "string", "enum": ["a", "b", "c"]}}},
                {"properties": {"status": {"enum": ["b", "c", "d"]}}}
            ]
        }));
        assert_eq!(
            out["properties"]["status"],
            json!({"type": "string", "enum": ["b", "c"]})
        );
    }

    #[test]
    fn test_recursive_schema_terminates() {
        let out = normalized(json!({
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {"children": {"type": "array", "items": {"$ref": "#/$defs/Node"}}}
                }
            },
            "$ref": "#/$defs/Node",
            "description": "root"
        }));
        assert_eq!(out["type"], "object");
        assert_eq!(out["properties"]["children"]["items"]["type"], "object");
    }

    #[test]
    fn test_depth_limit() {
        let mut value = json!({"type": "string"});
        for _ in 0..10 {
            value = json!({"type": "array", "items": value});
        }
        let (arena, id) = load_schema_value(&value).unwrap();
        let err = SchemaNormalizer::new(&arena)
            .with_max_depth(5)
            .normalize(id)
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedSchema(_)));
    }

    #[test]
    fn test_idempotent() {
        let value = json!({
            "allOf": [
                {"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]},
                {"properties": {"kind": {"anyOf": [{"type": "string", "enum": ["a"]}, {"type": "null"}]}}}
            ],
            "additionalProperties": false
        });
        let once = normalize_value(&value).unwrap();
        let twice = normalize_value(&once.to_value()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_arena_untouched() {
        let value = json!({"allOf": [{"type": "object"}, {"required": ["a"]}]});
        let (arena, id) = load_schema_value(&value).unwrap();
        let before = arena.get(id).clone();
        SchemaNormalizer::new(&arena).normalize(id).unwrap();
        assert_eq!(arena.get(id), &before);
        assert!(arena.get(id).has_composition());
    }

    #[test]
    fn test_one_of_picks_first_resolvable_branch() {
        let out = normalized(json!({
            "oneOf": [
                {"$ref": "https://example.com/remote.json"},
                {"type": "object", "properties": {"id": {"type": "integer"}}},
                {"type": "string"}
            ]
        }));
        assert_eq!(
            out,
            json!({"type": "object", "properties": {"id": {"type": "integer"}}})
        );
    }

    #[test]
    fn test_all_of_additional_properties_false_wins() {
        let out = normalized(json!({
            "allOf": [
                {"type": "object", "additionalProperties": {"type": "string"}},
                {"additionalProperties": false},
                {"additionalProperties": true}
            ]
        }));
        assert_eq!(out, json!({"type": "object", "additionalProperties": false}));
    }

    #[test]
    fn test_all_of_additional_properties_schema_beats_true() {
        let out = normalized(json!({
            "allOf": [
                {"type": "object", "additionalProperties": true},
                {"additionalProperties": {"type": "integer"}},
                {"additionalProperties": {"enum": [1, 2]}}
            ]
        }));
        assert_eq!(
            out,
            json!({"type": "object", "additionalProperties": {"type": "integer", "enum": [1, 2]}})
        );
    }

    #[test]
    fn test_all_of_additional_properties_true_alone() {
        let out = normalized(json!({
            "allOf": [{"type": "object"}, {"additionalProperties": true}]
        }));
        assert_eq!(out, json!({"type": "object", "additionalProperties": true}));
    }

    #[test]
    fn test_false_property_schema_requires_impossible_field() {
        let out = normalized(json!({"type": "object", "properties": {"gone": false}}));
        assert_eq!(
            out["properties"]["gone"],
            json!({"type": "object", "required": ["__never__"], "additionalProperties": false})
        );
    }

    #[test]
    fn test_recursive_marker_round_trips() {
        let once = normalize_value(&json!({
            "$defs": {
                "Node": {"type": "object", "properties": {"next": {"$ref": "#/$defs/Node"}}}
            },
            "$ref": "#/$defs/Node",
            "description": "root"
        }))
        .unwrap();
        let rendered = once.to_value();
        assert_eq!(
            rendered["properties"]["next"]["properties"]["next"],
            json!({RECURSIVE_MARKER: true})
        );
        assert_eq!(normalize_value(&rendered).unwrap(), once);
    }

    #[test]
    fn test_marker_with_constraints_is_not_recursive() {
        let out = normalized(json!({
            "allOf": [{RECURSIVE_MARKER: true}, {"type": "string"}]
        }));
        assert_eq!(out, json!({"type": "string"}));
    }

    #[test]
    fn test_cycle_results_do_not_depend_on_entry_point() {
        let value = json!({
            "$defs": {
                "A": {"type": "object", "properties": {"b": {"$ref": "#/$defs/B"}}},
                "B": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": "string"}, "a": {"$ref": "#/$defs/A"}}
                }
            },
            "type": "object",
            "properties": {"a": {"$ref": "#/$defs/A"}, "b": {"$ref": "#/$defs/B"}}
        });
        let (arena, root) = load_schema_value(&value).unwrap();
        let a = arena.get(root).properties["a"];
        let b = arena.get(root).properties["b"];

        let mut shared = SchemaNormalizer::new(&arena);
        let a_first = shared.normalize(a).unwrap();
        let b_after_a = shared.normalize(b).unwrap();

        let b_alone = SchemaNormalizer::new(&arena).normalize(b).unwrap();
        let a_after_b = {
            let mut other = SchemaNormalizer::new(&arena);
            other.normalize(b).unwrap();
            other.normalize(a).unwrap()
        };

        assert_eq!(b_after_a, b_alone);
        assert_eq!(a_after_b, a_first);
        assert_eq!(
            b_alone.to_value()["properties"]["a"]["properties"]["b"],
            json!({RECURSIVE_MARKER: true})
        );
    }

    #[test]
    fn test_any_of_cycle_branch_is_not_memoized() {
        let value = json!({
            "$defs": {
                "Expr": {
                    "type": "object",
                    "properties": {"arg": {"$ref": "#/$defs/Arg"}}
                },
                "Arg": {"anyOf": [{"$ref": "#/$defs/Expr"}, {"type": "string"}]}
            },
            "type": "object",
            "properties": {"expr": {"$ref": "#/$defs/Expr"}, "arg": {"$ref": "#/$defs/Arg"}}
        });
        let (arena, root) = load_schema_value(&value).unwrap();
        let expr = arena.get(root).properties["expr"];
        let arg = arena.get(root).properties["arg"];

        let mut shared = SchemaNormalizer::new(&arena);
        shared.normalize(expr).unwrap();
        let arg_after_expr = shared.normalize(arg).unwrap();

        let arg_alone = SchemaNormalizer::new(&arena).normalize(arg).unwrap();
        assert_eq!(arg_after_expr, arg_alone);
        assert_eq!(arg_alone.type_name(), Some("object"));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = normalize_value(&json!({"type": "decimal"})).unwrap_err();
        assert!(matches!(err, AppError::MalformedSchema(_)));
    }
}
