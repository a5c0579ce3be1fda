#![deny(missing_docs)]

//! # Schema Model
//!
//! Two representations of a JSON Schema live here:
//!
//! - [`SchemaNode`]: a node exactly as loaded, composition keywords intact,
//!   stored in a [`SchemaArena`] and addressed by [`SchemaId`]. Shared `$ref`
//!   targets map to a single handle, so self-referential models are plain
//!   graph edges.
//! - [`Schema`]: the normalized, composition-free tree handed to the
//!   compatibility checker. Its shape is a tagged union over `type`.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Extension keyword that [`Schema::to_value`] writes for a cycle back-edge,
/// so a rendered schema loads back as [`SchemaKind::Recursive`].
pub const RECURSIVE_MARKER: &str = "x-apicheck-recursive";

/// Handle to a node inside a [`SchemaArena`].
///
/// Handles are only meaningful for the arena that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

/// `additionalProperties` as written in a raw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAdditionalProperties {
    /// `additionalProperties: true`
    Allowed,
    /// `additionalProperties: false`
    Forbidden,
    /// `additionalProperties: { ... }`
    Schema(SchemaId),
}

/// A schema node as loaded from the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// The `type` keyword; `None` means "any".
    pub schema_type: Option<String>,
    /// Declared properties, in document order.
    pub properties: IndexMap<String, SchemaId>,
    /// Names listed under `required`.
    pub required: Vec<String>,
    /// The `items` schema.
    pub items: Option<SchemaId>,
    /// The `additionalProperties` keyword, if present.
    pub additional_properties: Option<RawAdditionalProperties>,
    /// The `enum` literal list.
    pub enumeration: Option<Vec<Value>>,
    /// `allOf` branches.
    pub all_of: Vec<SchemaId>,
    /// `anyOf` branches.
    pub any_of: Vec<SchemaId>,
    /// `oneOf` branches (treated like `anyOf`).
    pub one_of: Vec<SchemaId>,
    /// Set when the node is an unresolved (external) `$ref`.
    pub pending_ref: Option<String>,
    /// Set when the node carries [`RECURSIVE_MARKER`].
    pub recursive: bool,
}

impl SchemaNode {
    /// Returns `true` if the node is an unresolved reference.
    pub fn is_pending(&self) -> bool {
        self.pending_ref.is_some()
    }

    /// Returns `true` if the node still carries `allOf`, `anyOf` or `oneOf`.
    pub fn has_composition(&self) -> bool {
        !self.all_of.is_empty() || !self.any_of.is_empty() || !self.one_of.is_empty()
    }
}

/// Owning storage for raw schema nodes.
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
}

impl SchemaArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a node and returns its handle.
    pub fn alloc(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    /// Reserves a slot for a node whose content is built later
    /// (used to tie recursive `$ref` cycles).
    pub(crate) fn reserve(&mut self) -> SchemaId {
        self.alloc(SchemaNode::default())
    }

    /// Fills a previously reserved slot.
    pub(crate) fn set(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.0] = node;
    }

    /// Returns the node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different arena and is out of range.
    pub fn get(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node has been stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Primitive JSON Schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
}

impl ScalarType {
    /// Parses a scalar `type` keyword value.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// The keyword spelling of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

/// Normalized `additionalProperties`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    /// Keyword absent.
    #[default]
    Unspecified,
    /// `true`
    Allowed,
    /// `false`
    Forbidden,
    /// A schema every extra property must satisfy.
    Schema(Box<Schema>),
}

/// Payload of an `object` schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    /// Declared properties.
    pub properties: IndexMap<String, Schema>,
    /// Required property names.
    pub required: BTreeSet<String>,
    /// Policy for undeclared properties.
    pub additional_properties: AdditionalProperties,
}

/// Payload of an `array` schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArraySchema {
    /// The element schema, if declared.
    pub items: Option<Box<Schema>>,
}

/// The shape of a normalized schema, one variant per `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// No `type`: anything goes.
    Any,
    /// `type: object`
    Object(ObjectSchema),
    /// `type: array`
    Array(ArraySchema),
    /// `string`, `number`, `integer`, `boolean` or `null`.
    Scalar(ScalarType),
    /// Back-edge to a schema that was still being normalized (a cycle).
    Recursive,
}

/// A normalized, composition-free schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Type-specific shape.
    pub kind: SchemaKind,
    /// Allowed literal values, if restricted.
    pub enumeration: Option<Vec<Value>>,
}

impl Schema {
    /// Wraps a kind without an `enum` restriction.
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            enumeration: None,
        }
    }

    /// The `type` keyword this schema carries, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        match &self.kind {
            SchemaKind::Any | SchemaKind::Recursive => None,
            SchemaKind::Object(_) => Some("object"),
            SchemaKind::Array(_) => Some("array"),
            SchemaKind::Scalar(scalar) => Some(scalar.as_str()),
        }
    }

    /// Renders the schema back to JSON.
    ///
    /// `Recursive` renders as `{"x-apicheck-recursive": true}`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = self.type_name() {
            map.insert("type".into(), Value::String(name.into()));
        }

        match &self.kind {
            SchemaKind::Object(object) => {
                if !object.properties.is_empty() {
                    let props = object
                        .properties
                        .iter()
                        .map(|(name, schema)| (name.clone(), schema.to_value()))
                        .collect();
                    map.insert("properties".into(), Value::Object(props));
                }
                if !object.required.is_empty() {
                    let required = object.required.iter().cloned().map(Value::String).collect();
                    map.insert("required".into(), Value::Array(required));
                }
                match &object.additional_properties {
                    AdditionalProperties::Unspecified => {}
                    AdditionalProperties::Allowed => {
                        map.insert("additionalProperties".into(), Value::Bool(true));
                    }
                    AdditionalProperties::Forbidden => {
                        map.insert("additionalProperties".into(), Value::Bool(false));
                    }
                    AdditionalProperties::Schema(schema) => {
                        map.insert("additionalProperties".into(), schema.to_value());
                    }
                }
            }
            SchemaKind::Array(array) => {
                if let Some(items) = &array.items {
                    map.insert("items".into(), items.to_value());
                }
            }
            SchemaKind::Recursive => {
                map.insert(RECURSIVE_MARKER.into(), Value::Bool(true));
            }
            SchemaKind::Any | SchemaKind::Scalar(_) => {}
        }

        if let Some(values) = &self.enumeration {
            map.insert("enum".into(), Value::Array(values.clone()));
        }

        Value::Object(map)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arena_reserve_and_set() {
        let mut arena = SchemaArena::new();
        let id = arena.reserve();
        assert_eq!(arena.get(id), &SchemaNode::default());

        let node = SchemaNode {
            schema_type: Some("string".into()),
            ..SchemaNode::default()
        };
        arena.set(id, node.clone());
        assert_eq!(arena.get(id), &node);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_scalar_type_parse() {
        assert_eq!(ScalarType::parse("integer"), Some(ScalarType::Integer));
        assert_eq!(ScalarType::parse("object"), None);
        assert_eq!(ScalarType::Boolean.as_str(), "boolean");
    }

    #[test]
    fn test_object_to_value() {
        let mut properties = IndexMap::new();
        properties.insert("id".to_string(), Schema::of(SchemaKind::Scalar(ScalarType::String)));
        let schema = Schema::of(SchemaKind::Object(ObjectSchema {
            properties,
            required: BTreeSet::from(["id".to_string()]),
            additional_properties: AdditionalProperties::Forbidden,
        }));

        assert_eq!(
            schema.to_value(),
            json!({
                "type": "object",
                "properties": {"id": {"type": "string"}},
                "required": ["id"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn test_any_with_enum_to_value() {
        let schema = Schema {
            kind: SchemaKind::Any,
            enumeration: Some(vec![json!("A")]),
        };
        assert_eq!(schema.to_value(), json!({"enum": ["A"]}));
        assert_eq!(schema.type_name(), None);
    }

    #[test]
    fn test_recursive_to_value_keeps_marker() {
        let schema = Schema::of(SchemaKind::Recursive);
        assert_eq!(schema.to_value(), json!({RECURSIVE_MARKER: true}));
        assert_eq!(schema.type_name(), None);
    }
}
