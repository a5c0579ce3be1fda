#![deny(missing_docs)]

//! # Document Loader
//!
//! Turns a raw OpenAPI JSON value into a [`Document`], resolving local `$ref`
//! pointers along the way. Schemas land in a [`SchemaArena`]; each referenced
//! pointer is loaded once and reused, which ties recursive models into cycles
//! rather than unrolling them.

use crate::error::{AppError, AppResult};
use crate::oas::document::{
    Body, Content, Document, MediaType, Method, Operation, Parameter, ParameterLocation,
    PathItem, Response,
};
use crate::oas::ref_utils::{is_local_ref, lookup_pointer, ref_of, resolve_object};
use crate::oas::schema::{
    RawAdditionalProperties, SchemaArena, SchemaId, SchemaNode, RECURSIVE_MARKER,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Loads a document from a (3.0-shaped) JSON value.
pub(crate) fn load_document(root: &Value) -> AppResult<Document> {
    let mut loader = Loader::new(root);

    let mut paths = IndexMap::new();
    if let Some(raw_paths) = root.get("paths") {
        let raw_paths = as_object(raw_paths, "paths")?;
        for (path, raw_item) in raw_paths {
            if !path.starts_with('/') {
                return Err(AppError::Parse(format!(
                    "Path '{}' must start with '/'",
                    path
                )));
            }
            let item = loader.load_path_item(path, raw_item)?;
            paths.insert(path.clone(), item);
        }
    }

    Ok(Document {
        paths,
        schemas: loader.arena,
    })
}

/// Loads a standalone schema; local references resolve against the schema itself.
pub(crate) fn load_schema_value(root: &Value) -> AppResult<(SchemaArena, SchemaId)> {
    let mut loader = Loader::new(root);
    let id = loader.load_schema(root)?;
    Ok((loader.arena, id))
}

struct Loader<'a> {
    root: &'a Value,
    arena: SchemaArena,
    by_pointer: HashMap<String, SchemaId>,
}

impl<'a> Loader<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            arena: SchemaArena::new(),
            by_pointer: HashMap::new(),
        }
    }

    fn load_path_item(&mut self, path: &str, raw: &'a Value) -> AppResult<PathItem> {
        let item = as_object(resolve_object(self.root, raw)?, path)?;
        let shared = match item.get("parameters") {
            Some(raw_params) => self.load_parameters(raw_params)?,
            None => Vec::new(),
        };

        let mut operations = IndexMap::new();
        for method in Method::ALL {
            if let Some(raw_op) = item.get(method.key()) {
                let context = format!("{} {}", method, path);
                operations.insert(method, self.load_operation(&context, raw_op, &shared)?);
            }
        }

        Ok(PathItem { operations })
    }

    fn load_operation(
        &mut self,
        context: &str,
        raw: &'a Value,
        shared: &[Parameter],
    ) -> AppResult<Operation> {
        let op = as_object(raw, context)?;

        let tags = match op.get("tags") {
            Some(Value::Array(tags)) => tags
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(_) => {
                return Err(AppError::Parse(format!(
                    "{}: 'tags' must be an array",
                    context
                )))
            }
            None => Default::default(),
        };

        let own = match op.get("parameters") {
            Some(raw_params) => self.load_parameters(raw_params)?,
            None => Vec::new(),
        };
        let parameters = merge_parameters(shared, own);

        let request_body = match op.get("requestBody") {
            Some(raw_body) => {
                let body = as_object(resolve_object(self.root, raw_body)?, context)?;
                Some(Body {
                    content: self.load_content(body.get("content"))?,
                })
            }
            None => None,
        };

        let mut responses = IndexMap::new();
        if let Some(raw_responses) = op.get("responses") {
            for (code, raw_response) in as_object(raw_responses, context)? {
                let response = as_object(resolve_object(self.root, raw_response)?, context)?;
                responses.insert(
                    code.clone(),
                    Response {
                        content: self.load_content(response.get("content"))?,
                    },
                );
            }
        }

        Ok(Operation {
            tags,
            parameters,
            request_body,
            responses,
        })
    }

    fn load_parameters(&mut self, raw: &'a Value) -> AppResult<Vec<Parameter>> {
        let Value::Array(items) = raw else {
            return Err(AppError::Parse("'parameters' must be an array".into()));
        };
        items.iter().map(|p| self.load_parameter(p)).collect()
    }

    fn load_parameter(&mut self, raw: &'a Value) -> AppResult<Parameter> {
        let param = as_object(resolve_object(self.root, raw)?, "parameter")?;

        let name = param
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Parse("Parameter is missing 'name'".into()))?;
        let location = param
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse)
            .ok_or_else(|| {
                AppError::Parse(format!("Parameter '{}' has an invalid 'in' value", name))
            })?;
        let required = param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let schema = param
            .get("schema")
            .map(|s| self.load_schema(s))
            .transpose()?;

        Ok(Parameter {
            name: name.to_string(),
            location,
            required,
            schema,
        })
    }

    fn load_content(&mut self, raw: Option<&'a Value>) -> AppResult<Content> {
        let mut content = Content::new();
        let Some(raw) = raw else {
            return Ok(content);
        };

        for (mime, raw_media) in as_object(raw, "content")? {
            let media = as_object(raw_media, mime)?;
            let schema = media
                .get("schema")
                .map(|s| self.load_schema(s))
                .transpose()?;
            content.insert(mime.clone(), MediaType { schema });
        }
        Ok(content)
    }

    /// Loads an inline schema or a reference to one.
    fn load_schema(&mut self, raw: &'a Value) -> AppResult<SchemaId> {
        let map = as_object(raw, "schema")?;
        if let Some(ref_str) = ref_of(raw) {
            if map.len() == 1 {
                return self.load_schema_ref(ref_str);
            }
        }
        let node = self.build_node(map)?;
        Ok(self.arena.alloc(node))
    }

    fn load_schema_ref(&mut self, ref_str: &str) -> AppResult<SchemaId> {
        if let Some(id) = self.by_pointer.get(ref_str) {
            return Ok(*id);
        }

        if !is_local_ref(ref_str) {
            tracing::warn!(reference = ref_str, "external schema reference left unresolved");
            let id = self.arena.alloc(SchemaNode {
                pending_ref: Some(ref_str.to_string()),
                ..SchemaNode::default()
            });
            self.by_pointer.insert(ref_str.to_string(), id);
            return Ok(id);
        }

        let target = lookup_pointer(self.root, ref_str)?;
        let id = self.arena.reserve();
        self.by_pointer.insert(ref_str.to_string(), id);
        let node = self.build_node(as_object(target, ref_str)?)?;
        self.arena.set(id, node);
        Ok(id)
    }

    fn build_node(&mut self, map: &'a Map<String, Value>) -> AppResult<SchemaNode> {
        let mut node = SchemaNode::default();

        // A `$ref` with siblings constrains alongside them.
        if let Some(Value::String(ref_str)) = map.get("$ref") {
            node.all_of.push(self.load_schema_ref(ref_str)?);
        }

        match map.get("type") {
            Some(Value::String(t)) => node.schema_type = Some(t.clone()),
            Some(other) => {
                return Err(AppError::MalformedSchema(format!(
                    "'type' must be a string, found {}",
                    other
                )))
            }
            None => {}
        }

        if let Some(raw_props) = map.get("properties") {
            for (name, raw_prop) in as_object(raw_props, "properties")? {
                let id = self.load_schema(raw_prop)?;
                node.properties.insert(name.clone(), id);
            }
        }

        if let Some(raw_required) = map.get("required") {
            // Boolean `required` belongs to parameters; ignore it on schemas.
            if let Value::Array(names) = raw_required {
                node.required = names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
            }
        }

        if let Some(raw_items) = map.get("items") {
            if raw_items.is_array() {
                return Err(AppError::MalformedSchema(
                    "tuple-style 'items' arrays are not supported".into(),
                ));
            }
            node.items = Some(self.load_schema(raw_items)?);
        }

        node.additional_properties = match map.get("additionalProperties") {
            Some(Value::Bool(true)) => Some(RawAdditionalProperties::Allowed),
            Some(Value::Bool(false)) => Some(RawAdditionalProperties::Forbidden),
            Some(raw) => Some(RawAdditionalProperties::Schema(self.load_schema(raw)?)),
            None => None,
        };

        match map.get("enum") {
            Some(Value::Array(values)) => node.enumeration = Some(values.clone()),
            Some(_) => {
                return Err(AppError::MalformedSchema("'enum' must be an array".into()));
            }
            None => {}
        }

        node.recursive = map.get(RECURSIVE_MARKER) == Some(&Value::Bool(true));

        node.all_of.extend(self.load_branches(map.get("allOf"), "allOf")?);
        node.any_of = self.load_branches(map.get("anyOf"), "anyOf")?;
        node.one_of = self.load_branches(map.get("oneOf"), "oneOf")?;

        Ok(node)
    }

    fn load_branches(&mut self, raw: Option<&'a Value>, keyword: &str) -> AppResult<Vec<SchemaId>> {
        match raw {
            Some(Value::Array(branches)) => branches.iter().map(|b| self.load_schema(b)).collect(),
            Some(_) => Err(AppError::MalformedSchema(format!(
                "'{}' must be an array",
                keyword
            ))),
            None => Ok(Vec::new()),
        }
    }
}

/// Operation-level parameters override path-level ones with the same `(name, in)`.
fn merge_parameters(shared: &[Parameter], own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = shared
        .iter()
        .filter(|s| {
            !own
                .iter()
                .any(|o| o.name == s.name && o.location == s.location)
        })
        .cloned()
        .collect();
    merged.extend(own);
    merged
}

fn as_object<'v>(value: &'v Value, context: &str) -> AppResult<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        AppError::Parse(format!("Expected an object at '{}', found {}", context, value))
    })
}
