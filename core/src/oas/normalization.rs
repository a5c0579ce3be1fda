#![deny(missing_docs)]

//! # OpenAPI 3.1 -> 3.0 Shape Conversion
//!
//! Rewrites the few OpenAPI 3.1 / JSON Schema 2020-12 constructs the loader
//! does not understand into their 3.0 equivalents. Only schema positions are
//! touched; examples, defaults and enum literals are left verbatim.

use serde_json::{json, Map, Value};

/// Keys whose values are literal data rather than schemas.
const LITERAL_KEYS: [&str; 5] = ["example", "examples", "default", "enum", "const"];

/// Applies every conversion to a whole document.
pub(crate) fn convert_to_oas30(value: &mut Value) {
    normalize_schema_fields(value);
}

/// Applies every conversion to a standalone schema.
pub(crate) fn convert_schema_to_oas30(value: &mut Value) {
    normalize_schema_node(value);
}

/// Walks a document and normalizes every value found in a schema position.
fn normalize_schema_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                match key.as_str() {
                    "schema" => normalize_schema_node(v),
                    "schemas" | "$defs" | "definitions" => {
                        if let Some(defs) = v.as_object_mut() {
                            for schema in defs.values_mut() {
                                normalize_schema_node(schema);
                            }
                        }
                    }
                    k if LITERAL_KEYS.contains(&k) => {}
                    _ => normalize_schema_fields(v),
                }
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                normalize_schema_fields(v);
            }
        }
        _ => {}
    }
}

/// Normalizes a single schema and its subschemas.
fn normalize_schema_node(value: &mut Value) {
    if let Value::Bool(flag) = value {
        *value = bool_schema_replacement(*flag);
        return;
    }

    let Value::Object(map) = value else {
        return;
    };

    normalize_const(map);
    if let Some(replacement) = normalize_type_array(map) {
        *value = replacement;
        // The replacement is an `anyOf` of fresh single-type schemas.
        normalize_schema_node(value);
        return;
    }

    if let Some(props) = map.get_mut("properties").and_then(|v| v.as_object_mut()) {
        for v in props.values_mut() {
            normalize_schema_node(v);
        }
    }
    if let Some(defs) = map.get_mut("$defs").and_then(|v| v.as_object_mut()) {
        for v in defs.values_mut() {
            normalize_schema_node(v);
        }
    }
    for key in ["items", "additionalProperties", "not"] {
        if let Some(child) = map.get_mut(key) {
            // `additionalProperties: true/false` is a keyword value, not a boolean schema.
            if key == "additionalProperties" && child.is_boolean() {
                continue;
            }
            normalize_schema_node(child);
        }
    }
    for key in ["allOf", "anyOf", "oneOf"] {
        if let Some(branches) = map.get_mut(key).and_then(|v| v.as_array_mut()) {
            for v in branches.iter_mut() {
                normalize_schema_node(v);
            }
        }
    }
}

/// `const: v` becomes `enum: [v]`, inferring `type` from the literal when absent.
fn normalize_const(map: &mut Map<String, Value>) {
    let Some(const_val) = map.remove("const") else {
        return;
    };
    if !map.contains_key("type") {
        if let Some(type_name) = infer_schema_type(&const_val) {
            map.insert("type".to_string(), Value::String(type_name));
        }
    }
    if !map.contains_key("enum") {
        map.insert("enum".to_string(), Value::Array(vec![const_val]));
    }
}

/// Rewrites an array-valued `type`.
///
/// - `[T, "null"]` -> `type: T, nullable: true` (in place, returns `None`)
/// - `["null"]` -> `type: "null"` (in place)
/// - `[T1, T2, ...]` -> `anyOf` of one schema per type (returned as replacement)
fn normalize_type_array(map: &mut Map<String, Value>) -> Option<Value> {
    let types: Vec<String> = match map.get("type") {
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => return None,
    };

    let nullable = types.iter().any(|t| t == "null");
    let concrete: Vec<&String> = types.iter().filter(|t| *t != "null").collect();

    match concrete.as_slice() {
        [] => {
            map.insert("type".into(), Value::String("null".into()));
            None
        }
        [single] => {
            map.insert("type".into(), Value::String((*single).clone()));
            if nullable {
                map.insert("nullable".into(), Value::Bool(true));
            }
            None
        }
        many => {
            let branches = many
                .iter()
                .map(|t| {
                    let mut branch = map.clone();
                    branch.insert("type".into(), Value::String((*t).clone()));
                    Value::Object(branch)
                })
                .collect();
            let mut replacement = Map::new();
            replacement.insert("anyOf".into(), Value::Array(branches));
            if nullable {
                replacement.insert("nullable".into(), Value::Bool(true));
            }
            Some(Value::Object(replacement))
        }
    }
}

fn infer_schema_type(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => Some("string".to_string()),
        Value::Bool(_) => Some("boolean".to_string()),
        Value::Number(num) => {
            if num.is_i64() || num.is_u64() {
                Some("integer".to_string())
            } else {
                Some("number".to_string())
            }
        }
        Value::Array(_) => Some("array".to_string()),
        Value::Object(_) => Some("object".to_string()),
        Value::Null => Some("null".to_string()),
    }
}

fn bool_schema_replacement(flag: bool) -> Value {
    if flag {
        Value::Object(Map::new())
    } else {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["__never__"]
        })
    }
}
