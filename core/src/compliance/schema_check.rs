#![deny(missing_docs)]

//! # Schema Compatibility
//!
//! Decides whether an implementation schema is an acceptable structural subset
//! of the base schema at the same location. Both sides must already be
//! normalized. Rules, in order:
//!
//! 1. A base without `type` accepts anything.
//! 2. Differing `type`s are a single type conflict.
//! 3. Objects: shared properties recurse; base properties absent from the
//!    implementation are missing fields; implementation-only properties are
//!    checked against `additionalProperties`.
//! 4. Arrays: if the base declares `items`, the implementation must too.
//! 5. Enums: checked in the direction selected by [`EnumPolicy`].

use crate::oas::{AdditionalProperties, Endpoint, Schema, SchemaKind};
use crate::report::{ComplianceError, ConflictSubType, ConflictType, RouteConflict};
use serde_json::Value;

/// Direction of the enum compatibility rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPolicy {
    /// Every implementation value must appear in the base enum:
    /// the implementation may narrow the enum but not widen it.
    #[default]
    ImplSubsetOfBase,
    /// Every base value must appear in the implementation enum:
    /// the implementation may widen the enum but not drop values.
    BaseSubsetOfImpl,
}

/// Attribution stamped on every finding produced by one comparison.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Route being compared.
    pub endpoint: &'a Endpoint,
    /// Which part of the route is being compared.
    pub sub_type: ConflictSubType,
    /// Response status code, when comparing a response.
    pub status_code: Option<&'a str>,
    /// MIME type of the payload, when comparing a body.
    pub mime_type: Option<&'a str>,
    /// Enum rule direction.
    pub enum_policy: EnumPolicy,
}

impl CheckContext<'_> {
    fn conflict(
        &self,
        location: &str,
        conflict_type: ConflictType,
        message: String,
    ) -> ComplianceError {
        let mut conflict = RouteConflict::new(self.endpoint.clone(), self.sub_type, message)
            .with_location(location)
            .with_conflict_type(conflict_type);
        conflict.status_code = self.status_code.map(str::to_string);
        conflict.mime_type = self.mime_type.map(str::to_string);
        conflict.into()
    }
}

/// Compares `implementation` against `base` and returns every incompatibility.
pub fn check_schema(
    location: &str,
    base: &Schema,
    implementation: &Schema,
    ctx: &CheckContext<'_>,
) -> Vec<ComplianceError> {
    let mut errors = Vec::new();
    check_into(location, base, implementation, ctx, &mut errors);
    errors
}

fn check_into(
    location: &str,
    base: &Schema,
    implementation: &Schema,
    ctx: &CheckContext<'_>,
    errors: &mut Vec<ComplianceError>,
) {
    let Some(base_type) = base.type_name() else {
        return;
    };
    if matches!(implementation.kind, SchemaKind::Recursive) {
        return;
    }

    if let Some(impl_type) = implementation.type_name() {
        if impl_type != base_type {
            errors.push(ctx.conflict(
                location,
                ConflictType::TypeConflict,
                format!(
                    "Type mismatch: expected '{}', found '{}'",
                    base_type, impl_type
                ),
            ));
            return;
        }
    }

    match &base.kind {
        SchemaKind::Object(base_object) => {
            let impl_object = match &implementation.kind {
                SchemaKind::Object(object) => Some(object),
                _ => None,
            };

            for (name, base_prop) in &base_object.properties {
                let prop_location = child_location(location, name);
                match impl_object.and_then(|o| o.properties.get(name)) {
                    Some(impl_prop) => check_into(&prop_location, base_prop, impl_prop, ctx, errors),
                    None => {
                        let status = if base_object.required.contains(name) {
                            "required"
                        } else {
                            "optional"
                        };
                        errors.push(ctx.conflict(
                            &prop_location,
                            ConflictType::MissingField,
                            format!("Missing {} property '{}'", status, name),
                        ));
                    }
                }
            }

            let extras = impl_object
                .into_iter()
                .flat_map(|o| o.properties.iter())
                .filter(|(name, _)| !base_object.properties.contains_key(*name));
            for (name, impl_prop) in extras {
                let prop_location = child_location(location, name);
                match &base_object.additional_properties {
                    AdditionalProperties::Allowed => {}
                    AdditionalProperties::Schema(additional) => {
                        check_into(&prop_location, additional, impl_prop, ctx, errors)
                    }
                    AdditionalProperties::Unspecified | AdditionalProperties::Forbidden => {
                        errors.push(ctx.conflict(
                            &prop_location,
                            ConflictType::ExtraField,
                            format!("Unexpected property '{}' not defined in base schema", name),
                        ));
                    }
                }
            }
        }
        SchemaKind::Array(base_array) => {
            if let Some(base_items) = &base_array.items {
                let impl_items = match &implementation.kind {
                    SchemaKind::Array(array) => array.items.as_deref(),
                    _ => None,
                };
                match impl_items {
                    Some(impl_items) => {
                        check_into(&format!("{}[0]", location), base_items, impl_items, ctx, errors)
                    }
                    None => errors.push(ctx.conflict(
                        location,
                        ConflictType::MissingField,
                        "Array schema must define items".to_string(),
                    )),
                }
            }
        }
        SchemaKind::Scalar(_) | SchemaKind::Any | SchemaKind::Recursive => {}
    }

    if let (Some(base_enum), Some(impl_enum)) = (&base.enumeration, &implementation.enumeration) {
        check_enum(location, base_enum, impl_enum, ctx, errors);
    }
}

fn check_enum(
    location: &str,
    base_enum: &[Value],
    impl_enum: &[Value],
    ctx: &CheckContext<'_>,
    errors: &mut Vec<ComplianceError>,
) {
    match ctx.enum_policy {
        EnumPolicy::ImplSubsetOfBase => {
            for value in impl_enum.iter().filter(|v| !base_enum.contains(*v)) {
                errors.push(ctx.conflict(
                    location,
                    ConflictType::EnumConflict,
                    format!("Enum value {} is not allowed by the base schema", value),
                ));
            }
        }
        EnumPolicy::BaseSubsetOfImpl => {
            for value in base_enum.iter().filter(|v| !impl_enum.contains(*v)) {
                errors.push(ctx.conflict(
                    location,
                    ConflictType::EnumConflict,
                    format!("Enum value {} from the base schema is missing", value),
                ));
            }
        }
    }
}

fn child_location(location: &str, name: &str) -> String {
    if location.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", location, name)
    }
}
