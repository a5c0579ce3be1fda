#![deny(missing_docs)]

//! # Route Compatibility
//!
//! For every `(path, method)` present in both documents (unless the base
//! operation is tagged `experimental`), checks:
//! - every base status code is declared by the implementation;
//! - response bodies of shared status codes, per base MIME type;
//! - query parameters: presence, required-ness and schema;
//! - the request body, per base MIME type.
//!
//! Schemas are normalized with one [`SchemaNormalizer`] per document, so
//! shared component schemas are flattened once per check.

use crate::compliance::normalizer::SchemaNormalizer;
use crate::compliance::schema_check::{check_schema, CheckContext, EnumPolicy};
use crate::compliance::CheckOptions;
use crate::error::AppResult;
use crate::oas::{Content, Document, Endpoint, Operation, Parameter};
use crate::report::{ComplianceError, ConflictSubType, RouteConflict};

/// Checks every route present in both documents.
pub fn check_matching_routes(
    base: &Document,
    implementation: &Document,
    options: &CheckOptions,
) -> AppResult<Vec<ComplianceError>> {
    RouteChecker::new(base, implementation, options).check_all()
}

struct RouteChecker<'a> {
    base: &'a Document,
    implementation: &'a Document,
    base_schemas: SchemaNormalizer<'a>,
    impl_schemas: SchemaNormalizer<'a>,
    enum_policy: EnumPolicy,
}

/// Where a compared payload lives.
struct Payload<'a> {
    sub_type: ConflictSubType,
    status_code: Option<&'a str>,
    root: &'static str,
}

impl<'a> RouteChecker<'a> {
    fn new(base: &'a Document, implementation: &'a Document, options: &CheckOptions) -> Self {
        Self {
            base,
            implementation,
            base_schemas: SchemaNormalizer::new(&base.schemas)
                .with_max_depth(options.max_schema_depth),
            impl_schemas: SchemaNormalizer::new(&implementation.schemas)
                .with_max_depth(options.max_schema_depth),
            enum_policy: options.enum_policy,
        }
    }

    fn check_all(&mut self) -> AppResult<Vec<ComplianceError>> {
        let mut errors = Vec::new();
        let base = self.base;
        let implementation = self.implementation;

        for (path, method, base_op) in base.operations() {
            let Some(impl_op) = implementation.operation(path, method) else {
                continue;
            };
            let endpoint = Endpoint::new(method, path);
            if base_op.is_experimental() {
                tracing::debug!(endpoint = %endpoint, "skipping experimental route");
                continue;
            }
            tracing::debug!(endpoint = %endpoint, "comparing shared route");
            self.check_operation(&endpoint, base_op, impl_op, &mut errors)?;
        }

        Ok(errors)
    }

    fn check_operation(
        &mut self,
        endpoint: &Endpoint,
        base_op: &Operation,
        impl_op: &Operation,
        errors: &mut Vec<ComplianceError>,
    ) -> AppResult<()> {
        for code in base_op.responses.keys() {
            if !impl_op.responses.contains_key(code) {
                errors.push(
                    RouteConflict::new(
                        endpoint.clone(),
                        ConflictSubType::MissingStatusCode,
                        format!("Missing status code {}", code),
                    )
                    .with_status_code(code.as_str())
                    .into(),
                );
            }
        }

        for (code, base_response) in &base_op.responses {
            if let Some(impl_response) = impl_op.responses.get(code) {
                let payload = Payload {
                    sub_type: ConflictSubType::ResponseBodyConflict,
                    status_code: Some(code.as_str()),
                    root: "response",
                };
                self.check_content(
                    endpoint,
                    &payload,
                    &base_response.content,
                    &impl_response.content,
                    errors,
                )?;
            }
        }

        for base_param in base_op.query_parameters() {
            self.check_query_parameter(endpoint, base_param, impl_op, errors)?;
        }

        if let Some(base_body) = &base_op.request_body {
            match &impl_op.request_body {
                None => errors.push(
                    RouteConflict::new(
                        endpoint.clone(),
                        ConflictSubType::RequestBodyConflict,
                        "Missing request body",
                    )
                    .into(),
                ),
                Some(impl_body) => {
                    let payload = Payload {
                        sub_type: ConflictSubType::RequestBodyConflict,
                        status_code: None,
                        root: "request",
                    };
                    self.check_content(
                        endpoint,
                        &payload,
                        &base_body.content,
                        &impl_body.content,
                        errors,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn check_content(
        &mut self,
        endpoint: &Endpoint,
        payload: &Payload<'_>,
        base_content: &Content,
        impl_content: &Content,
        errors: &mut Vec<ComplianceError>,
    ) -> AppResult<()> {
        for (mime, base_media) in base_content {
            let conflict = |message: String| {
                let mut conflict = RouteConflict::new(endpoint.clone(), payload.sub_type, message)
                    .with_mime_type(mime.as_str());
                conflict.status_code = payload.status_code.map(str::to_string);
                ComplianceError::from(conflict)
            };

            let Some(impl_media) = impl_content.get(mime) else {
                errors.push(conflict(format!("Missing content for media type '{}'", mime)));
                continue;
            };
            let Some(base_id) = base_media.schema else {
                continue;
            };
            let Some(impl_id) = impl_media.schema else {
                errors.push(conflict(format!("Missing schema for media type '{}'", mime)));
                continue;
            };

            let base_schema = self.base_schemas.normalize(base_id)?;
            let impl_schema = self.impl_schemas.normalize(impl_id)?;
            let ctx = CheckContext {
                endpoint,
                sub_type: payload.sub_type,
                status_code: payload.status_code,
                mime_type: Some(mime.as_str()),
                enum_policy: self.enum_policy,
            };
            errors.extend(check_schema(payload.root, &base_schema, &impl_schema, &ctx));
        }
        Ok(())
    }

    fn check_query_parameter(
        &mut self,
        endpoint: &Endpoint,
        base_param: &Parameter,
        impl_op: &Operation,
        errors: &mut Vec<ComplianceError>,
    ) -> AppResult<()> {
        let location = format!("query.{}", base_param.name);
        let conflict = |message: String| -> ComplianceError {
            RouteConflict::new(endpoint.clone(), ConflictSubType::QueryParamConflict, message)
                .with_location(location.as_str())
                .into()
        };

        let Some(impl_param) = impl_op.query_parameter(&base_param.name) else {
            errors.push(conflict(format!(
                "Missing required query parameter '{}'",
                base_param.name
            )));
            return Ok(());
        };

        if base_param.required && !impl_param.required {
            errors.push(conflict(format!(
                "Query parameter '{}' must be required",
                base_param.name
            )));
        }

        if let (Some(base_id), Some(impl_id)) = (base_param.schema, impl_param.schema) {
            let base_schema = self.base_schemas.normalize(base_id)?;
            let impl_schema = self.impl_schemas.normalize(impl_id)?;
            let ctx = CheckContext {
                endpoint,
                sub_type: ConflictSubType::QueryParamConflict,
                status_code: None,
                mime_type: None,
                enum_policy: self.enum_policy,
            };
            errors.extend(check_schema(&location, &base_schema, &impl_schema, &ctx));
        }
        Ok(())
    }
}
