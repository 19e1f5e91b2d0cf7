//! Result-returning adapters over the schema engine.
//!
//! Validation failure must compose as data with the rest of the pipeline,
//! so these adapters absorb the engine's issue lists and republish them as
//! `AppError` values. From a caller's perspective validation never panics.

use super::{ListSchema, SchemaCheck};
use crate::core::{AppError, AppResult};
use serde_json::Value as JsonValue;

/// Validates `raw` against `schema`, passing the value through on success.
pub fn validate_with_schema(
    schema: &ListSchema,
    raw: JsonValue,
    context: &str,
) -> AppResult<JsonValue> {
    match schema.safe_validate(&raw) {
        SchemaCheck::Valid => Ok(raw),
        SchemaCheck::Invalid(issues) => Err(AppError::from_schema_issues(&issues, context)),
    }
}

/// Partial-mode variant for partial-update payloads: missing fields are
/// fine, present fields must still have the declared shape.
pub fn validate_partial_with_schema(
    schema: &ListSchema,
    raw: JsonValue,
    context: &str,
) -> AppResult<JsonValue> {
    match schema.safe_validate_partial(&raw) {
        SchemaCheck::Valid => Ok(raw),
        SchemaCheck::Invalid(issues) => Err(AppError::from_schema_issues(&issues, context)),
    }
}
