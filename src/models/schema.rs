//! Structural validation of emitted records.
//!
//! Runs on the serialized JSON value, so what is checked is exactly what
//! would be written to disk.

use serde_json::Value;
use thiserror::Error;

use super::record::{TextType, LANGUAGE_FA};

/// Metadata keys every record must carry.
pub const REQUIRED_METADATA_FIELDS: &[&str] = &[
    "source_path",
    "page_count",
    "text_type",
    "language",
    "integrity_score",
];

/// The first structural rule a record broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema violation in `{field}`: {problem}")]
pub struct SchemaViolation {
    /// Offending field name, used in the `schema:<field>` failure reason.
    pub field: &'static str,
    pub problem: &'static str,
}

impl SchemaViolation {
    fn new(field: &'static str, problem: &'static str) -> Self {
        Self { field, problem }
    }
}

/// Validate a record. Checks run in a fixed order and stop at the first
/// violation.
pub fn validate(record: &Value) -> Result<(), SchemaViolation> {
    if !record.get("title").is_some_and(Value::is_string) {
        return Err(SchemaViolation::new("title", "must be a string"));
    }

    let paragraphs_ok = record
        .get("paragraphs")
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(Value::is_string));
    if !paragraphs_ok {
        return Err(SchemaViolation::new("paragraphs", "must be an array of strings"));
    }

    let Some(metadata) = record.get("metadata").and_then(Value::as_object) else {
        return Err(SchemaViolation::new("metadata", "must be an object"));
    };

    if let Some(missing) = REQUIRED_METADATA_FIELDS
        .iter()
        .find(|field| !metadata.contains_key(**field))
    {
        return Err(SchemaViolation::new(*missing, "is missing"));
    }

    if metadata.get("language").and_then(Value::as_str) != Some(LANGUAGE_FA) {
        return Err(SchemaViolation::new("language", "must be \"fa\""));
    }

    if !metadata
        .get("page_count")
        .is_some_and(|v| v.is_u64() || v.is_i64())
    {
        return Err(SchemaViolation::new("page_count", "must be an integer"));
    }

    if !metadata.get("integrity_score").is_some_and(Value::is_number) {
        return Err(SchemaViolation::new("integrity_score", "must be a number"));
    }

    let text_type_ok = metadata
        .get("text_type")
        .and_then(Value::as_str)
        .and_then(TextType::from_str)
        .is_some();
    if !text_type_ok {
        return Err(SchemaViolation::new("text_type", "must be \"text\" or \"image\""));
    }

    Ok(())
}
