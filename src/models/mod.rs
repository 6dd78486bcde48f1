//! Data models for parsdoc output and failure logs.

mod failure;
mod record;
mod schema;

pub use failure::{FailureReason, FailureRecord};
pub use record::{Metadata, OutputRecord, TextType, LANGUAGE_FA};
pub use schema::{validate, SchemaViolation, REQUIRED_METADATA_FIELDS};
