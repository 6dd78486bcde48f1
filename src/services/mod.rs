//! Service layer for parsdoc.
//!
//! Provides the classification, scoring and batch conversion logic used by
//! the CLI commands. Progress is reported through event channels.

pub mod classify;
pub mod convert;
pub mod report;
pub mod scoring;

pub use classify::{classify, Classification};
pub use convert::{
    BatchError, BatchEvent, BatchTally, ConvertService, DocumentOutcome, OutcomeStatus, Pipeline,
};
pub use scoring::{score, ScoreInputs};
