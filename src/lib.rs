//! parsdoc - Persian PDF corpus ingestion.
//!
//! Turns a directory of Persian PDFs into one validated JSON record per
//! document. Each PDF is classified as text-layer or scanned, extracted
//! natively or through Tesseract, cleaned of repeated headers and footers,
//! normalized to Persian code points, split into paragraphs, scored for
//! integrity and checked against the output schema.

pub mod cli;
pub mod config;
pub mod models;
pub mod ocr;
pub mod services;
pub mod text;
pub mod utils;
