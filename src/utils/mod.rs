//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `paths`: input discovery and deterministic output naming
//! - `mime`: content sniffing for files that claim to be PDFs

mod mime;
mod paths;

pub use mime::{is_pdf, sniff_mime, SNIFF_LEN};
pub use paths::{discover_pdfs, has_pdf_extension, output_filename, HASH_PREFIX_LEN};
