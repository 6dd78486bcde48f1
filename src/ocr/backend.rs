//! OCR engine abstraction.

use std::path::Path;

use thiserror::Error;

use super::tools::ToolFailure;

/// Errors from OCR operations.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("OCR exceeded the {0}s deadline")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    pub(crate) fn from_tool(hint: &str, failure: ToolFailure) -> Self {
        match failure {
            ToolFailure::NotFound => Self::BackendNotAvailable(hint.to_string()),
            ToolFailure::Failed(msg) => Self::OcrFailed(msg),
            ToolFailure::Io(e) => Self::Io(e),
        }
    }
}

/// Text recognized on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecognition {
    pub text: String,
    /// Mean word confidence in `[0, 1]`, if the engine reported any.
    pub confidence: Option<f64>,
}

/// An engine that can recognize the pages of a PDF.
pub trait OcrEngine: Send + Sync {
    /// Engine name used in logs.
    fn name(&self) -> &str;

    /// Number of pages in the document.
    fn page_count(&self, pdf_path: &Path) -> Result<u32, OcrError>;

    /// Rasterize and recognize one page (1-based).
    fn recognize_page(&self, pdf_path: &Path, page: u32) -> Result<PageRecognition, OcrError>;
}
