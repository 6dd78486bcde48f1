//! PDF document metadata via `pdfinfo`, with fallbacks.

use std::path::Path;
use std::process::Command;

use super::extractor::{ExtractionError, PdfExtractStream};
use super::tools::handle_cmd_output;

/// The subset of `pdfinfo` output the pipeline uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub page_count: u32,
    /// `Title` metadata entry, if present and non-blank.
    pub title: Option<String>,
}

/// Source of per-document PDF metadata.
pub trait PdfInfoSource: Send + Sync {
    fn info(&self, path: &Path) -> Result<PdfInfo, ExtractionError>;
}

/// Reads metadata with Poppler's `pdfinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pdfinfo;

impl PdfInfoSource for Pdfinfo {
    fn info(&self, path: &Path) -> Result<PdfInfo, ExtractionError> {
        let output = Command::new("pdfinfo")
            .args(["-enc", "UTF-8"])
            .arg(path)
            .output();
        let stdout = handle_cmd_output(output, "pdfinfo failed")
            .map_err(|e| ExtractionError::from_tool("pdfinfo (install poppler-utils)", e))?;

        parse_pdfinfo(&stdout).ok_or_else(|| {
            ExtractionError::ExtractionFailed(format!(
                "pdfinfo reported no page count for {}",
                path.display()
            ))
        })
    }
}

/// Tries each source in order and returns the first answer.
pub struct FallbackInfo {
    sources: Vec<Box<dyn PdfInfoSource>>,
}

impl Default for FallbackInfo {
    /// `pdfinfo`, then pdf-extract's own page tree walk.
    fn default() -> Self {
        Self::new(vec![Box::new(Pdfinfo), Box::new(PdfExtractStream)])
    }
}

impl FallbackInfo {
    pub fn new(sources: Vec<Box<dyn PdfInfoSource>>) -> Self {
        Self { sources }
    }
}

impl PdfInfoSource for FallbackInfo {
    fn info(&self, path: &Path) -> Result<PdfInfo, ExtractionError> {
        let mut last_err = None;
        for source in &self.sources {
            match source.info(path) {
                Ok(info) => return Ok(info),
                Err(e) => {
                    tracing::warn!("Metadata source failed on {}: {}", path.display(), e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ExtractionError::ExtractionFailed("no metadata source configured".to_string())
        }))
    }
}

/// Parse `pdfinfo` stdout. Returns `None` when the page count is missing.
pub fn parse_pdfinfo(stdout: &str) -> Option<PdfInfo> {
    let mut page_count = None;
    let mut title = None;

    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            page_count = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("Title:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                title = Some(rest.to_string());
            }
        }
    }

    page_count.map(|page_count| PdfInfo { page_count, title })
}
