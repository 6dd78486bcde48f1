//! Native text-layer extraction.
//!
//! Two independent methods read a PDF's embedded text: Poppler's
//! `pdftotext -layout`, run page by page, and `pdf-extract`'s content-stream
//! decoder. Whichever recovers more characters wins.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::process::Command;

use thiserror::Error;

use super::pdf_utils::{PdfInfo, PdfInfoSource};
use super::tools::{handle_cmd_output, ToolFailure};

/// Errors that can occur during native text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("PDF parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub(crate) fn from_tool(tool_name: &str, failure: ToolFailure) -> Self {
        match failure {
            ToolFailure::NotFound => Self::ToolNotFound(tool_name.to_string()),
            ToolFailure::Failed(msg) => Self::ExtractionFailed(msg),
            ToolFailure::Io(e) => Self::Io(e),
        }
    }
}

/// A way of reading a PDF's embedded text layer.
pub trait NativeMethod: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract `page_count` pages of text. Individual page failures yield an
    /// empty string for that page; `Err` means the method failed outright.
    fn extract_pages(&self, path: &Path, page_count: u32) -> Result<Vec<String>, ExtractionError>;
}

/// Pages produced by one native method.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeExtraction {
    pub method: &'static str,
    pub pages: Vec<String>,
}

impl NativeExtraction {
    pub fn new(method: &'static str, pages: Vec<String>) -> Self {
        Self { method, pages }
    }

    /// Total characters across pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

/// Pick the candidate with the most characters. Ties keep the earlier one.
pub fn select_longest(candidates: Vec<NativeExtraction>) -> Option<NativeExtraction> {
    candidates.into_iter().reduce(|best, candidate| {
        if candidate.total_chars() > best.total_chars() {
            candidate
        } else {
            best
        }
    })
}

/// Layout-preserving extraction with `pdftotext -layout`, one page at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfToTextLayout;

impl PdfToTextLayout {
    /// Run pdftotext on a single page of a PDF file.
    pub fn extract_page(&self, path: &Path, page: u32) -> Result<String, ExtractionError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(path)
            .arg("-")
            .output();

        handle_cmd_output(output, &format!("pdftotext failed on page {}", page))
            .map_err(|e| ExtractionError::from_tool("pdftotext (install poppler-utils)", e))
    }
}

impl NativeMethod for PdfToTextLayout {
    fn name(&self) -> &'static str {
        "pdftotext-layout"
    }

    fn extract_pages(&self, path: &Path, page_count: u32) -> Result<Vec<String>, ExtractionError> {
        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            match self.extract_page(path, page) {
                Ok(text) => pages.push(text),
                // Without the binary every page would fail the same way.
                Err(e @ ExtractionError::ToolNotFound(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("pdftotext page {} of {}: {}", page, path.display(), e);
                    pages.push(String::new());
                }
            }
        }
        Ok(pages)
    }
}

/// Content-stream decoding with the `pdf-extract` crate.
///
/// Pure Rust, so it also serves as the page-count source when Poppler is
/// missing or cannot open a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractStream;

impl PdfExtractStream {
    /// Decode every page of the file, in document order.
    pub fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let bytes = std::fs::read(path)?;

        // pdf-extract panics on some malformed fonts and streams.
        catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        }))
        .map_err(|_| ExtractionError::Parse("pdf-extract panicked".to_string()))?
        .map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}

impl NativeMethod for PdfExtractStream {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract_pages(&self, path: &Path, page_count: u32) -> Result<Vec<String>, ExtractionError> {
        let pages = self.read_pages(path)?;
        if pages.len() != page_count as usize {
            tracing::debug!(
                "pdf-extract decoded {} pages of {}, expected {}",
                pages.len(),
                path.display(),
                page_count
            );
        }
        Ok(fit_page_count(pages, page_count))
    }
}

impl PdfInfoSource for PdfExtractStream {
    fn info(&self, path: &Path) -> Result<PdfInfo, ExtractionError> {
        let page_count = u32::try_from(self.read_pages(path)?.len())
            .map_err(|_| ExtractionError::Parse("page count out of range".to_string()))?;
        Ok(PdfInfo {
            page_count,
            title: None,
        })
    }
}

/// Make `pages` exactly `page_count` long.
///
/// Missing pages become empty strings; any surplus text is folded into the
/// last page so no characters are lost.
pub fn fit_page_count(mut pages: Vec<String>, page_count: u32) -> Vec<String> {
    let page_count = page_count as usize;
    if page_count == 0 {
        return Vec::new();
    }

    if pages.len() > page_count {
        let surplus = pages.split_off(page_count);
        if let Some(last) = pages.last_mut() {
            for extra in surplus {
                last.push('\n');
                last.push_str(&extra);
            }
        }
    }
    pages.resize(page_count, String::new());
    pages
}

/// Runs every configured native method and keeps the longest result.
pub struct NativeExtractor {
    methods: Vec<Box<dyn NativeMethod>>,
}

impl Default for NativeExtractor {
    fn default() -> Self {
        Self::new(vec![Box::new(PdfToTextLayout), Box::new(PdfExtractStream)])
    }
}

impl NativeExtractor {
    pub fn new(methods: Vec<Box<dyn NativeMethod>>) -> Self {
        Self { methods }
    }

    /// Classification trial: the first method that runs at all. A method
    /// that fails outright hands over to the next one.
    pub fn trial(&self, path: &Path, page_count: u32) -> Option<NativeExtraction> {
        for method in &self.methods {
            match method.extract_pages(path, page_count) {
                Ok(pages) => return Some(NativeExtraction::new(method.name(), pages)),
                Err(e) => {
                    tracing::warn!("{} trial failed on {}: {}", method.name(), path.display(), e)
                }
            }
        }
        None
    }

    /// Run the methods after the one that produced `trial` and select among
    /// them plus the trial's already-computed pages.
    pub fn extract_with_trial(
        &self,
        path: &Path,
        page_count: u32,
        trial: Option<NativeExtraction>,
    ) -> Option<NativeExtraction> {
        let skip = trial.as_ref().map_or(0, |t| {
            self.methods
                .iter()
                .position(|m| m.name() == t.method)
                .map_or(0, |i| i + 1)
        });
        let mut candidates: Vec<NativeExtraction> = trial.into_iter().collect();

        for method in self.methods.iter().skip(skip) {
            match method.extract_pages(path, page_count) {
                Ok(pages) => candidates.push(NativeExtraction::new(method.name(), pages)),
                Err(e) => tracing::warn!("{} failed on {}: {}", method.name(), path.display(), e),
            }
        }

        let chosen = select_longest(candidates)?;
        tracing::debug!(
            "{}: selected {} ({} chars)",
            path.display(),
            chosen.method,
            chosen.total_chars()
        );
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::test_pdf::text_pdf;

    fn extraction(method: &'static str, pages: &[&str]) -> NativeExtraction {
        NativeExtraction::new(method, pages.iter().map(|p| p.to_string()).collect())
    }

    struct Fixed(&'static str, Vec<&'static str>);

    impl NativeMethod for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn extract_pages(&self, _: &Path, _: u32) -> Result<Vec<String>, ExtractionError> {
            Ok(self.1.iter().map(|p| p.to_string()).collect())
        }
    }

    struct Missing;

    impl NativeMethod for Missing {
        fn name(&self) -> &'static str {
            "missing"
        }
        fn extract_pages(&self, _: &Path, _: u32) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::ToolNotFound("pdftotext".to_string()))
        }
    }

    struct Broken;

    impl NativeMethod for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn extract_pages(&self, _: &Path, _: u32) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::Parse("bad xref".to_string()))
        }
    }

    #[test]
    fn select_longest_prefers_more_characters() {
        let chosen = select_longest(vec![
            extraction("layout", &["ab", ""]),
            extraction("stream", &["abc", "d"]),
        ])
        .unwrap();
        assert_eq!(chosen.method, "stream");
    }

    #[test]
    fn select_longest_keeps_first_on_tie() {
        let chosen = select_longest(vec![
            extraction("layout", &["abcd"]),
            extraction("stream", &["ab", "cd"]),
        ])
        .unwrap();
        assert_eq!(chosen.method, "layout");
    }

    #[test]
    fn select_longest_counts_characters_not_bytes() {
        let chosen = select_longest(vec![
            extraction("layout", &["سلام"]),
            extraction("stream", &["hello"]),
        ])
        .unwrap();
        assert_eq!(chosen.method, "stream");
    }

    #[test]
    fn select_longest_of_nothing() {
        assert_eq!(select_longest(Vec::new()), None);
    }

    #[test]
    fn fit_page_count_pads_and_folds() {
        let pages = |v: &[&str]| v.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        assert_eq!(fit_page_count(pages(&["a"]), 3), vec!["a", "", ""]);
        assert_eq!(fit_page_count(pages(&["a", "b", "c"]), 2), vec!["a", "b\nc"]);
        assert!(fit_page_count(pages(&["a"]), 0).is_empty());
    }

    fn three_page_pdf() -> Vec<Vec<String>> {
        (1..=3)
            .map(|page| {
                let mut lines = vec!["RUNNING HEADER".to_string()];
                lines.extend((0..12).map(|i| {
                    format!("Page {page} marker line {i} carries body text for extraction.")
                }));
                lines
            })
            .collect()
    }

    #[test]
    fn stream_method_keeps_pages_apart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, text_pdf(&three_page_pdf())).unwrap();

        let pages = PdfExtractStream.extract_pages(&path, 3).unwrap();
        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            let marker = format!("Page {} marker line 0", i + 1);
            assert!(page.contains(&marker), "page {} lost its text: {:?}", i + 1, page);
            assert!(page.contains("RUNNING HEADER"));
            assert!(page.trim().chars().count() > 400);
        }
    }

    #[test]
    fn stream_method_reports_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, text_pdf(&three_page_pdf())).unwrap();

        let info = PdfExtractStream.info(&path).unwrap();
        assert_eq!(info.page_count, 3);
        assert!(PdfExtractStream.info(&dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn trial_falls_through_to_next_method() {
        let extractor = NativeExtractor::new(vec![
            Box::new(Missing),
            Box::new(Fixed("stream", vec!["abc"])),
        ]);
        let trial = extractor.trial(Path::new("doc.pdf"), 1).unwrap();
        assert_eq!(trial.method, "stream");
        assert!(NativeExtractor::new(vec![Box::new(Missing)])
            .trial(Path::new("doc.pdf"), 1)
            .is_none());
    }

    #[test]
    fn extractor_skips_methods_up_to_the_trial() {
        let extractor = NativeExtractor::new(vec![
            Box::new(Missing),
            Box::new(Fixed("stream", vec!["this should not run again"])),
            Box::new(Fixed("other", vec!["ab"])),
        ]);
        let trial = extraction("stream", &["a"]);
        let chosen = extractor
            .extract_with_trial(Path::new("doc.pdf"), 1, Some(trial))
            .unwrap();
        assert_eq!(chosen.method, "other");
        assert_eq!(chosen.pages, vec!["ab"]);
    }

    #[test]
    fn extractor_reuses_trial_and_skips_failed_methods() {
        let extractor = NativeExtractor::new(vec![
            Box::new(Fixed("layout", vec!["this should not run again"])),
            Box::new(Broken),
            Box::new(Fixed("stream", vec!["xy"])),
        ]);
        let trial = extraction("layout", &["abc"]);
        let chosen = extractor
            .extract_with_trial(Path::new("doc.pdf"), 1, Some(trial))
            .unwrap();
        assert_eq!(chosen.method, "layout");
        assert_eq!(chosen.pages, vec!["abc"]);
    }

    #[test]
    fn extractor_without_trial_runs_every_method() {
        let extractor = NativeExtractor::new(vec![
            Box::new(Fixed("layout", vec!["a"])),
            Box::new(Fixed("stream", vec!["abc"])),
        ]);
        let chosen = extractor
            .extract_with_trial(Path::new("doc.pdf"), 1, None)
            .unwrap();
        assert_eq!(chosen.method, "stream");
    }
}
