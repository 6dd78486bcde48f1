//! Whole-document OCR on top of an [`OcrEngine`].

use std::path::Path;
use std::time::{Duration, Instant};

use super::backend::{OcrEngine, OcrError};

/// Pages recognized from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrExtraction {
    /// One entry per page; failed pages are empty strings.
    pub pages: Vec<String>,
    pub page_count: u32,
    /// Mean of the per-page confidences, over pages that reported one.
    pub avg_confidence: Option<f64>,
}

/// OCR every page of a document.
///
/// A page whose rasterization or recognition fails contributes an empty
/// string. The deadline, when set, is checked before each page and once more
/// after the last one; running past it abandons the document with
/// [`OcrError::Timeout`]. A single page's tool run is not interrupted, so the
/// overrun is bounded by the slowest page. A missing engine is reported
/// immediately rather than once per page.
pub fn extract_ocr(
    engine: &dyn OcrEngine,
    path: &Path,
    timeout: Option<Duration>,
) -> Result<OcrExtraction, OcrError> {
    let started = Instant::now();
    let page_count = engine.page_count(path)?;

    let mut pages = Vec::with_capacity(page_count as usize);
    let mut page_confidences = Vec::new();

    let check_deadline = || match timeout {
        Some(limit) if started.elapsed() > limit => Err(OcrError::Timeout(limit.as_secs())),
        _ => Ok(()),
    };

    for page in 1..=page_count {
        check_deadline()?;

        match engine.recognize_page(path, page) {
            Ok(recognition) => {
                if let Some(conf) = recognition.confidence {
                    page_confidences.push(conf);
                }
                pages.push(recognition.text);
            }
            Err(e @ OcrError::BackendNotAvailable(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "{} failed on page {} of {}: {}",
                    engine.name(),
                    page,
                    path.display(),
                    e
                );
                pages.push(String::new());
            }
        }
    }

    check_deadline()?;

    let avg_confidence = if page_confidences.is_empty() {
        None
    } else {
        Some(page_confidences.iter().sum::<f64>() / page_confidences.len() as f64)
    };

    Ok(OcrExtraction {
        pages,
        page_count,
        avg_confidence,
    })
}
