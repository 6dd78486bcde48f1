//! Per-document pipeline.
//!
//! Each document moves through
//! `Discovered -> Classified -> Extracted -> Normalized -> Segmented -> Scored -> Validated`
//! and ends `Written` or `Failed`. Nothing here touches another document's
//! state, so a [`Pipeline`] can be shared by every worker.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::config::{Policy, Settings};
use crate::models::{validate, FailureReason, OutputRecord, TextType};
use crate::ocr::{
    extract_ocr, FallbackInfo, NativeExtraction, NativeExtractor, OcrEngine, OcrError,
    PdfInfoSource, TesseractBackend,
};
use crate::services::classify::{classify, total_trimmed_chars};
use crate::services::scoring::{empty_page_ratio, score, ScoreInputs};
use crate::text::{choose_title, normalize, segment, strip_headers_footers, PARAGRAPH_BREAK};
use crate::utils::output_filename;

use super::types::{DocumentOutcome, OutcomeStatus};

/// Pipeline stage a document reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Classified,
    Extracted,
    Normalized,
    Segmented,
    Scored,
    Validated,
    Written,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Classified => "classified",
            Self::Extracted => "extracted",
            Self::Normalized => "normalized",
            Self::Segmented => "segmented",
            Self::Scored => "scored",
            Self::Validated => "validated",
            Self::Written => "written",
        }
    }
}

/// Raw page text from whichever branch ran.
struct Extracted {
    pages: Vec<String>,
    page_count: u32,
    avg_confidence: Option<f64>,
}

/// Everything needed to turn one PDF into one record.
pub struct Pipeline {
    info: Box<dyn PdfInfoSource>,
    native: NativeExtractor,
    ocr: Box<dyn OcrEngine>,
    policy: Policy,
    ocr_timeout: Option<Duration>,
    output_dir: PathBuf,
}

impl Pipeline {
    /// Pipeline backed by Poppler, pdf-extract and Tesseract.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_backends(
            Box::new(FallbackInfo::default()),
            NativeExtractor::default(),
            Box::new(TesseractBackend::new(settings.ocr.clone())),
            settings.policy.clone(),
            settings.ocr.timeout_secs.map(Duration::from_secs),
            settings.output_dir.clone(),
        )
    }

    pub fn with_backends(
        info: Box<dyn PdfInfoSource>,
        native: NativeExtractor,
        ocr: Box<dyn OcrEngine>,
        policy: Policy,
        ocr_timeout: Option<Duration>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            info,
            native,
            ocr,
            policy,
            ocr_timeout,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run one document to completion. Never panics on bad input and never
    /// returns an error: every problem becomes a `Failed` outcome.
    pub fn process(&self, path: &Path) -> DocumentOutcome {
        let mut tracker = Tracker::new(path);
        tracker.advance(Stage::Discovered);

        let (page_hint, metadata_title) = match self.info.info(path) {
            Ok(info) => (info.page_count, info.title),
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                (0, None)
            }
        };

        // Classification trial, reused as the first native candidate.
        let trial = if page_hint > 0 {
            self.native_trial(path, page_hint)
        } else {
            None
        };
        let classification = classify(trial.as_ref().map(|t| t.pages.as_slice()), &self.policy);
        tracker.text_type = Some(classification.text_type);
        tracing::debug!(
            "{}: classified {} (confidence {:.2}, {:.0} chars/page)",
            path.display(),
            classification.text_type,
            classification.confidence,
            classification.avg_chars_per_page
        );
        tracker.advance(Stage::Classified);

        let extracted = match classification.text_type {
            TextType::Text => match self.native.extract_with_trial(path, page_hint, trial) {
                Some(chosen) => Extracted {
                    pages: chosen.pages,
                    page_count: page_hint,
                    avg_confidence: None,
                },
                None => {
                    return tracker.fail(
                        FailureReason::ExtractionFailed,
                        Some("no native method succeeded".to_string()),
                    )
                }
            },
            TextType::Image => match extract_ocr(self.ocr.as_ref(), path, self.ocr_timeout) {
                Ok(ocr) => Extracted {
                    pages: ocr.pages,
                    page_count: ocr.page_count,
                    avg_confidence: ocr.avg_confidence,
                },
                Err(e @ OcrError::Timeout(_)) => {
                    return tracker.fail(FailureReason::OcrTimeout, Some(e.to_string()))
                }
                Err(e) => {
                    return tracker.fail(FailureReason::ExtractionFailed, Some(e.to_string()))
                }
            },
        };
        tracker.page_count = extracted.page_count;

        let total_chars = total_trimmed_chars(&extracted.pages);
        if total_chars == 0 {
            return tracker.fail(
                FailureReason::ExtractionFailed,
                Some("no text recovered".to_string()),
            );
        }
        tracker.advance(Stage::Extracted);

        let stripped = strip_headers_footers(&extracted.pages);
        let normalized = normalize(&stripped.join(PARAGRAPH_BREAK));
        let usable_chars = normalized.chars().count();
        if usable_chars < self.policy.min_text_chars {
            let detail = format!(
                "{} usable characters, need {}",
                usable_chars, self.policy.min_text_chars
            );
            return tracker.fail(FailureReason::InsufficientText, Some(detail));
        }
        tracker.advance(Stage::Normalized);

        let paragraphs = segment(&normalized, self.policy.max_paragraph_len);
        if paragraphs.is_empty() {
            return tracker.fail(FailureReason::InsufficientText, Some("no paragraphs".to_string()));
        }
        tracker.advance(Stage::Segmented);

        let integrity_score = score(
            &ScoreInputs {
                text_type: classification.text_type,
                page_count: extracted.page_count,
                total_chars,
                avg_ocr_confidence: extracted.avg_confidence,
                empty_page_ratio: empty_page_ratio(&extracted.pages),
            },
            &self.policy,
        );
        tracker.advance(Stage::Scored);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let record = OutputRecord::new(
            choose_title(metadata_title.as_deref(), &stripped, &stem),
            paragraphs,
            path.display().to_string(),
            extracted.page_count,
            classification.text_type,
            integrity_score,
        );

        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => return tracker.fail(FailureReason::WriteFailed, Some(e.to_string())),
        };
        let flag = self.review(path, &value, integrity_score);
        tracker.advance(Stage::Validated);

        let output = self.output_dir.join(output_filename(path));
        if let Err(e) = write_record(&record, &output) {
            return tracker.fail(FailureReason::WriteFailed, Some(e.to_string()));
        }
        tracker.advance(Stage::Written);

        tracker.finish(OutcomeStatus::Written {
            output,
            integrity_score,
            flag,
        })
    }

    /// Reason to flag a record that is still written. A schema violation
    /// takes precedence over a low score.
    fn review(&self, path: &Path, value: &Value, integrity_score: f64) -> Option<FailureReason> {
        if let Err(violation) = validate(value) {
            tracing::warn!("{}: schema violation, {}", path.display(), violation);
            return Some(FailureReason::Schema(violation.field));
        }
        if integrity_score < self.policy.min_integrity {
            tracing::warn!(
                "{}: low integrity score {} (minimum {})",
                path.display(),
                integrity_score,
                self.policy.min_integrity
            );
            return Some(FailureReason::LowIntegrity);
        }
        None
    }

    fn native_trial(&self, path: &Path, page_count: u32) -> Option<NativeExtraction> {
        let trial = self.native.trial(path, page_count)?;
        tracing::debug!("{}: trial by {}", path.display(), trial.method);
        Some(trial)
    }
}

fn write_record(record: &OutputRecord, output: &Path) -> anyhow::Result<()> {
    let json = record.to_pretty_json()?;
    std::fs::write(output, json)?;
    Ok(())
}

/// Accumulates what is known about a document as it moves through stages.
struct Tracker<'a> {
    path: &'a Path,
    stage: Stage,
    text_type: Option<TextType>,
    page_count: u32,
}

impl<'a> Tracker<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            stage: Stage::Discovered,
            text_type: None,
            page_count: 0,
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        tracing::debug!("{}: {}", self.path.display(), stage.as_str());
    }

    fn fail(self, reason: FailureReason, detail: Option<String>) -> DocumentOutcome {
        tracing::warn!(
            "{} failed after {}: {}{}",
            self.path.display(),
            self.stage.as_str(),
            reason,
            detail
                .as_deref()
                .map(|d| format!(" ({})", d))
                .unwrap_or_default()
        );
        self.finish(OutcomeStatus::Failed { reason, detail })
    }

    fn finish(self, status: OutcomeStatus) -> DocumentOutcome {
        DocumentOutcome {
            path: self.path.to_path_buf(),
            text_type: self.text_type,
            page_count: self.page_count,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::test_pdf::text_pdf;
    use crate::ocr::{ExtractionError, NativeMethod, PageRecognition, PdfExtractStream, PdfInfo};

    struct Info(Result<PdfInfo, ()>);

    impl PdfInfoSource for Info {
        fn info(&self, _: &Path) -> Result<PdfInfo, ExtractionError> {
            self.0
                .clone()
                .map_err(|_| ExtractionError::Parse("not a pdf".to_string()))
        }
    }

    struct Pages(Vec<String>);

    impl NativeMethod for Pages {
        fn name(&self) -> &'static str {
            "fake"
        }
        fn extract_pages(&self, _: &Path, _: u32) -> Result<Vec<String>, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    struct Ocr(Vec<PageRecognition>);

    impl OcrEngine for Ocr {
        fn name(&self) -> &str {
            "fake-ocr"
        }
        fn page_count(&self, _: &Path) -> Result<u32, OcrError> {
            Ok(self.0.len() as u32)
        }
        fn recognize_page(&self, _: &Path, page: u32) -> Result<PageRecognition, OcrError> {
            Ok(self.0[page as usize - 1].clone())
        }
    }

    fn pipeline(info: Result<PdfInfo, ()>, native: Vec<String>, ocr: Vec<PageRecognition>, out: &Path) -> Pipeline {
        Pipeline::with_backends(
            Box::new(Info(info)),
            NativeExtractor::new(vec![Box::new(Pages(native))]),
            Box::new(Ocr(ocr)),
            Policy::default(),
            None,
            out.to_path_buf(),
        )
    }

    fn info(pages: u32) -> Result<PdfInfo, ()> {
        Ok(PdfInfo {
            page_count: pages,
            title: None,
        })
    }

    /// Roughly `n` characters of distinct multi-line Persian text.
    fn persian_page(seed: usize, n: usize) -> String {
        let mut lines = Vec::new();
        let mut len = 0;
        let mut i = 0;
        while len < n {
            let line = format!("صفحه {seed} سطر {i}: این یک جمله آزمایشی است.");
            len += line.chars().count() + 1;
            lines.push(line);
            i += 1;
        }
        lines.join("\n")
    }

    #[test]
    fn text_document_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![persian_page(1, 500), persian_page(2, 500)];
        let outcome = pipeline(info(2), pages, vec![], dir.path()).process(Path::new("in/law.pdf"));

        assert_eq!(outcome.text_type, Some(TextType::Text));
        assert_eq!(outcome.page_count, 2);
        let OutcomeStatus::Written { output, flag, .. } = outcome.status else {
            panic!("expected written, got {:?}", outcome.status);
        };
        assert_eq!(flag, None);
        assert!(output.exists());
        assert!(output.file_name().unwrap().to_string_lossy().starts_with("law_"));
    }

    #[test]
    fn unreadable_document_goes_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = vec![PageRecognition {
            text: persian_page(1, 300),
            confidence: Some(0.9),
        }];
        let outcome = pipeline(Err(()), vec![], ocr, dir.path()).process(Path::new("scan.pdf"));
        assert_eq!(outcome.text_type, Some(TextType::Image));
        assert!(matches!(outcome.status, OutcomeStatus::Written { .. }));
    }

    #[test]
    fn short_text_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = vec![PageRecognition {
            text: "فقط چند کلمه".to_string(),
            confidence: Some(0.9),
        }];
        let outcome = pipeline(info(1), vec![String::new()], ocr, dir.path()).process(Path::new("s.pdf"));
        assert!(matches!(
            outcome.status,
            OutcomeStatus::Failed {
                reason: FailureReason::InsufficientText,
                ..
            }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn sparse_text_layer_is_flagged_not_dropped() {
        let dir = tempfile::tempdir().unwrap();
        // 100 chars/page is above the text threshold but far below the
        // expected density, so the score lands under 0.85.
        let pages: Vec<String> = (1..=4).map(|seed| persian_page(seed, 100)).collect();
        let outcome = pipeline(info(4), pages, vec![], dir.path()).process(Path::new("thin.pdf"));
        let OutcomeStatus::Written { flag, integrity_score, .. } = outcome.status else {
            panic!("expected written");
        };
        assert_eq!(flag, Some(FailureReason::LowIntegrity));
        assert!(integrity_score < 0.85);
    }

    #[test]
    fn schema_violation_is_flagged_and_still_written() {
        let dir = tempfile::tempdir().unwrap();
        // A NaN weight makes the score NaN, which serializes as null and so
        // breaks the numeric integrity_score rule.
        let policy = Policy {
            text_base_weight: f64::NAN,
            ..Policy::default()
        };
        let pipeline = Pipeline::with_backends(
            Box::new(Info(info(2))),
            NativeExtractor::new(vec![Box::new(Pages(vec![
                persian_page(1, 500),
                persian_page(2, 500),
            ]))]),
            Box::new(Ocr(vec![])),
            policy,
            None,
            dir.path().to_path_buf(),
        );
        let outcome = pipeline.process(Path::new("in/nan.pdf"));

        let OutcomeStatus::Written { ref output, ref flag, .. } = outcome.status else {
            panic!("expected written, got {:?}", outcome.status);
        };
        assert_eq!(flag, &Some(FailureReason::Schema("integrity_score")));
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert!(written["metadata"]["integrity_score"].is_null());
        assert_eq!(
            outcome.failure_record().unwrap().to_log_line(),
            "in/nan.pdf\tschema:integrity_score"
        );
    }

    #[test]
    fn schema_violation_outranks_low_score() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(info(1), vec![], vec![], dir.path());
        let record = OutputRecord::new(
            "t".to_string(),
            vec!["متن".to_string()],
            "a.pdf".to_string(),
            1,
            TextType::Text,
            0.1,
        );
        let mut value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            pipeline.review(Path::new("a.pdf"), &value, 0.1),
            Some(FailureReason::LowIntegrity)
        );

        value["metadata"]["language"] = Value::from("ar");
        assert_eq!(
            pipeline.review(Path::new("a.pdf"), &value, 0.1),
            Some(FailureReason::Schema("language"))
        );
        assert_eq!(
            pipeline.review(Path::new("a.pdf"), &value, 0.95),
            Some(FailureReason::Schema("language"))
        );
    }

    struct Unavailable;

    impl NativeMethod for Unavailable {
        fn name(&self) -> &'static str {
            "pdftotext-layout"
        }
        fn extract_pages(&self, _: &Path, _: u32) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::ToolNotFound("pdftotext".to_string()))
        }
    }

    #[test]
    fn text_pdf_converts_without_poppler() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        let pages: Vec<Vec<String>> = (1..=3)
            .map(|page| {
                let mut lines = vec!["RUNNING HEADER".to_string()];
                lines.extend((0..12).map(|i| {
                    format!("Page {page} marker line {i} carries body text for extraction.")
                }));
                lines
            })
            .collect();
        std::fs::write(&input, text_pdf(&pages)).unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        let pipeline = Pipeline::with_backends(
            Box::new(FallbackInfo::new(vec![
                Box::new(Info(Err(()))),
                Box::new(PdfExtractStream),
            ])),
            NativeExtractor::new(vec![Box::new(Unavailable), Box::new(PdfExtractStream)]),
            Box::new(Ocr(vec![])),
            Policy::default(),
            None,
            out,
        );
        let outcome = pipeline.process(&input);

        assert_eq!(outcome.text_type, Some(TextType::Text));
        assert_eq!(outcome.page_count, 3);
        let OutcomeStatus::Written { output, flag, .. } = outcome.status else {
            panic!("expected written, got {:?}", outcome.status);
        };
        assert_eq!(flag, None);
        let json = std::fs::read_to_string(output).unwrap();
        assert!(!json.contains("RUNNING HEADER"));
        for page in 1..=3 {
            assert!(json.contains(&format!("Page {page} marker line 0")));
        }
    }

    #[test]
    fn stage_names_are_stable() {
        assert_eq!(Stage::Discovered.as_str(), "discovered");
        assert_eq!(Stage::Written.as_str(), "written");
    }
}
