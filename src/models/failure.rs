//! Per-document failure records and their stable reason codes.

use std::path::PathBuf;

/// Why a document did not produce a trusted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Neither extraction branch produced any usable text.
    ExtractionFailed,
    /// Usable text exists but is shorter than the configured minimum.
    InsufficientText,
    /// The record broke the named schema rule. Still written, but flagged.
    Schema(&'static str),
    /// Record written but scored below the integrity floor.
    LowIntegrity,
    /// OCR exceeded the per-document deadline.
    OcrTimeout,
    /// The output file could not be written.
    WriteFailed,
    /// The worker processing this document panicked.
    WorkerPanicked,
}

impl FailureReason {
    /// Machine-readable reason code as written to the failure log.
    pub fn code(&self) -> String {
        match self {
            Self::ExtractionFailed => "extraction_failed".to_string(),
            Self::InsufficientText => "insufficient_text".to_string(),
            Self::Schema(field) => format!("schema:{}", field),
            Self::LowIntegrity => "low_integrity".to_string(),
            Self::OcrTimeout => "ocr_timeout".to_string(),
            Self::WriteFailed => "write_failed".to_string(),
            Self::WorkerPanicked => "worker_panicked".to_string(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

/// One line of the failure log.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub reason: FailureReason,
    /// Present for `low_integrity` entries.
    pub integrity_score: Option<f64>,
}

impl FailureRecord {
    pub fn new(path: PathBuf, reason: FailureReason) -> Self {
        Self {
            path,
            reason,
            integrity_score: None,
        }
    }

    pub fn low_integrity(path: PathBuf, score: f64) -> Self {
        Self {
            path,
            reason: FailureReason::LowIntegrity,
            integrity_score: Some(score),
        }
    }

    /// `path<TAB>reason[<TAB>score]`, without a trailing newline.
    pub fn to_log_line(&self) -> String {
        match self.integrity_score {
            Some(score) => format!("{}\t{}\t{}", self.path.display(), self.reason, score),
            None => format!("{}\t{}", self.path.display(), self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(FailureReason::ExtractionFailed.code(), "extraction_failed");
        assert_eq!(FailureReason::Schema("language").code(), "schema:language");
        assert_eq!(FailureReason::OcrTimeout.to_string(), "ocr_timeout");
    }

    #[test]
    fn log_line_includes_score_only_for_low_integrity() {
        let failed = FailureRecord::new(PathBuf::from("in/a.pdf"), FailureReason::InsufficientText);
        assert_eq!(failed.to_log_line(), "in/a.pdf\tinsufficient_text");

        let flagged = FailureRecord::low_integrity(PathBuf::from("in/b.pdf"), 0.6125);
        assert_eq!(flagged.to_log_line(), "in/b.pdf\tlow_integrity\t0.6125");
    }
}
