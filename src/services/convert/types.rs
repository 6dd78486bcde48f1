//! Conversion service types and events.

use std::path::PathBuf;

use crate::models::{FailureReason, FailureRecord, TextType};

/// Events emitted during a batch conversion.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Input discovery finished.
    Started { total_documents: usize },
    /// A worker picked up a document.
    DocumentStarted { path: PathBuf },
    /// Output written, possibly flagged.
    DocumentWritten {
        path: PathBuf,
        output: PathBuf,
        integrity_score: f64,
        /// Flag reason code, such as `low_integrity`.
        flag: Option<String>,
    },
    /// Document failed and produced no output.
    DocumentFailed { path: PathBuf, reason: String },
    /// Batch finished.
    Complete { tally: BatchTally },
}

/// Terminal state of one document.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Written {
        output: PathBuf,
        integrity_score: f64,
        /// Why the written record is untrusted: a schema violation or a
        /// score below the integrity floor.
        flag: Option<FailureReason>,
    },
    Failed {
        reason: FailureReason,
        /// Human-readable cause for the report log.
        detail: Option<String>,
    },
}

/// What a worker hands back to the orchestrator for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    /// Routing decision, when classification was reached.
    pub text_type: Option<TextType>,
    pub page_count: u32,
    pub status: OutcomeStatus,
}

impl DocumentOutcome {
    pub fn failed(path: PathBuf, reason: FailureReason, detail: Option<String>) -> Self {
        Self {
            path,
            text_type: None,
            page_count: 0,
            status: OutcomeStatus::Failed { reason, detail },
        }
    }

    /// Failure-log entry, if this outcome produces one.
    pub fn failure_record(&self) -> Option<FailureRecord> {
        match &self.status {
            OutcomeStatus::Written {
                integrity_score,
                flag: Some(FailureReason::LowIntegrity),
                ..
            } => Some(FailureRecord::low_integrity(self.path.clone(), *integrity_score)),
            OutcomeStatus::Written { flag, .. } => flag
                .clone()
                .map(|reason| FailureRecord::new(self.path.clone(), reason)),
            OutcomeStatus::Failed { reason, .. } => {
                Some(FailureRecord::new(self.path.clone(), reason.clone()))
            }
        }
    }

    /// One line of the report log.
    pub fn report_line(&self) -> String {
        let routed = self
            .text_type
            .map(|t| t.as_str())
            .unwrap_or("unclassified");
        match &self.status {
            OutcomeStatus::Written {
                output,
                integrity_score,
                flag,
            } => {
                let mut line = format!(
                    "{}\t{}\t{}\tpages={}\tscore={}\t{}",
                    if flag.is_some() { "FLAGGED" } else { "OK" },
                    self.path.display(),
                    routed,
                    self.page_count,
                    integrity_score,
                    output.display()
                );
                if let Some(reason) = flag {
                    line.push('\t');
                    line.push_str(&reason.code());
                }
                line
            }
            OutcomeStatus::Failed { reason, detail } => {
                let mut line = format!("FAILED\t{}\t{}\t{}", self.path.display(), routed, reason);
                if let Some(detail) = detail {
                    line.push('\t');
                    line.push_str(detail);
                }
                line
            }
        }
    }
}

/// Aggregate batch counters, folded one outcome at a time by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub total: usize,
    /// Documents whose output was written, flagged or not.
    pub success: usize,
    pub failed: usize,
    /// Written but flagged, for a low score or a schema violation.
    pub flagged: usize,
    /// Routed to native text extraction.
    pub native: usize,
    /// Routed to OCR.
    pub ocr: usize,
}

impl BatchTally {
    /// Fold one outcome into the counters.
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        self.total += 1;
        match outcome.text_type {
            Some(TextType::Text) => self.native += 1,
            Some(TextType::Image) => self.ocr += 1,
            None => {}
        }
        match outcome.status {
            OutcomeStatus::Written { ref flag, .. } => {
                self.success += 1;
                if flag.is_some() {
                    self.flagged += 1;
                }
            }
            OutcomeStatus::Failed { .. } => self.failed += 1,
        }
    }

    /// Written documents as a percentage of all documents.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 * 100.0 / self.total as f64
        }
    }

    /// The report's closing summary line.
    pub fn summary_line(&self) -> String {
        format!(
            "SUMMARY\ttotal={}\tsuccess={}\tfailed={}\tflagged={}\tnative={}\tocr={}\tsuccess_rate={:.2}%",
            self.total,
            self.success,
            self.failed,
            self.flagged,
            self.native,
            self.ocr,
            self.success_rate()
        )
    }
}
