//! Batch conversion service.
//!
//! Discovers PDFs, fans documents out to blocking workers and folds their
//! outcomes into a tally and the batch logs. Separated from UI concerns:
//! progress is published as [`BatchEvent`]s.

mod processing;
mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::FailureReason;
use crate::services::report::BatchLogs;
use crate::utils::discover_pdfs;

pub use processing::{Pipeline, Stage};
pub use types::{BatchEvent, BatchTally, DocumentOutcome, OutcomeStatus};

/// Process-level failures. Anything that concerns a single document is a
/// [`DocumentOutcome`] instead.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),

    #[error("No PDF files found under {0}")]
    NoInputs(PathBuf),

    #[error("Output directory {path} is unusable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write batch logs: {0}")]
    Logs(#[from] std::io::Error),
}

/// Service for batch PDF conversion.
pub struct ConvertService {
    pipeline: Arc<Pipeline>,
    workers: usize,
    failed_log: PathBuf,
    report_log: PathBuf,
}

impl ConvertService {
    /// Service using the real extraction and OCR tools.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Pipeline::from_settings(settings),
            settings.workers,
            settings.failed_log_path(),
            settings.report_log_path(),
        )
    }

    pub fn new(pipeline: Pipeline, workers: usize, failed_log: PathBuf, report_log: PathBuf) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: workers.max(1),
            failed_log,
            report_log,
        }
    }

    /// Convert every PDF under `input_dir`.
    ///
    /// Documents run on blocking workers, at most `workers` at a time.
    /// Outcomes are consumed in discovery order so the logs are reproducible.
    pub async fn process(
        &self,
        input_dir: &Path,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> Result<BatchTally, BatchError> {
        if !input_dir.is_dir() {
            return Err(BatchError::InputNotFound(input_dir.to_path_buf()));
        }
        let inputs = discover_pdfs(input_dir);
        if inputs.is_empty() {
            return Err(BatchError::NoInputs(input_dir.to_path_buf()));
        }

        let output_dir = self.pipeline.output_dir();
        std::fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut logs = BatchLogs::create(&self.failed_log, &self.report_log)?;

        tracing::info!(
            "Converting {} PDFs from {} with {} workers",
            inputs.len(),
            input_dir.display(),
            self.workers
        );
        let _ = event_tx
            .send(BatchEvent::Started {
                total_documents: inputs.len(),
            })
            .await;

        let mut outcomes = stream::iter(inputs)
            .map(|path| {
                let pipeline = self.pipeline.clone();
                let event_tx = event_tx.clone();
                async move { run_worker(pipeline, path, event_tx).await }
            })
            .buffered(self.workers);

        let mut tally = BatchTally::default();
        while let Some(outcome) = outcomes.next().await {
            tally.record(&outcome);
            logs.append(&outcome)?;

            let event = match &outcome.status {
                OutcomeStatus::Written {
                    output,
                    integrity_score,
                    flag,
                } => BatchEvent::DocumentWritten {
                    path: outcome.path.clone(),
                    output: output.clone(),
                    integrity_score: *integrity_score,
                    flag: flag.as_ref().map(FailureReason::code),
                },
                OutcomeStatus::Failed { reason, .. } => BatchEvent::DocumentFailed {
                    path: outcome.path.clone(),
                    reason: reason.to_string(),
                },
            };
            let _ = event_tx.send(event).await;
        }

        logs.finish(&tally)?;
        tracing::info!(
            "Batch complete: {} written ({} flagged), {} failed",
            tally.success,
            tally.flagged,
            tally.failed
        );
        let _ = event_tx
            .send(BatchEvent::Complete {
                tally: tally.clone(),
            })
            .await;

        Ok(tally)
    }
}

/// Run one document on the blocking pool. A panic inside the pipeline is
/// recorded as a failure for that document only.
async fn run_worker(
    pipeline: Arc<Pipeline>,
    path: PathBuf,
    event_tx: mpsc::Sender<BatchEvent>,
) -> DocumentOutcome {
    let worker_path = path.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let _ = futures::executor::block_on(event_tx.send(BatchEvent::DocumentStarted {
            path: worker_path.clone(),
        }));
        pipeline.process(&worker_path)
    });

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Worker for {} panicked: {}", path.display(), e);
            DocumentOutcome::failed(path, FailureReason::WorkerPanicked, Some(e.to_string()))
        }
    }
}
