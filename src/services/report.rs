//! Failure log and report log writers.
//!
//! Both files are owned by the batch orchestrator and written from a single
//! task, one outcome at a time. They are truncated when a batch starts so a
//! rerun reproduces them exactly.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::services::convert::{BatchTally, DocumentOutcome};

/// Open handles on a batch's failure and report logs.
pub struct BatchLogs {
    failed: BufWriter<File>,
    report: BufWriter<File>,
}

fn create_truncated(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

impl BatchLogs {
    /// Create (or truncate) both logs.
    pub fn create(failed_path: &Path, report_path: &Path) -> io::Result<Self> {
        Ok(Self {
            failed: create_truncated(failed_path)?,
            report: create_truncated(report_path)?,
        })
    }

    /// Append one document's lines.
    pub fn append(&mut self, outcome: &DocumentOutcome) -> io::Result<()> {
        writeln!(self.report, "{}", outcome.report_line())?;
        if let Some(record) = outcome.failure_record() {
            writeln!(self.failed, "{}", record.to_log_line())?;
        }
        Ok(())
    }

    /// Write the summary line and flush both files.
    pub fn finish(mut self, tally: &BatchTally) -> io::Result<()> {
        writeln!(self.report, "{}", tally.summary_line())?;
        self.report.flush()?;
        self.failed.flush()
    }
}
