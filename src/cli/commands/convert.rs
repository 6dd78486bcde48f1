//! Batch conversion command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use indicatif::ProgressBar;
use tokio::sync::mpsc;

use crate::cli::helpers::{batch_progress, display_name, print_above, truncate};
use crate::config::Settings;
use crate::ocr::check_tools;
use crate::services::{BatchEvent, ConvertService};

#[derive(Args)]
pub struct ConvertArgs {
    /// Directory scanned recursively for PDF files
    input_dir: PathBuf,
    /// Directory for emitted JSON records
    #[arg(short, long, env = "PARSDOC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// Number of documents processed concurrently (default: CPU cores)
    #[arg(short, long, env = "PARSDOC_WORKERS")]
    workers: Option<usize>,
    /// Failure log path (default: <output_dir>/failed_files.log)
    #[arg(long)]
    failed_log: Option<PathBuf>,
    /// Report log path (default: <output_dir>/conversion_report.log)
    #[arg(long)]
    report: Option<PathBuf>,
    /// Tesseract language model
    #[arg(long, env = "PARSDOC_OCR_LANG")]
    ocr_lang: Option<String>,
    /// Rasterization resolution for OCR
    #[arg(long)]
    dpi: Option<u32>,
    /// Per-document OCR deadline in seconds
    #[arg(long)]
    ocr_timeout: Option<u64>,
}

impl ConvertArgs {
    /// Flags take precedence over the config file.
    fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(ref path) = self.failed_log {
            settings.failed_log = Some(path.clone());
        }
        if let Some(ref path) = self.report {
            settings.report_log = Some(path.clone());
        }
        if let Some(ref lang) = self.ocr_lang {
            settings.ocr.language = lang.clone();
        }
        if let Some(dpi) = self.dpi {
            settings.ocr.dpi = dpi;
        }
        if let Some(secs) = self.ocr_timeout {
            settings.ocr.timeout_secs = Some(secs);
        }
    }
}

/// Convert every PDF under the input directory.
pub async fn cmd_convert(mut settings: Settings, args: ConvertArgs) -> anyhow::Result<()> {
    args.apply_to_settings(&mut settings);
    settings.validate()?;

    let missing: Vec<_> = check_tools()
        .into_iter()
        .filter(|(_, found)| !found)
        .map(|(tool, _)| tool)
        .collect();
    if !missing.is_empty() {
        println!(
            "{} Missing tools ({}); affected documents will fail. Run 'parsdoc check-tools' for details.",
            style("!").yellow(),
            missing.join(", ")
        );
    }

    let service = ConvertService::from_settings(&settings);
    let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(100);

    let pb = Arc::new(tokio::sync::Mutex::new(None::<ProgressBar>));
    let pb_clone = pb.clone();

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                BatchEvent::Started { total_documents } => {
                    println!(
                        "{} Converting {} PDF files",
                        style("→").cyan(),
                        total_documents
                    );
                    *pb_clone.lock().await =
                        Some(batch_progress(total_documents as u64, "Extracting text..."));
                }
                BatchEvent::DocumentStarted { path } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.set_message(truncate(&display_name(&path), 60));
                    }
                }
                BatchEvent::DocumentWritten {
                    path,
                    integrity_score,
                    flag,
                    ..
                } => {
                    let guard = pb_clone.lock().await;
                    if let Some(flag) = flag {
                        print_above(
                            guard.as_ref(),
                            format!(
                                "  {} {} scored {:.2} ({})",
                                style("!").yellow(),
                                display_name(&path),
                                integrity_score,
                                flag
                            ),
                        );
                    }
                    if let Some(ref progress) = *guard {
                        progress.inc(1);
                    }
                }
                BatchEvent::DocumentFailed { path, reason } => {
                    let guard = pb_clone.lock().await;
                    print_above(
                        guard.as_ref(),
                        format!(
                            "  {} {} failed: {}",
                            style("✗").red(),
                            display_name(&path),
                            reason
                        ),
                    );
                    if let Some(ref progress) = *guard {
                        progress.inc(1);
                    }
                }
                BatchEvent::Complete { tally } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.finish_and_clear();
                    }
                    *pb_clone.lock().await = None;
                    println!(
                        "{} Conversion complete: {}/{} written ({:.2}%), {} native, {} OCR",
                        style("✓").green(),
                        tally.success,
                        tally.total,
                        tally.success_rate(),
                        tally.native,
                        tally.ocr
                    );
                    if tally.flagged > 0 {
                        println!(
                            "  {} {} documents below the integrity floor",
                            style("!").yellow(),
                            tally.flagged
                        );
                    }
                    if tally.failed > 0 {
                        println!("  {} {} documents failed", style("✗").red(), tally.failed);
                    }
                }
            }
        }
    });

    let result = service.process(&args.input_dir, event_tx).await;

    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }
    if let Some(progress) = pb.lock().await.take() {
        progress.abandon();
    }

    result?;
    println!("  Output: {}", settings.output_dir.display());
    println!("  Failures: {}", settings.failed_log_path().display());
    println!("  Report: {}", settings.report_log_path().display());
    Ok(())
}
