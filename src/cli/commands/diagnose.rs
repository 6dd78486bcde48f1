//! Routing diagnosis for a sample of input PDFs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use console::style;

use crate::cli::helpers::{display_name, truncate};
use crate::config::{Policy, Settings};
use crate::models::TextType;
use crate::ocr::{FallbackInfo, NativeExtractor, PdfInfoSource};
use crate::services::classify;
use crate::utils::{discover_pdfs, is_pdf};

/// Why a file will be routed the way it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Diagnosis {
    NotAPdf,
    Unreadable,
    ScannedOrEmpty,
    TextLayer,
}

impl Diagnosis {
    fn as_str(&self) -> &'static str {
        match self {
            Self::NotAPdf => "not_a_pdf",
            Self::Unreadable => "unreadable",
            Self::ScannedOrEmpty => "scanned_or_empty",
            Self::TextLayer => "text_layer",
        }
    }
}

#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    diagnosis: Diagnosis,
    page_count: u32,
    trial_chars: usize,
    pages_with_text: usize,
    detail: Option<String>,
}

fn diagnose_trial(path: PathBuf, page_count: u32, trial: &[String], policy: &Policy) -> FileReport {
    let classification = classify::classify(Some(trial), policy);
    let diagnosis = match classification.text_type {
        TextType::Text => Diagnosis::TextLayer,
        TextType::Image => Diagnosis::ScannedOrEmpty,
    };
    FileReport {
        path,
        diagnosis,
        page_count,
        trial_chars: classify::total_trimmed_chars(trial),
        pages_with_text: trial.iter().filter(|p| !p.trim().is_empty()).count(),
        detail: None,
    }
}

fn diagnose_file(
    path: &Path,
    info: &dyn PdfInfoSource,
    native: &NativeExtractor,
    policy: &Policy,
) -> FileReport {
    let failed = |diagnosis, detail: String| FileReport {
        path: path.to_path_buf(),
        diagnosis,
        page_count: 0,
        trial_chars: 0,
        pages_with_text: 0,
        detail: Some(detail),
    };

    if !is_pdf(path) {
        return failed(Diagnosis::NotAPdf, "no PDF signature".to_string());
    }
    let info = match info.info(path) {
        Ok(info) => info,
        Err(e) => return failed(Diagnosis::Unreadable, e.to_string()),
    };
    match native.trial(path, info.page_count) {
        Some(trial) => {
            let mut report =
                diagnose_trial(path.to_path_buf(), info.page_count, &trial.pages, policy);
            report.detail = Some(format!("trial by {}", trial.method));
            report
        }
        None => {
            let mut report = failed(
                Diagnosis::ScannedOrEmpty,
                "no native method could read the file".to_string(),
            );
            report.page_count = info.page_count;
            report
        }
    }
}

/// Inspect up to `sample` PDFs (0 = all) and group them by diagnosis.
pub async fn cmd_diagnose(settings: &Settings, input_dir: &Path, sample: usize) -> anyhow::Result<()> {
    let mut files = discover_pdfs(input_dir);
    if files.is_empty() {
        anyhow::bail!("No PDF files found under {}", input_dir.display());
    }
    let total = files.len();
    if sample > 0 {
        files.truncate(sample);
    }
    println!(
        "{} Diagnosing {} of {} PDF files in {}",
        style("→").cyan(),
        files.len(),
        total,
        input_dir.display()
    );

    let policy = settings.policy.clone();
    let reports = tokio::task::spawn_blocking(move || {
        let info = FallbackInfo::default();
        let native = NativeExtractor::default();
        files
            .iter()
            .map(|path| diagnose_file(path, &info, &native, &policy))
            .collect::<Vec<_>>()
    })
    .await?;

    println!();
    for report in &reports {
        println!(
            "  {:<40} {:<17} pages={:<4} chars={:<7} text_pages={}",
            truncate(&display_name(&report.path), 40),
            report.diagnosis.as_str(),
            report.page_count,
            report.trial_chars,
            report.pages_with_text
        );
        if let Some(ref detail) = report.detail {
            println!("  {:<40} {}", "", style(truncate(detail, 80)).dim());
        }
    }

    let mut groups: BTreeMap<Diagnosis, usize> = BTreeMap::new();
    for report in &reports {
        *groups.entry(report.diagnosis).or_default() += 1;
    }

    println!("\n{}", style("Summary").bold());
    println!("{}", "-".repeat(50));
    for (diagnosis, count) in &groups {
        let label = match diagnosis {
            Diagnosis::TextLayer => style(diagnosis.as_str()).green(),
            Diagnosis::ScannedOrEmpty => style(diagnosis.as_str()).yellow(),
            _ => style(diagnosis.as_str()).red(),
        };
        println!("  {:<20} {}", label, count);
    }

    Ok(())
}
