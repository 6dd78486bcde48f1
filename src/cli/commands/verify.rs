//! Integrity check over emitted JSON records.

use std::path::{Path, PathBuf};

use console::style;
use serde_json::Value;

use crate::cli::helpers::display_name;
use crate::config::{Policy, Settings};
use crate::models::validate;
use crate::text::is_unnormalized;

/// A problem found in one record. Everything except `LowIntegrity` makes
/// the file invalid.
#[derive(Debug, Clone, PartialEq)]
enum Issue {
    Unparseable(String),
    Schema(String),
    EmptyParagraph(usize),
    Unnormalized { paragraph: usize, ch: char },
    LowIntegrity(f64),
}

impl Issue {
    fn is_invalid(&self) -> bool {
        !matches!(self, Self::LowIntegrity(_))
    }

    fn describe(&self) -> String {
        match self {
            Self::Unparseable(e) => format!("not valid JSON: {}", e),
            Self::Schema(e) => format!("schema: {}", e),
            Self::EmptyParagraph(i) => format!("paragraph {} is empty", i),
            Self::Unnormalized { paragraph, ch } => format!(
                "paragraph {} contains unnormalized U+{:04X}",
                paragraph, *ch as u32
            ),
            Self::LowIntegrity(score) => format!("integrity score {} below floor", score),
        }
    }
}

fn check_record(raw: &str, policy: &Policy) -> Vec<Issue> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return vec![Issue::Unparseable(e.to_string())],
    };
    if let Err(e) = validate(&value) {
        return vec![Issue::Schema(e.to_string())];
    }

    let mut issues = Vec::new();
    let paragraphs = value["paragraphs"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    for (i, paragraph) in paragraphs.iter().enumerate() {
        let text = paragraph.as_str().unwrap_or_default();
        if text.trim().is_empty() {
            issues.push(Issue::EmptyParagraph(i));
        } else if let Some(ch) = text.chars().find(|c| is_unnormalized(*c)) {
            issues.push(Issue::Unnormalized { paragraph: i, ch });
        }
    }

    if let Some(score) = value["metadata"]["integrity_score"].as_f64() {
        if score < policy.min_integrity {
            issues.push(Issue::LowIntegrity(score));
        }
    }
    issues
}

fn json_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Re-read every JSON record in `output_dir` and report integrity problems.
pub async fn cmd_verify(settings: &Settings, output_dir: &Path) -> anyhow::Result<()> {
    let files = json_files(output_dir)?;
    if files.is_empty() {
        println!(
            "{} No JSON files found in {}",
            style("!").yellow(),
            output_dir.display()
        );
        return Ok(());
    }

    let mut invalid = 0;
    let mut flagged = 0;
    for path in &files {
        let raw = tokio::fs::read_to_string(path).await?;
        let issues = check_record(&raw, &settings.policy);

        if issues.iter().any(Issue::is_invalid) {
            invalid += 1;
        } else if !issues.is_empty() {
            flagged += 1;
        }
        for issue in &issues {
            let marker = if issue.is_invalid() {
                style("✗").red()
            } else {
                style("!").yellow()
            };
            println!("  {} {}: {}", marker, display_name(path), issue.describe());
        }
    }

    println!(
        "\n{} Verified {} files: {} valid, {} flagged, {} invalid",
        if invalid == 0 {
            style("✓").green()
        } else {
            style("✗").red()
        },
        files.len(),
        files.len() - invalid,
        flagged,
        invalid
    );

    if invalid > 0 {
        anyhow::bail!("{} of {} records failed verification", invalid, files.len());
    }
    Ok(())
}
