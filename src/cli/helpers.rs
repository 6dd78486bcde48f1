//! Shared helper functions for CLI commands.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// File name for progress messages, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn batch_progress(total: u64, message: &'static str) -> ProgressBar {
    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    progress.set_message(message);
    progress
}

/// Print to stderr without tearing an active progress bar.
pub fn print_above(progress: Option<&ProgressBar>, line: String) {
    match progress {
        Some(progress) => progress.suspend(|| eprintln!("{}", line)),
        None => eprintln!("{}", line),
    }
}

/// Print the missing external tools. Returns true when any are missing.
pub fn report_missing_tools(tools: &[(&'static str, bool)]) -> bool {
    let missing: Vec<_> = tools.iter().filter(|(_, found)| !found).collect();
    if missing.is_empty() {
        return false;
    }
    println!("{} Required tools are missing:", style("✗").red());
    for (tool, _) in &missing {
        println!("  - {}", tool);
    }
    println!();
    println!("Install the missing tools, then run: parsdoc check-tools");
    true
}
