//! External tool availability check.

use console::style;

use crate::cli::helpers::report_missing_tools;
use crate::config::Settings;
use crate::ocr::{check_tools, installed_languages, TesseractBackend};

/// Report Poppler/Tesseract availability and the configured OCR model.
pub async fn cmd_check_tools(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = check_tools();
    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    let ocr_status = if TesseractBackend::is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("\n{}", style("OCR Backend:").cyan());
    println!("  {:<15} {}", "Tesseract", ocr_status);

    println!("\n{}", style("Tesseract Models:").cyan());
    let mut model_ok = false;
    match installed_languages() {
        Ok(langs) => {
            for lang in [&settings.ocr.language, &settings.ocr.fallback_language] {
                let status = if langs.iter().any(|l| l == lang) {
                    style("✓ installed").green()
                } else {
                    style("✗ missing").red()
                };
                println!("  {:<15} {}", lang, status);
            }
            model_ok = langs.contains(&settings.ocr.language);
            if !model_ok {
                println!(
                    "                  {}",
                    style(format!(
                        "Install the '{}' traineddata (e.g. tesseract-ocr-{})",
                        settings.ocr.language, settings.ocr.language
                    ))
                    .dim()
                );
            }
        }
        Err(e) => println!("  {}", style(e.to_string()).dim()),
    }
    println!();

    let missing = report_missing_tools(&tools);
    if !missing && model_ok {
        println!("{} All tools are available", style("✓").green());
    } else if !missing {
        println!(
            "{} OCR will fall back to '{}'",
            style("!").yellow(),
            settings.ocr.fallback_language
        );
    }
    Ok(())
}
