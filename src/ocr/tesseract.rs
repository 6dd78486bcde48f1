//! Tesseract OCR backend.
//!
//! Pages are rasterized with `pdftoppm` into a temporary directory and
//! recognized with the `tesseract` CLI in TSV mode, which gives per-word
//! confidences alongside the text.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use tempfile::TempDir;

use super::backend::{OcrEngine, OcrError, PageRecognition};
use super::extractor::ExtractionError;
use super::pdf_utils::{PdfInfoSource, Pdfinfo};
use super::tools::{check_binary, check_cmd_status, handle_cmd_output};
use crate::config::OcrSettings;

/// TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    settings: OcrSettings,
    /// Model actually passed to `-l`, resolved on first use.
    resolved_language: OnceLock<String>,
}

impl TesseractBackend {
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            settings,
            resolved_language: OnceLock::new(),
        }
    }

    /// Whether tesseract and pdftoppm are both installed.
    pub fn is_available() -> bool {
        check_binary("tesseract") && check_binary("pdftoppm")
    }

    /// The model used for recognition: the configured language if installed,
    /// otherwise the fallback.
    pub fn language(&self) -> &str {
        self.resolved_language.get_or_init(|| {
            let requested = &self.settings.language;
            match installed_languages() {
                Ok(installed) => {
                    choose_language(requested, &self.settings.fallback_language, &installed)
                }
                Err(e) => {
                    tracing::warn!("Could not list tesseract languages: {}", e);
                    requested.clone()
                }
            }
        })
    }

    /// Convert a PDF page to an image.
    fn pdf_page_to_image(
        &self,
        pdf_path: &Path,
        page: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError> {
        let page_str = page.to_string();
        let dpi = self.settings.dpi.to_string();
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi, "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(output_dir.join("page"))
            .status();

        check_cmd_status(status, &format!("pdftoppm failed to convert page {}", page))
            .map_err(|e| OcrError::from_tool("pdftoppm not found (install poppler-utils)", e))?;

        find_page_image(output_dir, page)
            .ok_or_else(|| OcrError::OcrFailed(format!("No image generated for page {}", page)))
    }

    /// Run Tesseract on an image file in TSV mode.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", self.language(), "--psm", "6", "tsv"])
            .output();

        handle_cmd_output(output, "tesseract failed")
            .map_err(|e| OcrError::from_tool("tesseract not found (install tesseract-ocr)", e))
    }
}

impl OcrEngine for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn page_count(&self, pdf_path: &Path) -> Result<u32, OcrError> {
        Pdfinfo
            .info(pdf_path)
            .map(|info| info.page_count)
            .map_err(|e| match e {
                ExtractionError::ToolNotFound(tool) => OcrError::BackendNotAvailable(tool),
                ExtractionError::Io(e) => OcrError::Io(e),
                other => OcrError::OcrFailed(other.to_string()),
            })
    }

    fn recognize_page(&self, pdf_path: &Path, page: u32) -> Result<PageRecognition, OcrError> {
        let temp_dir = TempDir::new()?;
        let image_path = self.pdf_page_to_image(pdf_path, page, temp_dir.path())?;
        let tsv = self.run_tesseract(&image_path)?;
        Ok(parse_tsv(&tsv))
    }
}

/// Find the image file for a specific page number.
///
/// pdftoppm zero-pads the page number to the width of the document's page
/// count: `page-1.png`, `page-01.png`, `page-001.png`.
pub fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    (1..=4)
        .map(|digits| dir.join(format!("page-{:0width$}.png", page, width = digits)))
        .find(|path| path.exists())
}

/// Languages reported by `tesseract --list-langs`.
pub fn installed_languages() -> Result<Vec<String>, OcrError> {
    let output = Command::new("tesseract").arg("--list-langs").output();
    let output = match output {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OcrError::BackendNotAvailable(
                "tesseract not found (install tesseract-ocr)".to_string(),
            ))
        }
        Err(e) => return Err(OcrError::Io(e)),
    };

    // Older releases print the list on stderr.
    let mut listing = String::from_utf8_lossy(&output.stdout).to_string();
    listing.push('\n');
    listing.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(parse_language_list(&listing))
}

/// Parse `--list-langs` output, skipping the header line.
pub fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}

fn choose_language(requested: &str, fallback: &str, installed: &[String]) -> String {
    if installed.iter().any(|l| l == requested) {
        requested.to_string()
    } else {
        tracing::warn!(
            "Tesseract model '{}' is not installed, falling back to '{}'",
            requested,
            fallback
        );
        fallback.to_string()
    }
}

/// Rebuild page text and mean word confidence from Tesseract TSV output.
///
/// Words on the same line are joined by spaces, lines by newlines, and
/// paragraphs by a blank line. The `-1` confidence sentinel is excluded.
pub fn parse_tsv(tsv: &str) -> PageRecognition {
    let mut text = String::new();
    let mut confidences: Vec<f64> = Vec::new();
    let mut current_line: Option<(u32, u32, u32)> = None;

    for row in tsv.lines().skip_while(|l| l.starts_with("level")) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: u32 = match cols[0].parse() {
            Ok(level) => level,
            Err(_) => continue,
        };
        if level != WORD_LEVEL {
            continue;
        }
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let key: (u32, u32, u32) = (
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        match current_line {
            Some(prev) if prev == key => text.push(' '),
            Some((block, par, _)) if (block, par) == (key.0, key.1) => text.push('\n'),
            Some(_) => text.push_str("\n\n"),
            None => {}
        }
        current_line = Some(key);
        text.push_str(word);

        if let Ok(conf) = cols[10].trim().parse::<f64>() {
            if conf >= 0.0 {
                confidences.push(conf);
            }
        }
    }

    let confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64 / 100.0)
    };

    PageRecognition { text, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, par: u32, line: u32, conf: &str, text: &str) -> String {
        format!("5\t1\t{block}\t{par}\t{line}\t1\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn groups_words_into_lines_and_paragraphs() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t".to_string(),
            word(1, 1, 1, "90", "ماده"),
            word(1, 1, 1, "80", "یک"),
            word(1, 1, 2, "70", "ادامه"),
            word(2, 1, 1, "60", "ماده"),
            word(2, 1, 1, "-1", "دو"),
        ]
        .join("\n");

        let page = parse_tsv(&tsv);
        assert_eq!(page.text, "ماده یک\nادامه\n\nماده دو");
        let conf = page.confidence.unwrap();
        assert!((conf - 0.75).abs() < 1e-9);
    }

    #[test]
    fn no_words_means_no_confidence() {
        let tsv = format!("{HEADER}\n1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n");
        let page = parse_tsv(&tsv);
        assert_eq!(page.text, "");
        assert_eq!(page.confidence, None);
    }

    #[test]
    fn skips_blank_words_and_short_rows() {
        let tsv = [HEADER.to_string(), word(1, 1, 1, "95", "  "), "5\t1\t1".to_string()].join("\n");
        assert_eq!(parse_tsv(&tsv), PageRecognition::default());
    }

    #[test]
    fn parses_language_listing() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nfas\nosd\n";
        assert_eq!(parse_language_list(listing), vec!["eng", "fas", "osd"]);
    }

    #[test]
    fn falls_back_when_model_missing() {
        let installed = vec!["eng".to_string(), "osd".to_string()];
        assert_eq!(choose_language("fas", "eng", &installed), "eng");
        let installed = vec!["fas".to_string()];
        assert_eq!(choose_language("fas", "eng", &installed), "fas");
    }

    #[test]
    fn finds_zero_padded_page_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-03.png"), b"png").unwrap();
        assert_eq!(find_page_image(dir.path(), 3), Some(dir.path().join("page-03.png")));
        assert_eq!(find_page_image(dir.path(), 4), None);
    }
}
