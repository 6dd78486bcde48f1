//! Document title selection.

use super::normalize::normalize;

const MIN_METADATA_TITLE_CHARS: usize = 3;
const MIN_LINE_TITLE_CHARS: usize = 6;
const MAX_LINE_TITLE_CHARS: usize = 200;

/// Pick a title for a document.
///
/// Preference order: the PDF's `Title` metadata, then the first body line of
/// plausible title length, then the file stem.
pub fn choose_title(metadata_title: Option<&str>, pages: &[String], file_stem: &str) -> String {
    if let Some(title) = metadata_title.map(normalize) {
        if title.chars().count() >= MIN_METADATA_TITLE_CHARS {
            return title;
        }
    }

    pages
        .iter()
        .flat_map(|page| page.lines())
        .map(normalize)
        .find(|line| {
            let len = line.chars().count();
            (MIN_LINE_TITLE_CHARS..=MAX_LINE_TITLE_CHARS).contains(&len)
        })
        .unwrap_or_else(|| file_stem.to_string())
}
