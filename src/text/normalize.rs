//! Persian script normalization.
//!
//! Maps Arabic-script variants to their Persian canonical forms, removes
//! invisible formatting marks and control characters, applies NFC and
//! collapses whitespace. Paragraph breaks (blank lines) survive the collapse
//! as a literal `"\n\n"` so the segmenter can still find them.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Separator emitted between paragraphs of normalized text.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Arabic code points and the Persian form that replaces them.
pub const PERSIAN_CHAR_MAP: &[(char, char)] = &[
    ('\u{0643}', '\u{06A9}'), // Arabic Kaf -> Keheh
    ('\u{064A}', '\u{06CC}'), // Arabic Yeh -> Farsi Yeh
    ('\u{0649}', '\u{06CC}'), // Alef Maksura -> Farsi Yeh
    ('\u{0629}', '\u{0647}'), // Teh Marbuta -> Heh
    ('\u{0660}', '\u{06F0}'),
    ('\u{0661}', '\u{06F1}'),
    ('\u{0662}', '\u{06F2}'),
    ('\u{0663}', '\u{06F3}'),
    ('\u{0664}', '\u{06F4}'),
    ('\u{0665}', '\u{06F5}'),
    ('\u{0666}', '\u{06F6}'),
    ('\u{0667}', '\u{06F7}'),
    ('\u{0668}', '\u{06F8}'),
    ('\u{0669}', '\u{06F9}'),
];

/// Zero-width and bidi formatting marks. Each is replaced by a plain space.
const INVISIBLE_MARKS: &[char] = &[
    '\u{00AD}', // soft hyphen
    '\u{061C}', // Arabic letter mark
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}',
    '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
    '\u{2060}', '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}',
    '\u{FEFF}',
];

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r\x0B\x0C]*\n").expect("valid blank-line pattern"));

/// Map a single character through the Arabic -> Persian table.
pub fn to_persian_char(c: char) -> char {
    PERSIAN_CHAR_MAP
        .iter()
        .find(|&&(arabic, _)| arabic == c)
        .map(|&(_, persian)| persian)
        .unwrap_or(c)
}

/// Whether `c` is one of the Arabic code points the normalizer rewrites.
pub fn is_unnormalized(c: char) -> bool {
    PERSIAN_CHAR_MAP.iter().any(|&(arabic, _)| arabic == c)
}

/// Normalize Persian text.
///
/// Total and side-effect free; `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned: String = text
        .chars()
        .map(to_persian_char)
        .map(|c| if INVISIBLE_MARKS.contains(&c) { ' ' } else { c })
        // Line breaks and tabs are whitespace; the collapse below handles them.
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    let composed: String = cleaned.nfc().collect();

    collapse_whitespace(&composed)
}

/// Collapse whitespace runs to single spaces, keeping blank-line breaks.
fn collapse_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    BLANK_LINE
        .split(&text)
        .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_BREAK)
}
