//! Output record written for each successfully processed document.

use serde::{Deserialize, Serialize};

/// Language tag carried by every record.
pub const LANGUAGE_FA: &str = "fa";

/// Whether a document carried a usable text layer or went through OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    Text,
    Image,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for TextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-document metadata block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Source PDF path as given to the batch.
    pub source_path: String,
    pub page_count: u32,
    pub text_type: TextType,
    /// Always `"fa"`.
    pub language: String,
    /// Quality score in `[0, 1]`, rounded to four decimals.
    pub integrity_score: f64,
}

/// The JSON document emitted for one source PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub metadata: Metadata,
}

impl OutputRecord {
    pub fn new(
        title: String,
        paragraphs: Vec<String>,
        source_path: String,
        page_count: u32,
        text_type: TextType,
        integrity_score: f64,
    ) -> Self {
        Self {
            title,
            paragraphs,
            metadata: Metadata {
                source_path,
                page_count,
                text_type,
                language: LANGUAGE_FA.to_string(),
                integrity_score,
            },
        }
    }

    /// Pretty-printed UTF-8 JSON with a trailing newline.
    ///
    /// Non-ASCII text is written as-is, never `\u` escaped.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
