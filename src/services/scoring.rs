//! Integrity scoring.

use crate::config::Policy;
use crate::models::TextType;

/// Inputs to [`score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub text_type: TextType,
    pub page_count: u32,
    pub total_chars: usize,
    /// OCR mean confidence; only meaningful for `image` documents.
    pub avg_ocr_confidence: Option<f64>,
    /// Fraction of pages with no text, in `[0, 1]`.
    pub empty_page_ratio: f64,
}

/// Fraction of pages that are blank after trimming.
pub fn empty_page_ratio(pages: &[String]) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let empty = pages.iter().filter(|p| p.trim().is_empty()).count();
    empty as f64 / pages.len() as f64
}

/// Deterministic quality score in `[0, 1]`, rounded to four decimals.
pub fn score(inputs: &ScoreInputs, policy: &Policy) -> f64 {
    if inputs.page_count == 0 {
        return 0.0;
    }

    let expected = f64::from(inputs.page_count) * policy.expected_chars_per_page;
    let char_ratio = (inputs.total_chars as f64 / expected).min(1.0);

    let raw = match inputs.text_type {
        TextType::Text => {
            let w = policy.text_char_weight;
            policy.text_base_weight * (w * char_ratio + (1.0 - w))
                - policy.empty_page_penalty * inputs.empty_page_ratio
        }
        TextType::Image => {
            let w = policy.image_char_weight;
            let confidence = inputs
                .avg_ocr_confidence
                .unwrap_or(policy.default_ocr_confidence);
            policy.image_base_weight * (w * char_ratio + (1.0 - w) * confidence)
        }
    };

    round4(raw.clamp(0.0, 1.0))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
