//! Text-layer vs. scanned classification.

use crate::config::Policy;
use crate::models::TextType;

/// Classification of one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub text_type: TextType,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Average trimmed characters per page seen by the trial.
    pub avg_chars_per_page: f64,
}

/// Total characters across pages, each page trimmed first.
pub fn total_trimmed_chars(pages: &[String]) -> usize {
    pages.iter().map(|p| p.trim().chars().count()).sum()
}

/// Classify a document from a trial native extraction.
///
/// `trial` is `None` when the trial could not read the document at all.
/// That case, like a zero-page document, is `image` with full confidence.
pub fn classify(trial: Option<&[String]>, policy: &Policy) -> Classification {
    let pages = match trial {
        Some(pages) if !pages.is_empty() => pages,
        _ => {
            return Classification {
                text_type: TextType::Image,
                confidence: 1.0,
                avg_chars_per_page: 0.0,
            }
        }
    };

    let avg = total_trimmed_chars(pages) as f64 / pages.len() as f64;
    let threshold = policy.text_threshold_chars_per_page;

    let (text_type, confidence) = if avg >= threshold {
        (
            TextType::Text,
            (avg / policy.text_confidence_saturation).min(1.0),
        )
    } else {
        (TextType::Image, (1.0 - avg / threshold).clamp(0.0, 1.0))
    };

    Classification {
        text_type,
        confidence,
        avg_chars_per_page: avg,
    }
}
