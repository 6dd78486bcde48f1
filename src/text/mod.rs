//! Persian text processing: normalization, noise removal, segmentation.

mod noise;
mod normalize;
mod segment;
mod title;

pub use noise::{repeat_threshold, strip_headers_footers};
pub use normalize::{is_unnormalized, normalize, to_persian_char, PARAGRAPH_BREAK, PERSIAN_CHAR_MAP};
pub use segment::{segment, DEFAULT_MAX_PARAGRAPH_LEN, SENTENCE_TERMINALS};
pub use title::choose_title;
