//! Paragraph reconstruction from normalized text.

/// Default upper bound on paragraph length, in characters.
pub const DEFAULT_MAX_PARAGRAPH_LEN: usize = 1200;

/// Characters that end a sentence. The mark stays with its sentence.
pub const SENTENCE_TERMINALS: &[char] = &['.', '!', '؟', ';', '؛'];

/// Split text into paragraphs.
///
/// Blocks are separated by blank lines. Each block is broken into sentences
/// which are then packed greedily into paragraphs of at most `max_len`
/// characters. A sentence longer than `max_len` becomes its own paragraph.
/// Paragraphs never span blocks and are never empty.
pub fn segment(text: &str, max_len: usize) -> Vec<String> {
    let mut paragraphs = Vec::new();

    for block in blocks(text) {
        let sentences = split_sentences(&block);
        if sentences.is_empty() {
            paragraphs.push(block);
            continue;
        }
        pack(sentences, max_len, &mut paragraphs);
    }

    paragraphs
}

/// Blank-line separated blocks, each flattened onto a single line.
fn blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }

    blocks
}

fn split_sentences(block: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in block.chars() {
        current.push(c);
        if SENTENCE_TERMINALS.contains(&c) {
            flush_sentence(&mut current, &mut sentences);
        }
    }
    flush_sentence(&mut current, &mut sentences);

    sentences
}

/// Move the buffered piece into `sentences`. Punctuation-only pieces
/// (an ellipsis, a doubled mark) are glued onto the previous sentence.
fn flush_sentence(current: &mut String, sentences: &mut Vec<String>) {
    let piece = current.trim();
    if !piece.is_empty() {
        let punctuation_only = !piece.chars().any(char::is_alphanumeric);
        match sentences.last_mut() {
            Some(prev) if punctuation_only => prev.push_str(piece),
            _ => sentences.push(piece.to_string()),
        }
    }
    current.clear();
}

fn pack(sentences: Vec<String>, max_len: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences {
        let len = sentence.chars().count();
        if current.is_empty() {
            current = sentence;
            current_len = len;
        } else if current_len + 1 + len <= max_len {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + len;
        } else {
            out.push(std::mem::take(&mut current));
            current = sentence;
            current_len = len;
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_separate_paragraphs() {
        let text = "ماده ۱. متن اول.\n\nماده ۲. متن دوم.";
        assert_eq!(
            segment(text, DEFAULT_MAX_PARAGRAPH_LEN),
            vec!["ماده ۱. متن اول.", "ماده ۲. متن دوم."]
        );
    }

    #[test]
    fn packs_sentences_up_to_max_len() {
        let text = "aaaa. bbbb. cccc. dddd.";
        // Each sentence is 5 chars; two fit in 11.
        assert_eq!(segment(text, 11), vec!["aaaa. bbbb.", "cccc. dddd."]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Ten Persian letters are twenty bytes.
        let sentence = "ابپتثجچحخد.";
        let text = format!("{sentence} {sentence}");
        assert_eq!(segment(&text, 23).len(), 1);
        assert_eq!(segment(&text, 22).len(), 2);
    }

    #[test]
    fn keeps_persian_terminals_with_sentence() {
        let text = "آیا درست است؟ بله؛ همین است.";
        assert_eq!(segment(text, 15), vec!["آیا درست است؟", "بله؛ همین است."]);
    }

    #[test]
    fn punctuation_runs_attach_to_previous_sentence() {
        let text = "صبر کنید... ادامه!";
        assert_eq!(segment(text, 10), vec!["صبر کنید...", "ادامه!"]);
    }

    #[test]
    fn overlong_sentence_stands_alone() {
        let long = "x".repeat(50);
        let text = format!("short. {long}. tail.");
        let paragraphs = segment(&text, 20);
        assert_eq!(paragraphs, vec!["short.".to_string(), format!("{long}."), "tail.".to_string()]);
    }

    #[test]
    fn block_without_terminal_is_one_paragraph() {
        assert_eq!(segment("بدون نقطه پایان", 1200), vec!["بدون نقطه پایان"]);
    }

    #[test]
    fn paragraphs_never_span_blocks() {
        let text = "a.\n\nb.";
        assert_eq!(segment(text, 1200), vec!["a.", "b."]);
    }

    #[test]
    fn no_empty_paragraphs() {
        let text = "\n\n  \n. \n\n متن .\n\n\n";
        let paragraphs = segment(text, 1200);
        assert!(!paragraphs.is_empty());
        assert!(paragraphs.iter().all(|p| !p.trim().is_empty()));
    }

    #[test]
    fn empty_text_has_no_paragraphs() {
        assert!(segment("", 1200).is_empty());
        assert!(segment("  \n\n ", 1200).is_empty());
    }

    #[test]
    fn paragraph_length_bounded_by_max_plus_one_sentence() {
        let text: String = (0..200).map(|i| format!("جمله شماره {i}. ")).collect();
        let max_len = 120;
        let longest_sentence = text
            .split_inclusive('.')
            .map(|s| s.trim().chars().count())
            .max()
            .unwrap_or(0);
        for p in segment(&text, max_len) {
            assert!(p.chars().count() <= max_len + longest_sentence);
        }
    }
}
