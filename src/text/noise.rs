//! Running header/footer removal.

use std::collections::HashMap;

/// Minimum number of pages a line must appear on to count as noise.
///
/// A line repeated on at least half of the pages (and never fewer than two)
/// is treated as a running header or footer.
pub fn repeat_threshold(page_count: usize) -> usize {
    let half = page_count.div_ceil(2);
    half.max(2)
}

fn first_non_blank(page: &str) -> Option<&str> {
    page.lines().map(str::trim).find(|l| !l.is_empty())
}

fn last_non_blank(page: &str) -> Option<&str> {
    page.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

fn count_lines<'a>(lines: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for line in lines {
        *counts.entry(line).or_insert(0) += 1;
    }
    counts
}

/// Drop running headers and footers from a document's pages.
///
/// Page order and page count are preserved. Headers are matched only against
/// each page's first non-blank line and footers only against its last, so a
/// body line that happens to equal a header stays put.
pub fn strip_headers_footers(pages: &[String]) -> Vec<String> {
    let threshold = repeat_threshold(pages.len());

    let header_counts = count_lines(pages.iter().filter_map(|p| first_non_blank(p)));
    let footer_counts = count_lines(pages.iter().filter_map(|p| last_non_blank(p)));

    let is_header = |line: &str| header_counts.get(line).copied().unwrap_or(0) >= threshold;
    let is_footer = |line: &str| footer_counts.get(line).copied().unwrap_or(0) >= threshold;

    pages
        .iter()
        .map(|page| strip_page(page, &is_header, &is_footer))
        .collect()
}

fn strip_page(
    page: &str,
    is_header: &impl Fn(&str) -> bool,
    is_footer: &impl Fn(&str) -> bool,
) -> String {
    let lines: Vec<&str> = page.lines().collect();

    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return page.to_string();
    };

    let drop_first = is_header(lines[first].trim());
    // A single-line page only loses its line once.
    let drop_last = is_footer(lines[last].trim()) && !(last == first && drop_first);

    lines
        .iter()
        .enumerate()
        .filter(|&(i, _)| !(drop_first && i == first) && !(drop_last && i == last))
        .map(|(_, l)| *l)
        .collect::<Vec<_>>()
        .join("\n")
}
