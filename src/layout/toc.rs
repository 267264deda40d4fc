//! Table-of-contents detection.
//!
//! Dot-leader lines ("Introduction ...... 3") in a contiguous run are
//! rendered as a two-column table, which survives Markdown far better
//! than a paragraph of dots.

use crate::layout::item::{LineTag, PageLines};

#[derive(Debug, Clone)]
pub struct TocConfig {
    /// Consecutive dot-leader lines needed before a run is tagged
    pub min_entries: usize,
    /// Leader dots required between title and page number
    pub min_leader_dots: usize,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            min_entries: 3,
            min_leader_dots: 4,
        }
    }
}

/// Tag contiguous dot-leader runs as contents entries.
pub fn detect_toc(page: &mut PageLines, config: &TocConfig) {
    let mut index = 0;
    while index < page.lines.len() {
        if page.lines[index].tag != LineTag::Plain
            || split_leader_line(&page.lines[index].text, config).is_none()
        {
            index += 1;
            continue;
        }
        let start = index;
        let mut end = index + 1;
        while end < page.lines.len()
            && page.lines[end].tag == LineTag::Plain
            && split_leader_line(&page.lines[end].text, config).is_some()
        {
            end += 1;
        }
        if end - start >= config.min_entries {
            for line in &mut page.lines[start..end] {
                // Checked Some above for every line in the run.
                if let Some((title, page_number)) = split_leader_line(&line.text, config) {
                    line.tag = LineTag::TocEntry;
                    line.cells = vec![title, page_number];
                }
            }
        }
        index = end;
    }
}

/// Split "Title ..... 12" into title and page number.
///
/// Requires a trailing number and at least `min_leader_dots` dots
/// directly before it; spaces between the dots are tolerated.
fn split_leader_line(text: &str, config: &TocConfig) -> Option<(String, String)> {
    let trimmed = text.trim_end();
    let digit_start = trimmed
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))?;
    if digit_start >= trimmed.len() {
        return None;
    }
    let page_number = &trimmed[digit_start..];

    let mut dots = 0;
    let mut title_end = digit_start;
    for (offset, c) in trimmed[..digit_start].char_indices().rev() {
        match c {
            '.' | '\u{2026}' => {
                dots += if c == '.' { 1 } else { 3 };
                title_end = offset;
            }
            c if c.is_whitespace() => {}
            _ => break,
        }
    }
    if dots < config.min_leader_dots {
        return None;
    }
    let title = trimmed[..title_end].trim();
    if title.is_empty() {
        return None;
    }
    Some((title.to_string(), page_number.to_string()))
}
