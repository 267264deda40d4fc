//! List item classification.
//!
//! Lines opening with a bullet glyph or an ordinal (`1.`, `a)`, `(2)`)
//! become list items. Nesting level derives from the left indent
//! relative to the body text margin.

use crate::layout::item::{LineTag, PageLines};
use crate::model::ListMarker;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Indent in points that advances nesting by one level
    pub indent_step: f32,
    /// Deepest recognized nesting level
    pub max_level: u8,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            indent_step: 18.0,
            max_level: 3,
        }
    }
}

/// Tag list items in place, stripping their markers from the text.
pub fn classify_lists(page: &mut PageLines, config: &ListConfig) {
    let margin = body_margin(page);

    for line in &mut page.lines {
        if line.tag != LineTag::Plain || line.is_blank() {
            continue;
        }
        let Some((marker, content)) = split_list_marker(&line.text) else {
            continue;
        };
        let indent = (line.x - margin).max(0.0);
        let level = ((indent / config.indent_step).round() as u8).min(config.max_level);
        line.tag = LineTag::ListItem { level, marker };
        line.text = content;
    }
}

/// Most common left edge of unclassified lines; first-seen on ties.
fn body_margin(page: &PageLines) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    let mut order: Vec<i32> = Vec::new();
    for line in &page.lines {
        if line.tag != LineTag::Plain || line.is_blank() {
            continue;
        }
        let key = line.x.round() as i32;
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }
    let mut best: Option<i32> = None;
    let mut best_count = 0;
    for &key in &order {
        let count = counts[&key];
        if count > best_count {
            best = Some(key);
            best_count = count;
        }
    }
    best.map(|k| k as f32).unwrap_or(0.0)
}

/// Split a leading list marker from the line text.
///
/// Stricter than [`is_number_marker`]: an ordinal needs its separator
/// (`1.`, not a bare `1`), and the item needs content after the marker.
pub fn split_list_marker(text: &str) -> Option<(ListMarker, String)> {
    let trimmed = text.trim_start();
    let (first, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };
    let content = rest.trim();
    if content.is_empty() {
        return None;
    }

    if is_bullet_marker(first) {
        return Some((ListMarker::Bullet, content.to_string()));
    }
    if is_ordinal_marker(first) {
        return Some((ListMarker::Number(first.to_string()), content.to_string()));
    }
    None
}

/// Ordinal with a separator: `1.`, `12)`, `a.`, `B)`, `(3)`.
fn is_ordinal_marker(token: &str) -> bool {
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit());
    }
    let Some(body) = token.strip_suffix(['.', ')']) else {
        return false;
    };
    if body.is_empty() || body.len() > 4 {
        return false;
    }
    body.chars().all(|c| c.is_ascii_digit())
        || (body.chars().count() == 1 && body.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Check if text is a standalone bullet glyph.
pub(crate) fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●"
            | "※" | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Check if text looks like an ordinal label, separator optional.
/// Used by the table detector to reject list-shaped rows.
pub(crate) fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.parse::<u32>().is_ok() {
        return true;
    }
    is_ordinal_marker(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::item::Line;
    use crate::model::TextSpan;

    fn plain_line(text: &str, x: f32, y: f32) -> Line {
        Line::from_spans(vec![TextSpan::new(text, x, y, 12.0)])
    }

    fn page_of(lines: Vec<Line>) -> PageLines {
        PageLines {
            number: 1,
            width: 612.0,
            height: 792.0,
            lines,
        }
    }

    #[test]
    fn test_bullet_items() {
        let mut page = page_of(vec![
            plain_line("Introductory paragraph text.", 72.0, 700.0),
            plain_line("• First item", 72.0, 686.0),
            plain_line("• Second item", 72.0, 672.0),
        ]);
        classify_lists(&mut page, &ListConfig::default());

        assert_eq!(
            page.lines[1].tag,
            LineTag::ListItem {
                level: 0,
                marker: ListMarker::Bullet
            }
        );
        assert_eq!(page.lines[1].text, "First item");
        assert_eq!(page.lines[0].tag, LineTag::Plain);
    }

    #[test]
    fn test_numbered_item_keeps_ordinal() {
        let mut page = page_of(vec![plain_line("2. Second step", 72.0, 700.0)]);
        classify_lists(&mut page, &ListConfig::default());
        assert_eq!(
            page.lines[0].tag,
            LineTag::ListItem {
                level: 0,
                marker: ListMarker::Number("2.".to_string())
            }
        );
        assert_eq!(page.lines[0].text, "Second step");
    }

    #[test]
    fn test_indent_sets_nesting_level() {
        let mut page = page_of(vec![
            plain_line("Body margin line one.", 72.0, 700.0),
            plain_line("Body margin line two.", 72.0, 686.0),
            plain_line("• Top item", 72.0, 672.0),
            plain_line("• Nested item", 90.0, 658.0),
            plain_line("• Deeper item", 108.0, 644.0),
        ]);
        classify_lists(&mut page, &ListConfig::default());

        let levels: Vec<u8> = page.lines[2..]
            .iter()
            .map(|l| match &l.tag {
                LineTag::ListItem { level, .. } => *level,
                other => panic!("expected list item, got {other:?}"),
            })
            .collect();
        assert_eq!(levels, vec![0, 1, 2]);
    }

    #[test]
    fn test_parenthesized_and_letter_markers() {
        assert!(matches!(
            split_list_marker("(3) parenthesized item"),
            Some((ListMarker::Number(ref n), _)) if n == "(3)"
        ));
        assert!(matches!(
            split_list_marker("a) lettered item"),
            Some((ListMarker::Number(ref n), _)) if n == "a)"
        ));
    }

    #[test]
    fn test_non_markers_stay_plain() {
        assert!(split_list_marker("Average. Values follow").is_none());
        assert!(split_list_marker("3 items remained").is_none());
        assert!(split_list_marker("•").is_none());
        assert!(split_list_marker("word").is_none());
    }

    #[test]
    fn test_number_marker_predicate() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12)"));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("1 ."));
        assert!(is_number_marker("a."));
        assert!(!is_number_marker("Name"));
        assert!(!is_number_marker(""));
        assert!(!is_number_marker("[AB1]"));
    }
}
