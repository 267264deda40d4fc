//! Span-to-line compaction.

use crate::layout::item::{Line, PageLines};
use crate::layout::LayoutConfig;
use crate::model::{Page, TextSpan};

/// Group a page's spans into lines.
///
/// Spans whose baselines fall within a tolerance (a fraction of the
/// span's font size) belong to one line; lines come out ordered top to
/// bottom, spans within a line left to right.
pub fn compact_lines(page: &Page, config: &LayoutConfig) -> PageLines {
    let mut spans: Vec<TextSpan> = page
        .spans
        .iter()
        .filter(|s| !s.is_blank())
        .cloned()
        .collect();

    spans.sort_by(|a, b| {
        let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal);
        if y_cmp == std::cmp::Ordering::Equal {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y_cmp
        }
    });

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * config.y_tolerance_factor;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(Line::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from_spans(current));
    }

    PageLines {
        number: page.number,
        width: page.width,
        height: page.height,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, 12.0)
    }

    #[test]
    fn test_groups_by_baseline() {
        let mut page = Page::new(1, 612.0, 792.0);
        page.add_span(span("world", 50.0, 700.0));
        page.add_span(span("Hello", 10.0, 700.5));
        page.add_span(span("Second", 10.0, 686.0));

        let lines = compact_lines(&page, &LayoutConfig::default());
        assert_eq!(lines.lines.len(), 2);
        assert_eq!(lines.lines[0].text, "Hello world");
        assert_eq!(lines.lines[1].text, "Second");
    }

    #[test]
    fn test_lines_ordered_top_down() {
        let mut page = Page::new(1, 612.0, 792.0);
        page.add_span(span("bottom", 10.0, 100.0));
        page.add_span(span("top", 10.0, 700.0));
        page.add_span(span("middle", 10.0, 400.0));

        let lines = compact_lines(&page, &LayoutConfig::default());
        let texts: Vec<&str> = lines.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn test_superscript_stays_on_line() {
        // A raised small span within tolerance joins its body line.
        let mut page = Page::new(1, 612.0, 792.0);
        page.add_span(span("Body", 10.0, 700.0));
        let mut sup = TextSpan::new("1", 36.0, 703.0, 7.0);
        sup.width = 3.5;
        page.add_span(sup);

        let lines = compact_lines(&page, &LayoutConfig::default());
        assert_eq!(lines.lines.len(), 1);
        assert_eq!(lines.lines[0].spans.len(), 2);
    }

    #[test]
    fn test_blank_spans_dropped() {
        let mut page = Page::new(1, 612.0, 792.0);
        page.add_span(span("   ", 10.0, 700.0));
        let lines = compact_lines(&page, &LayoutConfig::default());
        assert!(lines.lines.is_empty());
    }
}
