//! Layout analysis.
//!
//! Reconstructs document structure from positioned text spans. The
//! pipeline runs in fixed stages over each page:
//!
//! 1. Document-wide statistics ([`stats`]) are computed from the raw
//!    spans before anything mutates them.
//! 2. Spans are compacted into baseline-grouped lines ([`lines`]).
//! 3. Column-aligned runs become table rows ([`tables`]).
//! 4. Repeating headers and footers are dropped ([`repetition`]).
//! 5. Dot-leader contents pages are tagged ([`toc`]).
//! 6. Footnote bodies and anchors are resolved ([`footnotes`]).
//! 7. Oversized lines become headings ([`headings`]), marker lines
//!    become list items ([`lists`]).
//! 8. Classified lines gather into renderable blocks ([`blocks`]).
//!
//! Stages only refine lines still tagged [`item::LineTag::Plain`], so
//! their order fixes precedence: a table row can never later turn into
//! a heading.

pub mod blocks;
pub mod footnotes;
pub mod headings;
pub mod item;
pub mod lines;
pub mod lists;
pub mod repetition;
pub mod stats;
pub mod tables;
pub mod toc;

pub use footnotes::FootnoteConfig;
pub use headings::HeadingConfig;
pub use item::{Line, LineTag, PageLines};
pub use lists::ListConfig;
pub use repetition::RepetitionConfig;
pub use stats::GlobalStats;
pub use tables::TableConfig;
pub use toc::TocConfig;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::model::Document;

/// Tuning knobs for the layout pipeline.
///
/// The defaults are calibrated for office documents and papers at
/// typical body sizes (9-12pt). All thresholds scale with observed
/// font sizes rather than absolute positions, so scaled or large-print
/// documents classify the same way.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Baseline tolerance when grouping spans into lines, as a
    /// fraction of the span's font size
    pub y_tolerance_factor: f32,

    /// Table detection thresholds
    pub table: TableConfig,

    /// Heading ladder thresholds
    pub heading: HeadingConfig,

    /// List marker and indent thresholds
    pub list: ListConfig,

    /// Contents-page detection thresholds
    pub toc: TocConfig,

    /// Footnote band and superscript thresholds
    pub footnote: FootnoteConfig,

    /// Running header/footer removal thresholds
    pub repetition: RepetitionConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            y_tolerance_factor: 0.3,
            table: TableConfig::default(),
            heading: HeadingConfig::default(),
            list: ListConfig::default(),
            toc: TocConfig::default(),
            footnote: FootnoteConfig::default(),
            repetition: RepetitionConfig::default(),
        }
    }
}

/// Run the full layout pipeline, filling each page's `blocks`.
///
/// Statistics are computed from the raw spans up front; later stages
/// never feed back into them. The cancel token is checked between
/// stages.
pub fn analyze(document: &mut Document, config: &LayoutConfig, cancel: &CancelToken) -> Result<()> {
    let stats = GlobalStats::compute(&document.pages);
    cancel.check()?;

    let mut pages: Vec<PageLines> = document
        .pages
        .iter()
        .map(|page| lines::compact_lines(page, config))
        .collect();

    for page in &mut pages {
        tables::detect_tables(page, &config.table);
    }
    cancel.check()?;

    repetition::remove_repeated_lines(&mut pages, &config.repetition);
    cancel.check()?;

    for page in &mut pages {
        toc::detect_toc(page, &config.toc);
    }
    // Footnotes go before lists: a "(1)" body line would otherwise be
    // claimed as a parenthesized list item.
    footnotes::resolve_footnotes(&mut pages, &config.footnote);
    for page in &mut pages {
        headings::classify_headings(page, &stats, &config.heading);
        lists::classify_lists(page, &config.list);
    }
    cancel.check()?;

    for (index, page) in pages.iter().enumerate() {
        let gathered = blocks::gather_blocks(page, &document.pages[index].images);
        document.pages[index].blocks = gathered;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Page, TextSpan};

    fn span(text: &str, x: f32, y: f32, size: f32) -> TextSpan {
        TextSpan::new(text, x, y, size)
    }

    fn body_page(number: u32) -> Page {
        // Body text differs per page so repetition removal never
        // mistakes it for a running header.
        let words = ["alpha", "beta", "gamma", "delta", "epsilon"];
        let word = words[number as usize % words.len()];
        let mut page = Page::letter(number);
        page.add_span(span(
            &format!("Body {} keeps the modal size.", word),
            72.0,
            700.0,
            12.0,
        ));
        page.add_span(span(
            &format!("More {} text at twelve points.", word),
            72.0,
            686.0,
            12.0,
        ));
        page
    }

    // ==================== Pipeline ====================

    #[test]
    fn test_analyze_builds_heading_and_paragraphs() {
        let mut document = Document::new();
        let mut page = body_page(1);
        page.add_span(span("Annual Summary", 72.0, 740.0, 24.0));
        document.add_page(page);
        document.add_page(body_page(2));

        analyze(&mut document, &LayoutConfig::default(), &CancelToken::new()).unwrap();

        let first = &document.pages[0].blocks;
        assert!(matches!(first[0], Block::Heading { level: 1, .. }));
        assert!(matches!(first[1], Block::Paragraph(_)));
        assert_eq!(first.len(), 3);
        assert_eq!(document.pages[1].blocks.len(), 2);
    }

    #[test]
    fn test_analyze_detects_table() {
        let mut document = Document::new();
        let mut page = body_page(1);
        page.add_span(span("Name", 72.0, 600.0, 12.0));
        page.add_span(span("Age", 200.0, 600.0, 12.0));
        page.add_span(span("Alice", 72.0, 586.0, 12.0));
        page.add_span(span("30", 200.0, 586.0, 12.0));
        page.add_span(span("Bob", 72.0, 572.0, 12.0));
        page.add_span(span("25", 200.0, 572.0, 12.0));
        document.add_page(page);

        analyze(&mut document, &LayoutConfig::default(), &CancelToken::new()).unwrap();

        let table = document.pages[0]
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .expect("table block");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.header_signature(), vec!["Name", "Age"]);
    }

    #[test]
    fn test_analyze_strips_running_footer() {
        let mut document = Document::new();
        for number in 1..=4 {
            let mut page = body_page(number);
            page.add_span(span("Model Review Quarterly", 72.0, 30.0, 9.0));
            document.add_page(page);
        }

        analyze(&mut document, &LayoutConfig::default(), &CancelToken::new()).unwrap();

        for page in &document.pages {
            assert_eq!(page.blocks.len(), 2);
            assert!(page
                .blocks
                .iter()
                .all(|b| !b.plain_text().unwrap_or_default().contains("Quarterly")));
        }
    }

    #[test]
    fn test_analyze_honors_cancellation() {
        let mut document = Document::new();
        document.add_page(body_page(1));

        let token = CancelToken::new();
        token.cancel();
        let err = analyze(&mut document, &LayoutConfig::default(), &token).unwrap_err();
        assert_eq!(err.category(), "cancelled");
    }

    #[test]
    fn test_stages_share_config_defaults() {
        let config = LayoutConfig::default();
        assert!(config.y_tolerance_factor > 0.0);
        assert!(config.table.min_columns >= 2);
        assert!(config.heading.max_level <= 6);
    }
}
