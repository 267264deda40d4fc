//! Heading detection from font size.
//!
//! Sizes clearly above the body modal height form a descending ladder;
//! a line whose dominant size matches rung N becomes a level-N heading.
//! Sentence punctuation at the end disqualifies a line, which keeps
//! large-print pull quotes and lead paragraphs out of the outline.

use crate::layout::item::{LineTag, PageLines};
use crate::layout::stats::GlobalStats;

#[derive(Debug, Clone)]
pub struct HeadingConfig {
    /// Minimum size relative to the body modal height
    pub min_ratio: f32,
    /// Tolerance when matching a line against a ladder rung
    pub size_tolerance: f32,
    /// Deepest heading level emitted
    pub max_level: u8,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            min_ratio: 1.05,
            size_tolerance: 0.25,
            max_level: 6,
        }
    }
}

/// Tag heading lines in place using the document-wide size ladder.
pub fn classify_headings(page: &mut PageLines, stats: &GlobalStats, config: &HeadingConfig) {
    let ladder = heading_ladder(stats, config);
    if ladder.is_empty() {
        return;
    }

    for line in &mut page.lines {
        if line.tag != LineTag::Plain || line.is_blank() {
            continue;
        }
        if ends_with_sentence_punctuation(&line.text) {
            continue;
        }
        if let Some(level) = ladder_level(&ladder, line.height, config) {
            line.tag = LineTag::Heading(level);
        }
    }
}

/// Distinct sizes above the body threshold, largest first.
fn heading_ladder(stats: &GlobalStats, config: &HeadingConfig) -> Vec<f32> {
    let floor = stats.modal_height * config.min_ratio;
    stats
        .heading_sizes
        .iter()
        .copied()
        .filter(|&size| size >= floor)
        .collect()
}

fn ladder_level(ladder: &[f32], size: f32, config: &HeadingConfig) -> Option<u8> {
    for (position, &rung) in ladder.iter().enumerate() {
        if (size - rung).abs() <= config.size_tolerance {
            let level = (position as u8).saturating_add(1);
            return Some(level.min(config.max_level));
        }
    }
    None
}

fn ends_with_sentence_punctuation(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some('.' | ',' | ';' | ':' | '!' | '?')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::item::Line;
    use crate::model::{Page, TextSpan};

    fn line(text: &str, size: f32, y: f32) -> Line {
        Line::from_spans(vec![TextSpan::new(text, 72.0, y, size)])
    }

    fn stats_for(lines: &[Line]) -> GlobalStats {
        let mut page = Page::new(1, 612.0, 792.0);
        for l in lines {
            page.spans.extend(l.spans.iter().cloned());
        }
        GlobalStats::compute(std::slice::from_ref(&page))
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
    fn test_size_ladder_assigns_levels() {
        let lines = vec![
            line("Document Title", 24.0, 740.0),
            line("Section One", 18.0, 700.0),
            line("Body text fills most of the page here.", 12.0, 680.0),
            line("More body text keeps twelve point modal.", 12.0, 666.0),
            line("Further body text at the modal size.", 12.0, 652.0),
        ];
        let stats = stats_for(&lines);
        let mut page = page_of(lines);
        classify_headings(&mut page, &stats, &HeadingConfig::default());

        assert_eq!(page.lines[0].tag, LineTag::Heading(1));
        assert_eq!(page.lines[1].tag, LineTag::Heading(2));
        assert_eq!(page.lines[2].tag, LineTag::Plain);
    }

    #[test]
    fn test_trailing_punctuation_disqualifies() {
        let lines = vec![
            line("A large opening remark.", 18.0, 740.0),
            line("Body copy at the usual size.", 12.0, 700.0),
            line("Body copy keeps the modal steady.", 12.0, 686.0),
        ];
        let stats = stats_for(&lines);
        let mut page = page_of(lines);
        classify_headings(&mut page, &stats, &HeadingConfig::default());

        assert_eq!(page.lines[0].tag, LineTag::Plain);
    }

    #[test]
    fn test_body_size_never_heads() {
        let lines = vec![
            line("Just a line", 12.0, 740.0),
            line("Another line of body text here", 12.0, 726.0),
        ];
        let stats = stats_for(&lines);
        let mut page = page_of(lines);
        classify_headings(&mut page, &stats, &HeadingConfig::default());

        assert!(page.lines.iter().all(|l| l.tag == LineTag::Plain));
    }

    #[test]
    fn test_level_clamped_to_max() {
        let mut sizes: Vec<Line> = (0..8)
            .map(|i| line("Rung", 30.0 - i as f32 * 2.0, 740.0 - i as f32 * 20.0))
            .collect();
        for i in 0..6 {
            sizes.push(line("Body text for the modal.", 10.0, 500.0 - i as f32 * 14.0));
        }
        let stats = stats_for(&sizes);
        let mut page = page_of(sizes);
        classify_headings(&mut page, &stats, &HeadingConfig::default());

        let deepest = page
            .lines
            .iter()
            .filter_map(|l| match l.tag {
                LineTag::Heading(level) => Some(level),
                _ => None,
            })
            .max();
        assert_eq!(deepest, Some(6));
    }
}
