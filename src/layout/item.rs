//! Working values threaded through the layout pipeline.
//!
//! [`Line`]s are built once by compaction and then mutated in place by
//! the successive classification stages. They are never shared between
//! pages.

use crate::model::{ListMarker, TextSpan};
use std::collections::HashMap;

/// Classification assigned to a line by the pipeline stages.
///
/// Every line starts as `Plain`; classifiers only ever refine `Plain`
/// lines, so the first stage to claim a line wins.
#[derive(Debug, Clone, PartialEq)]
pub enum LineTag {
    /// Unclassified body text
    Plain,
    /// A table row; `header` marks the first row of a table
    TableRow { header: bool },
    /// A heading at the given level (1-6)
    Heading(u8),
    /// A list item with its nesting level and marker
    ListItem { level: u8, marker: ListMarker },
    /// A table-of-contents entry (title and page number in `cells`)
    TocEntry,
    /// A footnote body labeled by its numeral
    FootnoteBody { label: String },
}

/// One visual line of text: spans sharing a baseline, ordered by X.
#[derive(Debug, Clone)]
pub struct Line {
    /// Member spans, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Leftmost X position
    pub x: f32,
    /// Baseline (average of member baselines)
    pub y: f32,
    /// Dominant font size, by character count
    pub height: f32,
    /// Dominant font, by character count
    pub font_id: Option<String>,
    /// Joined text with inferred inter-span spaces
    pub text: String,
    /// Current classification
    pub tag: LineTag,
    /// Column cell texts, filled for table rows and TOC entries
    pub cells: Vec<String>,
}

impl Line {
    /// Build a line from spans on one baseline.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        let y = if spans.is_empty() {
            0.0
        } else {
            spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32
        };
        let x = spans.first().map(|s| s.x).unwrap_or(0.0);
        let height = dominant_size(&spans);
        let font_id = dominant_font(&spans);
        let text = join_spans(&spans);

        Self {
            spans,
            x,
            y,
            height,
            font_id,
            text,
            tag: LineTag::Plain,
            cells: Vec::new(),
        }
    }

    /// Rebuild the joined text after span mutation.
    pub fn refresh_text(&mut self) {
        self.text = join_spans(&self.spans);
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_table_row(&self) -> bool {
        matches!(self.tag, LineTag::TableRow { .. })
    }

    /// Average character width across the line's spans.
    pub fn avg_char_width(&self) -> f32 {
        let chars: usize = self.spans.iter().map(|s| s.text.chars().count()).sum();
        let width: f32 = self.spans.iter().map(|s| s.width).sum();
        if chars > 0 && width > 0.0 {
            width / chars as f32
        } else {
            self.height * 0.5
        }
    }
}

/// One page's lines in top-to-bottom reading order.
#[derive(Debug, Clone)]
pub struct PageLines {
    /// Page number (1-indexed, matching the model page)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Lines, ordered by descending Y
    pub lines: Vec<Line>,
}

/// Dominant font size by character count; ties go to the size seen first.
fn dominant_size(spans: &[TextSpan]) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    let mut order: Vec<i32> = Vec::new();
    for span in spans {
        let key = (span.font_size * 10.0).round() as i32;
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += span.text.chars().count().max(1);
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
    best.map(|k| k as f32 / 10.0).unwrap_or(0.0)
}

fn dominant_font(spans: &[TextSpan]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for span in spans {
        let Some(font) = span.font_id.as_deref() else {
            continue;
        };
        let count = counts.entry(font).or_insert(0);
        if *count == 0 {
            order.push(font);
        }
        *count += span.text.chars().count().max(1);
    }
    let mut best: Option<&str> = None;
    let mut best_count = 0;
    for &font in &order {
        let count = counts[font];
        if count > best_count {
            best = Some(font);
            best_count = count;
        }
    }
    best.map(str::to_string)
}

/// Join span texts, inserting a space where the X gap between adjacent
/// spans exceeds 20% of the average character width. No space is
/// inserted between characters of scripts written without word spaces.
pub fn join_spans(spans: &[TextSpan]) -> String {
    let mut result = String::new();
    for (i, span) in spans.iter().enumerate() {
        if i > 0 && needs_space(&spans[i - 1], span) {
            result.push(' ');
        }
        result.push_str(&span.text);
    }
    result
}

/// Decide whether a space belongs between two adjacent spans.
pub(crate) fn needs_space(prev: &TextSpan, span: &TextSpan) -> bool {
    let gap = span.x - prev.right();

    let chars = span.text.chars().count();
    let avg_char_width = if chars > 0 && span.width > 0.0 {
        span.width / chars as f32
    } else {
        span.font_size * 0.5
    };

    let prev_last = prev.text.chars().last();
    let curr_first = span.text.chars().next();
    let both_spaceless = prev_last.map(is_spaceless_script_char).unwrap_or(false)
        && curr_first.map(is_spaceless_script_char).unwrap_or(false);
    let already_spaced = prev.text.ends_with(' ')
        || prev.text.ends_with('\u{00A0}')
        || span.text.starts_with(' ')
        || span.text.starts_with('\u{00A0}');

    gap > avg_char_width * 0.2 && !both_spaceless && !already_spaced
}

/// Check if a character belongs to a script written without word spaces.
/// Chinese and Japanese qualify; Korean spaces its words.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x309F).contains(&code)
        || (0x30A0..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}
