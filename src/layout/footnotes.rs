//! Footnote body and anchor resolution.
//!
//! Bodies sit in the bottom band of a page and open with a numeral,
//! either parenthesized or set small. Anchors are raised digit spans in
//! body text whose label matches a known body; they are rewritten to
//! `[^N]` so the renderer can emit Markdown footnote references.

use crate::layout::item::{Line, LineTag, PageLines};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct FootnoteConfig {
    /// Fraction of page height from the bottom that may hold bodies
    pub bottom_band: f32,
    /// Maximum marker size relative to the line's dominant size
    pub superscript_ratio: f32,
    /// Minimum baseline raise for an anchor, relative to line size
    pub raise_ratio: f32,
}

impl Default for FootnoteConfig {
    fn default() -> Self {
        Self {
            bottom_band: 0.25,
            superscript_ratio: 0.75,
            raise_ratio: 0.15,
        }
    }
}

/// Tag footnote bodies and rewrite matching anchors across all pages.
pub fn resolve_footnotes(pages: &mut [PageLines], config: &FootnoteConfig) {
    let mut labels: HashSet<String> = HashSet::new();

    for page in pages.iter_mut() {
        let band_top = page.height * config.bottom_band;
        for line in &mut page.lines {
            if line.tag != LineTag::Plain || line.is_blank() || line.y > band_top {
                continue;
            }
            if let Some((label, content)) = split_footnote_body(line, config) {
                line.tag = LineTag::FootnoteBody {
                    label: label.clone(),
                };
                line.text = content;
                labels.insert(label);
            }
        }
    }
    if labels.is_empty() {
        return;
    }

    for page in pages.iter_mut() {
        for line in &mut page.lines {
            if line.tag != LineTag::Plain {
                continue;
            }
            rewrite_anchors(line, &labels, config);
        }
    }
}

/// Split a body line into its label and remaining content.
fn split_footnote_body(line: &Line, config: &FootnoteConfig) -> Option<(String, String)> {
    let text = line.text.trim_start();

    // "(12) Note text" form.
    if let Some(rest) = text.strip_prefix('(') {
        if let Some((digits, content)) = rest.split_once(')') {
            if is_label(digits) && !content.trim().is_empty() {
                return Some((digits.to_string(), content.trim().to_string()));
            }
        }
    }

    // Leading small digit span, the superscript-style marker.
    let first = line.spans.first()?;
    let label = first.text.trim();
    if is_label(label) && first.font_size <= line.height * config.superscript_ratio {
        let content = text.strip_prefix(label)?.trim();
        if !content.is_empty() {
            return Some((label.to_string(), content.to_string()));
        }
    }
    None
}

/// Replace raised digit spans whose label has a body with `[^N]`.
fn rewrite_anchors(line: &mut Line, labels: &HashSet<String>, config: &FootnoteConfig) {
    let min_y = line.y + line.height * config.raise_ratio;
    let max_size = line.height * config.superscript_ratio;
    let mut changed = false;

    for span in &mut line.spans {
        let label = span.text.trim();
        if !is_label(label) || !labels.contains(label) {
            continue;
        }
        if span.font_size <= max_size && span.y >= min_y {
            span.text = format!("[^{}]", label);
            changed = true;
        }
    }
    if changed {
        line.refresh_text();
    }
}

fn is_label(text: &str) -> bool {
    !text.is_empty() && text.len() <= 3 && text.chars().all(|c| c.is_ascii_digit())
}
