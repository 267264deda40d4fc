//! Running header and footer removal.
//!
//! Lines that repeat on a majority of pages at the same vertical band
//! are furniture, not content. Page numbers vary per page, so digits
//! are stripped before comparing.

use crate::layout::item::{LineTag, PageLines};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RepetitionConfig {
    /// Documents shorter than this are never stripped
    pub min_pages: usize,
    /// Fraction of pages a line must appear on to count as furniture
    pub majority: f32,
    /// Vertical band size as a fraction of page height
    pub band_ratio: f32,
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            min_pages: 3,
            majority: 0.5,
            band_ratio: 0.015,
        }
    }
}

/// Remove lines repeating across pages in the same vertical band.
pub fn remove_repeated_lines(pages: &mut [PageLines], config: &RepetitionConfig) {
    if pages.len() < config.min_pages {
        return;
    }
    let threshold = (pages.len() as f32 * config.majority).floor() as usize;

    // signature -> (page index, band) occurrences. Lines already claimed
    // by table detection stay put; a header repeating under a continued
    // table is content.
    let mut occurrences: HashMap<String, Vec<(usize, i32)>> = HashMap::new();
    for (index, page) in pages.iter().enumerate() {
        for line in &page.lines {
            if line.tag != LineTag::Plain {
                continue;
            }
            occurrences
                .entry(line_signature(&line.text))
                .or_default()
                .push((index, band_of(line.y, page.height, config.band_ratio)));
        }
    }

    let mut removed = 0usize;
    for page in pages.iter_mut() {
        let height = page.height;
        page.lines.retain(|line| {
            if line.tag != LineTag::Plain {
                return true;
            }
            let band = band_of(line.y, height, config.band_ratio);
            let hits = occurrences
                .get(&line_signature(&line.text))
                .map(|seen| distinct_pages_near(seen, band))
                .unwrap_or(0);
            let keep = hits <= threshold;
            if !keep {
                removed += 1;
            }
            keep
        });
    }
    if removed > 0 {
        log::debug!("removed {} repeated header/footer lines", removed);
    }
}

/// Digit-stripped, whitespace-collapsed comparison key.
/// Blank lines never survive compaction, so an empty key means the line
/// was nothing but digits; bare page numbers in one band all share it.
fn line_signature(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !c.is_ascii_digit()).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn band_of(y: f32, page_height: f32, band_ratio: f32) -> i32 {
    let band = (page_height * band_ratio).max(1.0);
    (y / band).round() as i32
}

/// Count distinct pages whose occurrence sits within one band of `band`.
fn distinct_pages_near(seen: &[(usize, i32)], band: i32) -> usize {
    let mut pages: Vec<usize> = Vec::new();
    for &(page, other) in seen {
        if (other - band).abs() <= 1 && !pages.contains(&page) {
            pages.push(page);
        }
    }
    pages.len()
}
