//! Document-wide text statistics.
//!
//! Every later heuristic measures against these values, so the full
//! document must pass through [`GlobalStats::compute`] before any
//! classifier runs.

use crate::model::Page;
use std::collections::HashMap;
use std::hash::Hash;

/// Modal text metrics for a whole document.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    /// Most common text height (font size) in points
    pub modal_height: f32,
    /// Most common font resource, when any font resolved
    pub modal_font: Option<String>,
    /// Most common distance between adjacent baselines
    pub modal_line_distance: f32,
    /// Distinct heights above the modal height, largest first.
    /// Position in this ladder decides the heading level.
    pub heading_sizes: Vec<f32>,
}

impl GlobalStats {
    /// Single pass over every span of every page. Histogram ties break
    /// in favor of the value observed first.
    pub fn compute(pages: &[Page]) -> Self {
        let mut heights = Histogram::new();
        let mut fonts = Histogram::new();
        let mut distances = Histogram::new();

        for page in pages {
            let mut baselines: Vec<i32> = Vec::new();
            for span in &page.spans {
                if span.is_blank() {
                    continue;
                }
                heights.add(size_key(span.font_size));
                if let Some(font) = &span.font_id {
                    fonts.add(font.clone());
                }
                let baseline = size_key(span.y);
                if !baselines.contains(&baseline) {
                    baselines.push(baseline);
                }
            }
            baselines.sort_unstable_by(|a, b| b.cmp(a));
            for pair in baselines.windows(2) {
                let gap = pair[0] - pair[1];
                if gap > 1 {
                    distances.add(gap);
                }
            }
        }

        let modal_height = heights.modal().map(from_size_key).unwrap_or(12.0);
        let modal_line_distance = distances
            .modal()
            .map(from_size_key)
            .unwrap_or(modal_height * 1.2);

        // Heights noticeably above the modal height form the heading
        // ladder, largest first.
        let mut heading_sizes: Vec<f32> = heights
            .keys()
            .map(from_size_key)
            .filter(|&h| h > modal_height + 0.5)
            .collect();
        heading_sizes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            modal_height,
            modal_font: fonts.modal(),
            modal_line_distance,
            heading_sizes,
        }
    }
}

fn size_key(value: f32) -> i32 {
    (value * 10.0).round() as i32
}

fn from_size_key(key: i32) -> f32 {
    key as f32 / 10.0
}

/// Frequency counter remembering insertion order for tie-breaking.
struct Histogram<K> {
    counts: HashMap<K, usize>,
    order: Vec<K>,
}

impl<K: Eq + Hash + Clone> Histogram<K> {
    fn new() -> Self {
        Self {
            counts: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn add(&mut self, key: K) {
        let count = self.counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            self.order.push(key);
        }
        *count += 1;
    }

    /// Most frequent key; the first-seen key wins a tie.
    fn modal(&self) -> Option<K> {
        let mut best: Option<&K> = None;
        let mut best_count = 0;
        for key in &self.order {
            let count = self.counts[key];
            if count > best_count {
                best = Some(key);
                best_count = count;
            }
        }
        best.cloned()
    }

    fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().cloned()
    }
}
