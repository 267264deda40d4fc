//! Table row detection.
//!
//! Three independent strategies classify lines as table rows: column
//! gaps confirmed by a following aligned line, recurring bracketed
//! reference tokens, and configured known-header texts for tables that
//! resume after a page break. Each strategy is a pure function over an
//! explicit [`TableConfig`] returning a [`Score`]; ambiguous lines stay
//! unclassified.
//!
//! Rows are only classified here. Merging a table that spans pages
//! happens at render time.

use crate::layout::item::{join_spans, Line, LineTag, PageLines};
use crate::layout::lists::{is_bullet_marker, is_number_marker};
use crate::model::TextSpan;

/// Thresholds for table row classification.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Fewest columns a table row can have
    pub min_columns: usize,
    /// Most columns before a line is treated as word-level noise
    pub max_columns: usize,
    /// Gap wider than this many average character widths splits cells
    pub column_gap_factor: f32,
    /// X distance in points within which cell starts count as aligned
    pub column_tolerance: f32,
    /// Confidence below which a candidate stays unclassified
    pub min_confidence: f32,
    /// Consecutive reference-token lines needed to claim a run
    pub reference_min_run: usize,
    /// Header texts that mark a table resuming after a page break
    pub known_headers: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_columns: 2,
            max_columns: 8,
            column_gap_factor: 2.0,
            column_tolerance: 5.0,
            min_confidence: 0.5,
            reference_min_run: 2,
            known_headers: Vec::new(),
        }
    }
}

/// Outcome of one scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Whether the strategy claims the candidate
    pub matched: bool,
    /// Supporting evidence, 0.0 to 1.0
    pub confidence: f32,
}

impl Score {
    fn no() -> Self {
        Self {
            matched: false,
            confidence: 0.0,
        }
    }

    fn with_confidence(confidence: f32, floor: f32) -> Self {
        Self {
            matched: confidence >= floor,
            confidence,
        }
    }
}

/// A gap-delimited cell candidate within a line.
#[derive(Debug, Clone)]
pub struct CellSpan {
    /// Left edge of the cell
    pub x: f32,
    /// Joined cell text
    pub text: String,
}

/// Split a line into cell candidates at gaps wider than the column
/// threshold.
pub fn split_cells(line: &Line, config: &TableConfig) -> Vec<CellSpan> {
    let threshold = (line.avg_char_width() * config.column_gap_factor).max(config.column_tolerance);

    let mut cells: Vec<CellSpan> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    for span in &line.spans {
        if let Some(prev) = current.last() {
            if span.x - prev.right() >= threshold {
                cells.push(finish_cell(std::mem::take(&mut current)));
            }
        }
        current.push(span.clone());
    }
    if !current.is_empty() {
        cells.push(finish_cell(current));
    }
    cells
}

fn finish_cell(spans: Vec<TextSpan>) -> CellSpan {
    CellSpan {
        x: spans.first().map(|s| s.x).unwrap_or(0.0),
        text: join_spans(&spans).trim().to_string(),
    }
}

// ==================== Scoring strategies ====================

/// Header-gap strategy: a line with enough gap-separated cells whose
/// column positions repeat on a following line.
pub fn score_header_gap(
    header: &[CellSpan],
    following: &[&[CellSpan]],
    config: &TableConfig,
) -> Score {
    if header.len() < config.min_columns || header.len() > config.max_columns {
        return Score::no();
    }
    let grid: Vec<f32> = header.iter().map(|c| c.x).collect();
    let best = following
        .iter()
        .filter(|row| row.len() >= config.min_columns)
        .map(|row| alignment_ratio(row, &grid, config.column_tolerance))
        .fold(0.0f32, f32::max);
    Score::with_confidence(best, config.min_confidence)
}

/// Reference-style strategy: consecutive lines opening with a short
/// bracketed token (`[XY1]`) at the same X offset.
pub fn score_reference_run(rows: &[&[CellSpan]], config: &TableConfig) -> Score {
    if rows.len() < config.reference_min_run {
        return Score::no();
    }
    let Some(first) = rows.first().and_then(|r| r.first()) else {
        return Score::no();
    };
    let anchor_x = first.x;
    let matching = rows
        .iter()
        .filter(|row| {
            row.first()
                .map(|cell| {
                    is_reference_token(&cell.text)
                        && (cell.x - anchor_x).abs() <= config.column_tolerance
                })
                .unwrap_or(false)
        })
        .count();
    let confidence = matching as f32 / rows.len() as f32;
    Score::with_confidence(confidence, 1.0)
}

/// Known-header strategy: the line's whole text matches a configured
/// header string.
pub fn score_known_header(text: &str, config: &TableConfig) -> Score {
    let normalized = normalize_header(text);
    let matched = !normalized.is_empty()
        && config
            .known_headers
            .iter()
            .any(|h| normalize_header(h) == normalized);
    Score {
        matched,
        confidence: if matched { 1.0 } else { 0.0 },
    }
}

/// `[XY12]`-style token: bracketed, short, alphanumeric, digit-final.
pub fn is_reference_token(text: &str) -> bool {
    let t = text.trim();
    let Some(inner) = t.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
        return false;
    };
    !inner.is_empty()
        && inner.len() <= 6
        && inner.chars().all(|c| c.is_ascii_alphanumeric())
        && inner.ends_with(|c: char| c.is_ascii_digit())
}

fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn alignment_ratio(cells: &[CellSpan], grid: &[f32], tolerance: f32) -> f32 {
    if cells.is_empty() || grid.is_empty() {
        return 0.0;
    }
    let aligned = cells
        .iter()
        .filter(|c| grid.iter().any(|&g| (c.x - g).abs() <= tolerance))
        .count();
    aligned as f32 / cells.len() as f32
}

/// List rows masquerade as two-column tables when markers and item
/// texts land in separate cells.
fn looks_like_list(rows: &[&[CellSpan]]) -> bool {
    if rows.is_empty() {
        return false;
    }
    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        if let Some(first) = row.first() {
            if is_bullet_marker(&first.text) {
                bullets += 1;
            } else if is_number_marker(&first.text) {
                numbers += 1;
            }
        }
    }
    let bullet_ratio = bullets as f32 / rows.len() as f32;
    let marker_ratio = (bullets + numbers) as f32 / rows.len() as f32;
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    bullet_ratio >= 0.5 || (columns <= 2 && marker_ratio >= 0.5)
}

// ==================== Driver ====================

/// Classify table rows in place.
pub fn detect_tables(page: &mut PageLines, config: &TableConfig) {
    let splits: Vec<Vec<CellSpan>> = page
        .lines
        .iter()
        .map(|line| split_cells(line, config))
        .collect();

    let mut i = 0;
    while i < page.lines.len() {
        if page.lines[i].tag != LineTag::Plain {
            i += 1;
            continue;
        }
        // Reference runs first: they are the more specific signal and
        // their rows carry no header.
        if let Some(end) = match_reference_run(i, &splits, config) {
            apply_rows(page, &splits, i, end, false, config);
            i = end;
            continue;
        }
        if let Some(end) = match_header_gap(i, &splits, config) {
            apply_rows(page, &splits, i, end, true, config);
            i = end;
            continue;
        }
        if score_known_header(&page.lines[i].text, config).matched {
            if let Some(end) = extend_known_header(i, &splits, config) {
                apply_rows(page, &splits, i, end, true, config);
                i = end;
                continue;
            }
        }
        i += 1;
    }
}

/// Longest run of rows starting at `start` that align with its grid,
/// when the header-gap strategy accepts the start line.
fn match_header_gap(start: usize, splits: &[Vec<CellSpan>], config: &TableConfig) -> Option<usize> {
    let header = &splits[start];
    if header.len() < config.min_columns || header.len() > config.max_columns {
        return None;
    }
    let grid: Vec<f32> = header.iter().map(|c| c.x).collect();

    let mut end = start + 1;
    while end < splits.len() {
        let row = &splits[end];
        if row.len() < config.min_columns
            || alignment_ratio(row, &grid, config.column_tolerance) < config.min_confidence
        {
            break;
        }
        end += 1;
    }
    if end - start < 2 {
        return None;
    }

    let following: Vec<&[CellSpan]> = splits[start + 1..end].iter().map(Vec::as_slice).collect();
    let score = score_header_gap(header, &following, config);
    if !score.matched {
        return None;
    }
    let run: Vec<&[CellSpan]> = splits[start..end].iter().map(Vec::as_slice).collect();
    if looks_like_list(&run) {
        log::debug!("rows at line {start} look like a list, leaving unclassified");
        return None;
    }
    log::debug!(
        "header-gap table at lines {start}..{end} (confidence {:.2})",
        score.confidence
    );
    Some(end)
}

fn match_reference_run(
    start: usize,
    splits: &[Vec<CellSpan>],
    config: &TableConfig,
) -> Option<usize> {
    let first = splits[start].first()?;
    if !is_reference_token(&first.text) {
        return None;
    }
    let anchor_x = first.x;
    let mut end = start;
    while end < splits.len() {
        let matches = splits[end]
            .first()
            .map(|cell| {
                is_reference_token(&cell.text)
                    && (cell.x - anchor_x).abs() <= config.column_tolerance
            })
            .unwrap_or(false);
        if !matches {
            break;
        }
        end += 1;
    }
    let run: Vec<&[CellSpan]> = splits[start..end].iter().map(Vec::as_slice).collect();
    let score = score_reference_run(&run, config);
    if !score.matched {
        return None;
    }
    log::debug!("reference-style table at lines {start}..{end}");
    Some(end)
}

fn extend_known_header(
    start: usize,
    splits: &[Vec<CellSpan>],
    config: &TableConfig,
) -> Option<usize> {
    let grid: Vec<f32> = if splits[start].len() >= config.min_columns {
        splits[start].iter().map(|c| c.x).collect()
    } else {
        let next = splits.get(start + 1)?;
        if next.len() < config.min_columns {
            return None;
        }
        next.iter().map(|c| c.x).collect()
    };

    let mut end = start + 1;
    while end < splits.len() {
        let row = &splits[end];
        if row.len() < config.min_columns
            || alignment_ratio(row, &grid, config.column_tolerance) < config.min_confidence
        {
            break;
        }
        end += 1;
    }
    if end - start < 2 {
        return None;
    }
    log::debug!("known-header table continuation at lines {start}..{end}");
    Some(end)
}

/// Tag the run's lines as rows and fill their cells against the run's
/// column grid.
fn apply_rows(
    page: &mut PageLines,
    splits: &[Vec<CellSpan>],
    start: usize,
    end: usize,
    first_is_header: bool,
    config: &TableConfig,
) {
    let grid: Vec<f32> = if splits[start].len() >= config.min_columns {
        splits[start].iter().map(|c| c.x).collect()
    } else {
        splits[start + 1].iter().map(|c| c.x).collect()
    };

    for index in start..end {
        let mut cells = vec![String::new(); grid.len()];
        for cell in &splits[index] {
            let column = nearest_column(cell.x, &grid);
            if cells[column].is_empty() {
                cells[column] = cell.text.clone();
            } else {
                cells[column].push(' ');
                cells[column].push_str(&cell.text);
            }
        }
        let line = &mut page.lines[index];
        line.cells = cells;
        line.tag = LineTag::TableRow {
            header: first_is_header && index == start,
        };
    }
}

fn nearest_column(x: f32, grid: &[f32]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, &gx) in grid.iter().enumerate() {
        let dist = (x - gx).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
