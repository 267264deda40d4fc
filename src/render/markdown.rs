//! Markdown rendering.
//!
//! Blocks render into self-contained segments joined by blank lines,
//! so the output never carries trailing whitespace and rendering the
//! same document twice produces identical bytes. Footnote definitions
//! collect as they are encountered and render at the very end.

use crate::error::Result;
use crate::model::{Block, Document, List, ListMarker, Paragraph, Table};

use super::{ExtractionStats, RenderOptions, RenderResult};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Convert a document to Markdown with extraction statistics.
pub fn to_markdown_with_stats(doc: &Document, options: &RenderOptions) -> Result<RenderResult> {
    let mut options = options.clone();
    options.collect_stats = true;
    MarkdownRenderer::new(options).render_with_stats(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
    stats: ExtractionStats,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            stats: ExtractionStats::new(),
        }
    }

    /// Render a document to Markdown.
    pub fn render(mut self, doc: &Document) -> Result<String> {
        self.render_internal(doc)
    }

    /// Render a document to Markdown along with statistics.
    pub fn render_with_stats(mut self, doc: &Document) -> Result<RenderResult> {
        self.options.collect_stats = true;
        let content = self.render_internal(doc)?;
        self.stats.count_text(&content);
        Ok(RenderResult::new(content, doc.metadata.clone(), self.stats))
    }

    fn render_internal(&mut self, doc: &Document) -> Result<String> {
        let blocks = merge_page_blocks(doc, self.options.collect_stats, &mut self.stats);

        let mut segments: Vec<String> = Vec::new();
        let mut footnotes: Vec<(String, String)> = Vec::new();

        for block in &blocks {
            match block {
                Block::Footnote { label, content } => {
                    if self.options.collect_stats {
                        self.stats.add_footnote();
                    }
                    footnotes.push((label.clone(), self.inline_text(content)));
                }
                other => {
                    if let Some(segment) = self.render_block(other, doc) {
                        segments.push(segment);
                    }
                }
            }
        }
        for (label, text) in footnotes {
            segments.push(format!("[^{}]: {}", label, text));
        }

        let mut output = String::new();
        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
            if !segments.is_empty() {
                output.push('\n');
            }
        }
        if !segments.is_empty() {
            output.push_str(&segments.join("\n\n"));
            output.push('\n');
        }
        Ok(output)
    }

    fn render_block(&mut self, block: &Block, doc: &Document) -> Option<String> {
        match block {
            Block::Heading { level, content } => {
                if self.options.collect_stats {
                    self.stats.add_heading();
                }
                let text = content.plain_text();
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                let level = (*level).min(self.options.max_heading_level).max(1);
                Some(format!("{} {}", "#".repeat(level as usize), text))
            }
            Block::Paragraph(p) => {
                let text = self.inline_text(p);
                if text.is_empty() {
                    return None;
                }
                if self.options.collect_stats {
                    self.stats.add_paragraph();
                }
                Some(text)
            }
            Block::List(list) => {
                if self.options.collect_stats {
                    self.stats.list_item_count += list.items.len() as u32;
                }
                self.render_list(list)
            }
            Block::Table(table) => {
                if self.options.collect_stats {
                    self.stats.add_table();
                }
                render_table(table)
            }
            Block::Image { resource_id, alt_text } => {
                if self.options.collect_stats {
                    self.stats.add_image();
                }
                let path = doc
                    .get_resource(resource_id)
                    .map(|r| r.suggested_filename(resource_id))
                    .unwrap_or_else(|| resource_id.clone());
                Some(format!(
                    "![{}]({}{})",
                    alt_text.as_deref().unwrap_or(""),
                    self.options.image_path_prefix,
                    path
                ))
            }
            // Collected by the caller.
            Block::Footnote { .. } => None,
        }
    }

    fn render_list(&self, list: &List) -> Option<String> {
        if list.is_empty() {
            return None;
        }
        let mut lines = Vec::with_capacity(list.items.len());
        for item in &list.items {
            let indent = "  ".repeat(item.level as usize);
            let marker = match &item.marker {
                ListMarker::Bullet => self.options.list_marker.to_string(),
                ListMarker::Number(ordinal) => format!("{}.", ordinal_body(ordinal)),
            };
            lines.push(format!(
                "{}{} {}",
                indent,
                marker,
                self.inline_text(&item.content)
            ));
        }
        Some(lines.join("\n"))
    }

    /// Flatten a paragraph's runs, wrapping emphasis when enabled.
    /// Edge whitespace moves outside the markers so `** bold**` can
    /// never appear.
    fn inline_text(&self, paragraph: &Paragraph) -> String {
        let mut out = String::new();
        for run in &paragraph.runs {
            if !self.options.preserve_formatting || !run.style.has_styling() {
                out.push_str(&run.text);
                continue;
            }
            let (lead, core, trail) = split_edge_whitespace(&run.text);
            if core.is_empty() {
                out.push_str(&run.text);
                continue;
            }
            let marker = match (run.style.bold, run.style.italic) {
                (true, true) => "***",
                (true, false) => "**",
                (false, true) => "*",
                (false, false) => "",
            };
            out.push_str(lead);
            out.push_str(marker);
            out.push_str(core);
            out.push_str(marker);
            out.push_str(trail);
        }
        out.trim().to_string()
    }
}

/// Collect blocks from non-blank pages, merging a table that continues
/// onto the next page with a repeated header into one table.
fn merge_page_blocks(doc: &Document, collect_stats: bool, stats: &mut ExtractionStats) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::new();
    for page in &doc.pages {
        if page.is_blank() {
            continue;
        }
        if collect_stats {
            stats.add_page();
        }
        let mut first = true;
        for block in &page.blocks {
            if std::mem::take(&mut first) {
                if let (Block::Table(incoming), Some(Block::Table(open))) =
                    (block, merged.last_mut())
                {
                    if open.header_rows > 0
                        && incoming.header_rows > 0
                        && open.header_signature() == incoming.header_signature()
                    {
                        for row in incoming.body() {
                            open.add_row(row.clone());
                        }
                        continue;
                    }
                }
            }
            merged.push(block.clone());
        }
    }
    merged
}

fn render_table(table: &Table) -> Option<String> {
    let columns = table.column_count();
    if columns == 0 {
        return None;
    }

    let mut lines = Vec::with_capacity(table.row_count() + 1);
    for (index, row) in table.rows.iter().enumerate() {
        let mut cells: Vec<String> = row.cells.iter().map(|c| escape_cell(c)).collect();
        cells.resize(columns, String::new());
        lines.push(format!("| {} |", cells.join(" | ")));

        // Markdown requires the separator after the first row whether
        // or not that row is a semantic header.
        if index == 0 {
            lines.push(format!("| {} |", vec!["---"; columns].join(" | ")));
        }
    }
    Some(lines.join("\n"))
}

/// Pipes would break the row; newlines collapse to spaces.
fn escape_cell(text: &str) -> String {
    text.replace('\n', " ").replace('|', "\\|").trim().to_string()
}

/// Ordinal label without its bracketing, ready for a `.` suffix.
fn ordinal_body(ordinal: &str) -> &str {
    ordinal.trim_matches(|c| c == '(' || c == ')' || c == '.' || c == ' ')
}

fn split_edge_whitespace(text: &str) -> (&str, &str, &str) {
    let trimmed = text.trim_start();
    let start = text.len() - trimmed.len();
    let core = trimmed.trim_end();
    let end = start + core.len();
    (&text[..start], core, &text[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Page, TableRow, TextRun};

    fn single_page(blocks: Vec<Block>) -> Document {
        let mut doc = Document::new();
        let mut page = Page::letter(1);
        for block in blocks {
            page.add_block(block);
        }
        doc.add_page(page);
        doc
    }

    fn simple_table(header: &[&str], body: &[&[&str]]) -> Table {
        let mut table = Table::with_header(1);
        table.add_row(TableRow::from_strings(header.to_vec()));
        for row in body {
            table.add_row(TableRow::from_strings(row.to_vec()));
        }
        table
    }

    // ==================== Exact shapes ====================

    #[test]
    fn test_heading_and_paragraph_exact_output() {
        let doc = single_page(vec![
            Block::heading(1, "Title"),
            Block::paragraph("Body text."),
        ]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "# Title\n\nBody text.\n");
    }

    #[test]
    fn test_table_exact_output() {
        let doc = single_page(vec![Block::Table(simple_table(&["A", "B"], &[&["1", "2"]]))]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "| A | B |\n| --- | --- |\n| 1 | 2 |\n");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let doc = single_page(vec![
            Block::heading(2, "Section"),
            Block::paragraph("Alpha."),
            Block::Table(simple_table(&["K", "V"], &[&["a", "1"]])),
        ]);
        let first = to_markdown(&doc, &RenderOptions::default()).unwrap();
        let second = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    // ==================== Pages ====================

    #[test]
    fn test_blank_pages_dropped() {
        let mut doc = Document::new();
        let mut first = Page::letter(1);
        first.add_block(Block::paragraph("First."));
        doc.add_page(first);
        doc.add_page(Page::letter(2));
        let mut third = Page::letter(3);
        third.add_block(Block::paragraph("Second."));
        doc.add_page(third);

        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "First.\n\nSecond.\n");
    }

    #[test]
    fn test_cross_page_table_merges_to_one_header() {
        let mut doc = Document::new();
        let mut first = Page::letter(1);
        first.add_block(Block::Table(simple_table(
            &["Name", "Age"],
            &[&["Alice", "30"]],
        )));
        doc.add_page(first);
        let mut second = Page::letter(2);
        second.add_block(Block::Table(simple_table(
            &["Name", "Age"],
            &[&["Bob", "25"]],
        )));
        doc.add_page(second);

        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output.matches("| Name | Age |").count(), 1);
        assert_eq!(output.matches("| --- | --- |").count(), 1);
        assert!(output.contains("| Alice | 30 |"));
        assert!(output.contains("| Bob | 25 |"));
    }

    #[test]
    fn test_different_headers_stay_separate() {
        let mut doc = Document::new();
        let mut first = Page::letter(1);
        first.add_block(Block::Table(simple_table(&["A", "B"], &[&["1", "2"]])));
        doc.add_page(first);
        let mut second = Page::letter(2);
        second.add_block(Block::Table(simple_table(&["C", "D"], &[&["3", "4"]])));
        doc.add_page(second);

        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output.matches("| --- | --- |").count(), 2);
    }

    #[test]
    fn test_headerless_tables_never_merge() {
        let mut doc = Document::new();
        for n in 1..=2 {
            let mut page = Page::letter(n);
            let mut table = Table::new();
            table.add_row(TableRow::from_strings(["[AB1]", "entry"]));
            page.add_block(Block::Table(table));
            doc.add_page(page);
        }
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output.matches("| --- | --- |").count(), 2);
    }

    // ==================== Inline styling ====================

    #[test]
    fn test_emphasis_markers() {
        let mut paragraph = Paragraph::new();
        paragraph.add_text("Plain then ");
        paragraph.add_run(TextRun::bold("bold"));
        let doc = single_page(vec![Block::Paragraph(paragraph)]);

        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "Plain then **bold**\n");

        let doc2 = single_page(vec![Block::Paragraph(Paragraph::from_runs(vec![
            TextRun::new("Plain then "),
            TextRun::bold("bold"),
        ]))]);
        let plain = to_markdown(&doc2, &RenderOptions::new().with_formatting(false)).unwrap();
        assert_eq!(plain, "Plain then bold\n");
    }

    #[test]
    fn test_emphasis_whitespace_stays_outside_markers() {
        let doc = single_page(vec![Block::Paragraph(Paragraph::from_runs(vec![
            TextRun::bold("bold "),
            TextRun::new("after"),
        ]))]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "**bold** after\n");
    }

    // ==================== Lists ====================

    #[test]
    fn test_list_rendering() {
        let mut list = List::new();
        list.add_item(crate::model::ListItem::bullet(0, "First"));
        list.add_item(crate::model::ListItem::bullet(1, "Nested"));
        list.add_item(crate::model::ListItem::numbered(0, "3.", "Third"));
        let doc = single_page(vec![Block::List(list)]);

        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "- First\n  - Nested\n3. Third\n");
    }

    #[test]
    fn test_parenthesized_ordinal_normalized() {
        let mut list = List::new();
        list.add_item(crate::model::ListItem::numbered(0, "(2)", "Item"));
        let doc = single_page(vec![Block::List(list)]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "2. Item\n");
    }

    // ==================== Footnotes, images, frontmatter ====================

    #[test]
    fn test_footnotes_render_at_end() {
        let doc = single_page(vec![
            Block::paragraph("The claim[^1] holds."),
            Block::Footnote {
                label: "1".to_string(),
                content: Paragraph::with_text("Proof in appendix."),
            },
            Block::paragraph("Closing."),
        ]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(
            output,
            "The claim[^1] holds.\n\nClosing.\n\n[^1]: Proof in appendix.\n"
        );
    }

    #[test]
    fn test_image_uses_resource_filename() {
        let mut doc = single_page(vec![Block::image("img-1")]);
        doc.add_resource(
            "img-1".to_string(),
            crate::model::Resource::jpeg(vec![0xFF, 0xD8, 0xFF]),
        );
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "![](img-1.jpg)\n");

        let prefixed = to_markdown(&doc, &RenderOptions::new().with_image_prefix("./images/"))
            .unwrap();
        assert_eq!(prefixed, "![](./images/img-1.jpg)\n");
    }

    #[test]
    fn test_frontmatter_prepended() {
        let mut doc = single_page(vec![Block::paragraph("Body.")]);
        doc.metadata.title = Some("Report".to_string());
        doc.metadata.pdf_version = "1.7".to_string();

        let output = to_markdown(&doc, &RenderOptions::new().with_frontmatter(true)).unwrap();
        assert!(output.starts_with("---\n"));
        assert!(output.contains("title: \"Report\""));
        assert!(output.ends_with("---\n\nBody.\n"));
    }

    // ==================== Edge cases ====================

    #[test]
    fn test_heading_level_clamped() {
        let doc = single_page(vec![Block::heading(3, "Deep")]);
        let output = to_markdown(&doc, &RenderOptions::new().with_max_heading(2)).unwrap();
        assert_eq!(output, "## Deep\n");
    }

    #[test]
    fn test_pipe_escaped_in_cells() {
        let mut table = Table::with_header(1);
        table.add_row(TableRow::from_strings(["a|b", "c"]));
        table.add_row(TableRow::from_strings(["1", "2"]));
        let doc = single_page(vec![Block::Table(table)]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert!(output.contains("| a\\|b | c |"));
    }

    #[test]
    fn test_ragged_rows_padded() {
        let mut table = Table::with_header(1);
        table.add_row(TableRow::from_strings(["A", "B", "C"]));
        table.add_row(TableRow::from_strings(["1"]));
        let doc = single_page(vec![Block::Table(table)]);
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert!(output.contains("| 1 |  |  |"));
    }

    #[test]
    fn test_empty_document_renders_empty() {
        let doc = Document::new();
        let output = to_markdown(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(output, "");
    }

    #[test]
    fn test_stats_collected() {
        let doc = single_page(vec![
            Block::heading(1, "Title"),
            Block::paragraph("Body text."),
            Block::Table(simple_table(&["A"], &[&["1"]])),
        ]);
        let result = to_markdown_with_stats(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(result.stats.heading_count, 1);
        assert_eq!(result.stats.paragraph_count, 1);
        assert_eq!(result.stats.table_count, 1);
        assert_eq!(result.stats.page_count, 1);
        assert!(result.stats.word_count > 0);
    }
}
