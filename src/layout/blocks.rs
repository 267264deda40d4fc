//! Block assembly.
//!
//! Turns a page's classified lines into renderable [`Block`]s. Runs of
//! table rows, contents entries, and list items collapse into one block
//! each; headings and footnote bodies take one block per line; every
//! remaining plain line becomes its own paragraph so the renderer can
//! separate them with blank lines.

use crate::layout::item::{needs_space, Line, LineTag, PageLines};
use crate::model::{
    Block, ImagePlacement, List, ListItem, Paragraph, Table, TableRow, TextRun, TextStyle,
};

/// Assemble a page's blocks in reading order, interleaving images by
/// their top edge.
pub fn gather_blocks(page: &PageLines, images: &[ImagePlacement]) -> Vec<Block> {
    let mut placed: Vec<&ImagePlacement> = images.iter().collect();
    placed.sort_by(|a, b| {
        (b.y + b.height)
            .partial_cmp(&(a.y + a.height))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut blocks: Vec<Block> = Vec::new();
    let mut next_image = 0;
    let mut index = 0;

    while index < page.lines.len() {
        let line_y = page.lines[index].y;
        while next_image < placed.len() && placed[next_image].y + placed[next_image].height > line_y
        {
            blocks.push(Block::image(placed[next_image].resource_id.clone()));
            next_image += 1;
        }

        let line = &page.lines[index];
        match &line.tag {
            LineTag::TableRow { .. } => {
                let end = table_run_end(&page.lines, index);
                blocks.push(table_block(&page.lines[index..end]));
                index = end;
            }
            LineTag::TocEntry => {
                let start = index;
                while index < page.lines.len() && page.lines[index].tag == LineTag::TocEntry {
                    index += 1;
                }
                blocks.push(toc_block(&page.lines[start..index]));
            }
            LineTag::Heading(level) => {
                blocks.push(Block::heading(*level, line.text.clone()));
                index += 1;
            }
            LineTag::ListItem { .. } => {
                let start = index;
                while index < page.lines.len()
                    && matches!(page.lines[index].tag, LineTag::ListItem { .. })
                {
                    index += 1;
                }
                blocks.push(list_block(&page.lines[start..index]));
            }
            LineTag::FootnoteBody { label } => {
                blocks.push(Block::Footnote {
                    label: label.clone(),
                    content: Paragraph::with_text(line.text.clone()),
                });
                index += 1;
            }
            LineTag::Plain => {
                if !line.is_blank() {
                    blocks.push(Block::Paragraph(Paragraph::from_runs(styled_runs(line))));
                }
                index += 1;
            }
        }
    }

    while next_image < placed.len() {
        blocks.push(Block::image(placed[next_image].resource_id.clone()));
        next_image += 1;
    }
    blocks
}

/// End of the table-row run starting at `start`. A later header row
/// begins a new table, so the run stops in front of it.
fn table_run_end(lines: &[Line], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() {
        match lines[end].tag {
            LineTag::TableRow { header: false } => end += 1,
            _ => break,
        }
    }
    end
}

fn table_block(lines: &[Line]) -> Block {
    let header_rows = match lines.first().map(|l| &l.tag) {
        Some(LineTag::TableRow { header: true }) => 1,
        _ => 0,
    };
    let mut table = Table::with_header(header_rows);
    for line in lines {
        table.add_row(TableRow::new(line.cells.clone()));
    }
    Block::Table(table)
}

/// Contents entries render as a headerless two-column table.
fn toc_block(lines: &[Line]) -> Block {
    let mut table = Table::new();
    for line in lines {
        table.add_row(TableRow::new(line.cells.clone()));
    }
    Block::Table(table)
}

fn list_block(lines: &[Line]) -> Block {
    let mut list = List::new();
    for line in lines {
        if let LineTag::ListItem { level, marker } = &line.tag {
            list.add_item(ListItem {
                level: *level,
                marker: marker.clone(),
                content: Paragraph::with_text(line.text.clone()),
            });
        }
    }
    Block::List(list)
}

/// Split a line into styled runs, merging adjacent spans that share
/// emphasis. Inter-span spaces attach to the preceding run so emphasis
/// markers stay tight against their text.
fn styled_runs(line: &Line) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for (i, span) in line.spans.iter().enumerate() {
        if span.text.is_empty() {
            continue;
        }
        let space = i > 0 && needs_space(&line.spans[i - 1], span);
        match runs.last_mut() {
            Some(run) if run.style.bold == span.bold && run.style.italic == span.italic => {
                if space {
                    run.text.push(' ');
                }
                run.text.push_str(&span.text);
                continue;
            }
            Some(run) => {
                if space {
                    run.text.push(' ');
                }
            }
            None => {}
        }
        runs.push(TextRun {
            text: span.text.clone(),
            style: TextStyle {
                bold: span.bold,
                italic: span.italic,
                font_size: Some(span.font_size),
            },
        });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListMarker, TextSpan};

    fn plain(text: &str, y: f32) -> Line {
        Line::from_spans(vec![TextSpan::new(text, 72.0, y, 12.0)])
    }

    fn tagged(text: &str, y: f32, tag: LineTag) -> Line {
        let mut line = plain(text, y);
        line.tag = tag;
        line
    }

    fn row(cells: &[&str], y: f32, header: bool) -> Line {
        let mut line = tagged("", y, LineTag::TableRow { header });
        line.cells = cells.iter().map(|c| c.to_string()).collect();
        line
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
    fn test_each_plain_line_is_a_paragraph() {
        let page = page_of(vec![plain("First line.", 700.0), plain("Second line.", 686.0)]);
        let blocks = gather_blocks(&page, &[]);
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Paragraph(_)));
        assert_eq!(blocks[1].plain_text().as_deref(), Some("Second line."));
    }

    #[test]
    fn test_heading_takes_one_block() {
        let page = page_of(vec![
            tagged("Overview", 740.0, LineTag::Heading(2)),
            plain("Body follows.", 700.0),
        ]);
        let blocks = gather_blocks(&page, &[]);
        assert!(matches!(blocks[0], Block::Heading { level: 2, .. }));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_table_run_collapses() {
        let page = page_of(vec![
            row(&["Name", "Age"], 700.0, true),
            row(&["Alice", "30"], 686.0, false),
            row(&["Bob", "25"], 672.0, false),
        ]);
        let blocks = gather_blocks(&page, &[]);
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Table(table) => {
                assert_eq!(table.row_count(), 3);
                assert_eq!(table.header_rows, 1);
                assert_eq!(table.header_signature(), vec!["Name", "Age"]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_adjacent_tables_stay_separate() {
        let page = page_of(vec![
            row(&["A", "B"], 700.0, true),
            row(&["1", "2"], 686.0, false),
            row(&["X", "Y"], 672.0, true),
            row(&["3", "4"], 658.0, false),
        ]);
        let blocks = gather_blocks(&page, &[]);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(Block::is_table));
    }

    #[test]
    fn test_list_run_collapses() {
        let page = page_of(vec![
            tagged(
                "First item",
                700.0,
                LineTag::ListItem {
                    level: 0,
                    marker: ListMarker::Bullet,
                },
            ),
            tagged(
                "Nested item",
                686.0,
                LineTag::ListItem {
                    level: 1,
                    marker: ListMarker::Bullet,
                },
            ),
        ]);
        let blocks = gather_blocks(&page, &[]);
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::List(list) => {
                assert_eq!(list.items.len(), 2);
                assert_eq!(list.items[1].level, 1);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_toc_run_becomes_headerless_table() {
        let mut first = tagged("Intro ..... 1", 700.0, LineTag::TocEntry);
        first.cells = vec!["Intro".to_string(), "1".to_string()];
        let mut second = tagged("Methods ..... 7", 686.0, LineTag::TocEntry);
        second.cells = vec!["Methods".to_string(), "7".to_string()];

        let blocks = gather_blocks(&page_of(vec![first, second]), &[]);
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Table(table) => {
                assert_eq!(table.header_rows, 0);
                assert_eq!(table.rows[1].cells, vec!["Methods", "7"]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_footnote_body_block() {
        let page = page_of(vec![tagged(
            "See appendix.",
            100.0,
            LineTag::FootnoteBody {
                label: "1".to_string(),
            },
        )]);
        let blocks = gather_blocks(&page, &[]);
        match &blocks[0] {
            Block::Footnote { label, content } => {
                assert_eq!(label, "1");
                assert_eq!(content.plain_text(), "See appendix.");
            }
            other => panic!("expected footnote, got {other:?}"),
        }
    }

    #[test]
    fn test_image_interleaved_by_top_edge() {
        let image = ImagePlacement {
            resource_id: "img-1".to_string(),
            x: 100.0,
            y: 500.0,
            width: 200.0,
            height: 150.0,
        };
        let page = page_of(vec![plain("Above image.", 700.0), plain("Below image.", 400.0)]);
        let blocks = gather_blocks(&page, &[image]);

        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], Block::Paragraph(_)));
        assert!(matches!(blocks[1], Block::Image { .. }));
        assert!(matches!(blocks[2], Block::Paragraph(_)));
    }

    #[test]
    fn test_trailing_image_flushes() {
        let image = ImagePlacement {
            resource_id: "img-2".to_string(),
            x: 100.0,
            y: 100.0,
            width: 50.0,
            height: 50.0,
        };
        let page = page_of(vec![plain("Only line.", 700.0)]);
        let blocks = gather_blocks(&page, &[image]);
        assert!(matches!(blocks[1], Block::Image { .. }));
    }

    #[test]
    fn test_styled_runs_merge_adjacent_emphasis() {
        let normal = TextSpan::new("Plain then", 72.0, 700.0, 12.0);
        let mut bold_a = TextSpan::new("bold", 140.0, 700.0, 12.0);
        bold_a.bold = true;
        let mut bold_b = TextSpan::new("words", 168.0, 700.0, 12.0);
        bold_b.bold = true;
        let line = Line::from_spans(vec![normal, bold_a, bold_b]);

        let runs = styled_runs(&line);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Plain then ");
        assert!(!runs[0].style.bold);
        assert_eq!(runs[1].text, "bold words");
        assert!(runs[1].style.bold);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let page = page_of(vec![plain("   ", 700.0), plain("Real text.", 686.0)]);
        let blocks = gather_blocks(&page, &[]);
        assert_eq!(blocks.len(), 1);
    }
}
