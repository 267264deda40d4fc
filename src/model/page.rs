//! Page-level types.

use super::{ImagePlacement, List, Paragraph, Table, TextSpan};
use serde::{Deserialize, Serialize};

/// A single page in the document.
///
/// Pages carry two layers of content: the raw positioned [`TextSpan`]s
/// produced by the content interpreter, and the structured [`Block`]s
/// produced by layout analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,

    /// Positioned text from the content streams
    pub spans: Vec<TextSpan>,

    /// Images drawn on the page
    pub images: Vec<ImagePlacement>,

    /// Structured blocks, filled by layout analysis
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            rotation: 0,
            spans: Vec::new(),
            images: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    /// Create a new page with standard A4 size (210 x 297 mm).
    pub fn a4(number: u32) -> Self {
        Self::new(number, 595.0, 842.0)
    }

    /// Add a text span to the page.
    pub fn add_span(&mut self, span: TextSpan) {
        self.spans.push(span);
    }

    /// Add a structured block to the page.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Get plain text content of the page's blocks.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Check if the page produced no renderable content.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|b| match b {
            Block::Image { .. } => false,
            other => other
                .plain_text()
                .map(|t| t.trim().is_empty())
                .unwrap_or(true),
        })
    }

    /// Get the number of blocks on the page.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::letter(1)
    }
}

/// A structured content block on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading with level 1-6
    Heading {
        /// Heading level (1 = largest)
        level: u8,
        /// Heading text
        content: Paragraph,
    },

    /// A paragraph of body text
    Paragraph(Paragraph),

    /// A run of list items
    List(List),

    /// A table
    Table(Table),

    /// A footnote definition, rendered at the end of the document
    Footnote {
        /// Footnote label (e.g., "1")
        label: String,
        /// Footnote body
        content: Paragraph,
    },

    /// An image reference
    Image {
        /// Resource ID for the image
        resource_id: String,
        /// Alternative text
        alt_text: Option<String>,
    },
}

impl Block {
    /// Create a heading block.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            content: Paragraph::with_text(text),
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(Paragraph::with_text(text))
    }

    /// Create an image block.
    pub fn image(resource_id: impl Into<String>) -> Self {
        Block::Image {
            resource_id: resource_id.into(),
            alt_text: None,
        }
    }

    /// Check if this block is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Check if this block is a footnote definition.
    pub fn is_footnote(&self) -> bool {
        matches!(self, Block::Footnote { .. })
    }

    /// Plain text content, or None for images.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Block::Heading { content, .. } => Some(content.plain_text()),
            Block::Paragraph(p) => Some(p.plain_text()),
            Block::List(list) => Some(list.plain_text()),
            Block::Table(table) => Some(table.plain_text()),
            Block::Footnote { content, .. } => Some(content.plain_text()),
            Block::Image { .. } => None,
        }
    }
}
