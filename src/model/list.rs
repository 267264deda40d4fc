//! List types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A run of consecutive list items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct List {
    /// Items in document order
    pub items: Vec<ListItem>,
}

impl List {
    /// Create a new empty list.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item to the list.
    pub fn add_item(&mut self, item: ListItem) {
        self.items.push(item);
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get plain text content, one line per item.
    pub fn plain_text(&self) -> String {
        self.items
            .iter()
            .map(|item| item.content.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single list item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    /// Nesting level (0 = top level)
    pub level: u8,

    /// The marker that introduced the item
    pub marker: ListMarker,

    /// Item text, marker stripped
    pub content: Paragraph,
}

impl ListItem {
    /// Create a new bulleted item.
    pub fn bullet(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            marker: ListMarker::Bullet,
            content: Paragraph::with_text(text),
        }
    }

    /// Create a new numbered item keeping its original ordinal label.
    pub fn numbered(level: u8, ordinal: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            marker: ListMarker::Number(ordinal.into()),
            content: Paragraph::with_text(text),
        }
    }
}

/// The marker character or label that introduced a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListMarker {
    /// A bullet marker of any glyph
    Bullet,
    /// An ordinal label such as `3.` or `a)`
    Number(String),
}
