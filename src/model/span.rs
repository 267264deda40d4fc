//! Positioned content produced by the content-stream interpreter.

use serde::{Deserialize, Serialize};

/// A run of text at a fixed position on a page.
///
/// Coordinates use PDF page space: origin at the bottom-left corner, `y`
/// giving the text baseline. Layout analysis sorts spans top-down by
/// descending `y`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    /// Decoded text, NFC-normalized
    pub text: String,

    /// Left edge in points
    pub x: f32,

    /// Baseline in points from the page bottom
    pub y: f32,

    /// Approximate advance width in points
    pub width: f32,

    /// Effective font size in points
    pub font_size: f32,

    /// Resource name of the font, or None when the font reference did
    /// not resolve
    pub font_id: Option<String>,

    /// Bold face, judged from the font name
    pub bold: bool,

    /// Italic face, judged from the font name
    pub italic: bool,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_id: None,
            bold: false,
            italic: false,
        }
    }

    /// Right edge in points.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// An image drawn on a page, referencing an extracted resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Key into the document's resource map
    pub resource_id: String,

    /// Left edge in points
    pub x: f32,

    /// Bottom edge in points
    pub y: f32,

    /// Drawn width in points
    pub width: f32,

    /// Drawn height in points
    pub height: f32,
}
