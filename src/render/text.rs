//! Plain text rendering.

use crate::error::Result;
use crate::model::Document;

/// Convert a document's blocks to plain text, blocks separated by
/// blank lines.
pub fn to_text(doc: &Document) -> Result<String> {
    Ok(doc.plain_text().trim().to_string())
}
