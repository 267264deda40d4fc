//! PDF converter built on the native parsing and layout pipeline.

use super::{ConvertOptions, ConvertResult, DocumentConverter, OutputFormat};
use crate::error::Result;
use crate::render::{self, JsonFormat};
use std::path::Path;

/// PDF to Markdown/text/JSON converter.
///
/// Parses the file with the built-in object parser, runs layout
/// analysis, and renders in the requested output format.
#[derive(Debug, Clone, Default)]
pub struct PdfConverter {
    _private: (),
}

impl PdfConverter {
    /// Create a new PDF converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentConverter for PdfConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        log::debug!("Converting PDF file: {}", path.display());
        let bytes = std::fs::read(path)?;
        self.convert_bytes(&bytes, options)
    }

    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        let document = crate::parse_bytes_with_options(bytes, &options.parse)?;
        let metadata = document.metadata.clone();

        let (content, stats, mime_type) = match options.output_format {
            OutputFormat::Markdown => {
                if options.collect_stats {
                    let rendered = render::to_markdown_with_stats(&document, &options.render)?;
                    (rendered.content, Some(rendered.stats), "text/markdown")
                } else {
                    let content = render::to_markdown(&document, &options.render)?;
                    (content, None, "text/markdown")
                }
            }
            OutputFormat::Text => (render::to_text(&document)?, None, "text/plain"),
            OutputFormat::Json => (
                render::to_json(&document, JsonFormat::Pretty)?,
                None,
                "application/json",
            ),
        };

        let mut result = ConvertResult::new(content, metadata).with_mime_type(mime_type);
        if let Some(stats) = stats {
            result = result.with_stats(stats);
        }
        Ok(result)
    }
}
