//! # pagemark
//!
//! PDF to Markdown conversion library with a native parser.
//!
//! The pipeline reads the PDF object structure directly (cross-reference
//! tables and streams, object streams, standard-handler decryption), runs
//! the content streams through an interpreter to get positioned text, then
//! reconstructs headings, paragraphs, lists, tables, and footnotes from
//! glyph geometry alone. No font rasterization, no OCR.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagemark::{parse_file, render};
//!
//! fn main() -> pagemark::Result<()> {
//!     let doc = parse_file("document.pdf")?;
//!
//!     let options = render::RenderOptions::default();
//!     let markdown = render::to_markdown(&doc, &options)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Multiple output formats**: Markdown, plain text, JSON
//! - **Structure reconstruction**: headings, paragraphs, tables, lists,
//!   footnotes, running header/footer removal
//! - **Encrypted documents**: RC4 and AES standard security handlers
//! - **Asset extraction**: embedded images with stable identifiers
//! - **CJK support**: spaceless-script aware text assembly
//! - **Parallel batches**: [`convert::convert_paths`] fans out over Rayon

pub mod cancel;
pub mod convert;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use convert::{
    convert_paths, ConvertOptions, ConvertResult, ConverterRegistry, DocumentConverter,
    OutputFormat, PdfConverter,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use layout::LayoutConfig;
pub use model::{
    Block, Document, List, ListItem, ListMarker, Metadata, Page, Paragraph, Resource, Table,
    TableRow, TextRun, TextStyle,
};
pub use parser::ParseOptions;
pub use render::{ExtractionStats, JsonFormat, PageSelection, RenderOptions, RenderResult};

use std::io::Read;
use std::path::Path;

/// Parse a PDF file and return a structured document.
///
/// # Example
///
/// ```no_run
/// use pagemark::parse_file;
///
/// let doc = parse_file("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file_with_options(path, &ParseOptions::default())
}

/// Parse a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pagemark::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().text_only();
/// let doc = parse_file_with_options("document.pdf", &options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> Result<Document> {
    let data = std::fs::read(path)?;
    parse_bytes_with_options(&data, options)
}

/// Parse a PDF from bytes.
///
/// # Example
///
/// ```no_run
/// use pagemark::parse_bytes;
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let doc = parse_bytes(&data).unwrap();
/// ```
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    parse_bytes_with_options(data, &ParseOptions::default())
}

/// Parse a PDF from bytes with custom options.
///
/// Runs the full pipeline: format detection, structure parsing,
/// decryption, content interpretation, then layout analysis over the
/// positioned text.
pub fn parse_bytes_with_options(data: &[u8], options: &ParseOptions) -> Result<Document> {
    let mut document = parser::parse_document(data, options)?;
    layout::analyze(&mut document, &options.layout, &options.cancel)?;
    Ok(document)
}

/// Parse a PDF from a reader.
///
/// # Example
///
/// ```no_run
/// use pagemark::parse_reader;
/// use std::fs::File;
///
/// let file = File::open("document.pdf").unwrap();
/// let doc = parse_reader(file).unwrap();
/// ```
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    parse_reader_with_options(reader, &ParseOptions::default())
}

/// Parse a PDF from a reader with custom options.
pub fn parse_reader_with_options<R: Read>(
    mut reader: R,
    options: &ParseOptions,
) -> Result<Document> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_bytes_with_options(&data, options)
}

/// Parse a password-protected PDF file.
///
/// # Example
///
/// ```no_run
/// use pagemark::parse_file_with_password;
///
/// let doc = parse_file_with_password("encrypted.pdf", "secret").unwrap();
/// ```
pub fn parse_file_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<Document> {
    parse_file_with_options(path, &ParseOptions::new().with_password(password))
}

/// Extract plain text from a PDF file.
///
/// # Example
///
/// ```no_run
/// use pagemark::extract_text;
///
/// let text = extract_text("document.pdf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_text(&doc)
}

/// Convert a PDF to Markdown with default options.
///
/// # Example
///
/// ```no_run
/// use pagemark::to_markdown;
///
/// let markdown = to_markdown("document.pdf").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_options(path, &RenderOptions::default())
}

/// Convert a PDF to Markdown with custom options.
///
/// # Example
///
/// ```no_run
/// use pagemark::{to_markdown_with_options, RenderOptions};
///
/// let options = RenderOptions::new().with_frontmatter(true);
/// let markdown = to_markdown_with_options("document.pdf", &options).unwrap();
/// ```
pub fn to_markdown_with_options<P: AsRef<Path>>(
    path: P,
    options: &RenderOptions,
) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_markdown(&doc, options)
}

/// Convert a PDF to JSON.
///
/// # Example
///
/// ```no_run
/// use pagemark::{to_json, JsonFormat};
///
/// let json = to_json("document.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("output.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_json(&doc, format)
}
