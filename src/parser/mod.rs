//! PDF parsing: file structure, object model, decryption, and content
//! stream interpretation.
//!
//! The entry point is [`parse_document`], which turns raw bytes into the
//! positioned-text model that the layout pass consumes.

mod content;
mod crypto;
mod document;
mod filters;
mod lexer;
mod object;
mod options;
mod xref;

pub use content::{FontInfo, ImageDraw, PageContent};
pub use document::{parse_document, PdfDocument};
pub use filters::{apply_filters, filter_chain, FilterChain};
pub use lexer::{Lexer, ObjectParser, Token};
pub use object::{Dict, ObjRef, Object, Stream};
pub use options::ParseOptions;
pub use xref::{XrefEntry, XrefTable};
