//! Document model types for PDF content representation.
//!
//! This module defines the intermediate representation (IR) that bridges
//! PDF parsing and content rendering. Parsing fills pages with positioned
//! text spans; layout analysis turns those into structured blocks that the
//! renderers consume.

mod document;
mod list;
mod page;
mod paragraph;
mod resource;
mod span;
mod table;

pub use document::{Document, Metadata};
pub use list::{List, ListItem, ListMarker};
pub use page::{Block, Page};
pub use paragraph::{Paragraph, TextRun, TextStyle};
pub use resource::Resource;
pub use span::{ImagePlacement, TextSpan};
pub use table::{Table, TableRow};
