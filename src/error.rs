//! Error types for the pagemark library.

use std::io;
use thiserror::Error;

/// Result type alias for pagemark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF processing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The document structure (trailer, cross-reference data, page tree)
    /// cannot be parsed. Fatal for the file; no partial output is produced.
    #[error("Malformed document structure: {0}")]
    Malformed(String),

    /// The document is encrypted and requires a password that was not given.
    #[error("Document is encrypted and requires a password")]
    Encrypted,

    /// The provided password did not authenticate.
    #[error("Invalid password")]
    InvalidPassword,

    /// The encryption scheme is not the standard password handler, or uses
    /// an unimplemented revision.
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// A stream uses a compression filter this library does not implement.
    #[error("Unsupported stream filter: {0}")]
    UnsupportedFilter(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range string.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// The conversion was cancelled or its deadline passed.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable category tag for batch tooling.
    ///
    /// Callers running many files inspect this to decide whether a failure
    /// is a damaged input, an encryption limitation, or an internal error,
    /// without matching on enum variants.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::UnknownFormat | Error::UnsupportedVersion(_) => "unknown-format",
            Error::Malformed(_) => "malformed-structure",
            Error::Encrypted | Error::InvalidPassword | Error::UnsupportedEncryption(_) => {
                "unsupported-encryption"
            }
            Error::UnsupportedFilter(_) => "unsupported-filter",
            Error::Render(_) => "render",
            Error::PageOutOfRange(_, _) | Error::InvalidPageRange(_) => "page-range",
            Error::Cancelled => "cancelled",
            Error::Other(_) => "other",
        }
    }

    /// Whether this error is fatal for the current file only, so a batch
    /// caller should record the outcome and continue with the next file.
    pub fn is_per_file(&self) -> bool {
        !matches!(self, Error::Cancelled)
    }
}
