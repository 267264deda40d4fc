//! PDF format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of the `%PDF-` signature within the buffer.
    ///
    /// Some generators prepend junk bytes before the header; offsets in the
    /// cross-reference data are then relative to the signature, so the
    /// parser slices the buffer here before reading structure.
    pub header_offset: usize,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// How far into the buffer the signature may appear.
const HEADER_SCAN_WINDOW: usize = 1024;

/// Detect PDF format from a file path.
///
/// # Arguments
/// * `path` - Path to the PDF file
///
/// # Returns
/// * `Ok(PdfFormat)` if the file is a valid PDF
/// * `Err(Error::UnknownFormat)` if the file is not a PDF
///
/// # Example
/// ```no_run
/// use pagemark::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.pdf").unwrap();
/// println!("PDF version: {}", format.version);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = vec![0u8; HEADER_SCAN_WINDOW + PDF_MAGIC.len() + VERSION_LEN];
    let n = reader.read(&mut header)?;
    header.truncate(n);
    detect_format_from_bytes(&header)
}

/// Detect PDF format from bytes.
///
/// The `%PDF-` signature is accepted anywhere within the first 1024 bytes;
/// leading junk before the signature is tolerated and reported through
/// [`PdfFormat::header_offset`].
///
/// # Returns
/// * `Ok(PdfFormat)` if the data carries a valid PDF header
/// * `Err(Error::UnknownFormat)` if the data is not a PDF
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    let window = &data[..data.len().min(HEADER_SCAN_WINDOW + PDF_MAGIC.len() + VERSION_LEN)];
    let offset = find_signature(window).ok_or(Error::UnknownFormat)?;

    let version_start = offset + PDF_MAGIC.len();
    if data.len() < version_start + VERSION_LEN {
        return Err(Error::UnknownFormat);
    }
    let version =
        String::from_utf8_lossy(&data[version_start..version_start + VERSION_LEN]).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat {
        version,
        header_offset: offset,
    })
}

fn find_signature(window: &[u8]) -> Option<usize> {
    if window.len() < PDF_MAGIC.len() {
        return None;
    }
    (0..=window.len() - PDF_MAGIC.len()).find(|&i| window[i..].starts_with(PDF_MAGIC))
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if a file is a valid PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
