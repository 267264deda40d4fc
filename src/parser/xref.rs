//! Cross-reference table resolution.
//!
//! A document carries one or more cross-reference sections, newest last in
//! the file but first in the `/Prev` chain. Sections come in two shapes:
//! the classic `xref` table with fixed-width entries, and (PDF 1.5+) a
//! compressed cross-reference stream. Hybrid files carry both, with the
//! stream reachable through the classic trailer's `/XRefStm` entry.
//!
//! The walk starts at the `startxref` offset and follows `/Prev` links.
//! Entries and trailer keys are merged first-seen-wins, so the newest
//! definition of every object shadows older ones. When the chain cannot be
//! parsed at all, [`XrefTable::rebuild`] scans the raw bytes for object
//! headers and reconstructs offsets directly.

use crate::error::{Error, Result};
use crate::parser::filters::{apply_filters, filter_chain};
use crate::parser::lexer::{Lexer, ObjectParser, Token};
use crate::parser::object::{Dict, Object};
use regex::bytes::Regex;
use std::collections::{HashMap, HashSet};

/// Window scanned backwards from the end of the file for `startxref`.
const STARTXREF_WINDOW: usize = 1024;

/// Location of one indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Free slot; the object does not exist.
    Free,
    /// Uncompressed object at a byte offset in the file.
    Offset { offset: usize, generation: u16 },
    /// Compressed object stored inside an object stream.
    InStream { container: u32, index: u32 },
}

/// Merged view of every cross-reference section in the document.
#[derive(Debug, Default)]
pub struct XrefTable {
    entries: HashMap<u32, XrefEntry>,
    pub trailer: Dict,
}

impl XrefTable {
    /// Parse the cross-reference chain, falling back to a raw scan when the
    /// chain is missing or damaged.
    pub fn parse(data: &[u8]) -> Result<Self> {
        match find_startxref(data) {
            Some(start) => match parse_chain(data, start) {
                Ok(table) if table.trailer.contains_key("Root") => Ok(table),
                Ok(_) => {
                    log::warn!("cross-reference chain has no /Root; rebuilding from raw scan");
                    Self::rebuild(data)
                }
                Err(err) => {
                    log::warn!("cross-reference chain unusable ({err}); rebuilding from raw scan");
                    Self::rebuild(data)
                }
            },
            None => {
                log::warn!("no startxref marker found; rebuilding from raw scan");
                Self::rebuild(data)
            }
        }
    }

    /// Reconstruct the table by scanning for `N G obj` headers.
    ///
    /// Later definitions of an object shadow earlier ones, matching the
    /// incremental-update order of the file. Fails when no trailer
    /// dictionary (or catalog-bearing object dictionary) can be located,
    /// since rendering needs `/Root`.
    pub fn rebuild(data: &[u8]) -> Result<Self> {
        let pattern = Regex::new(r"(\d{1,10})\s+(\d{1,5})\s+obj\b")
            .map_err(|e| Error::Other(e.to_string()))?;

        let mut table = XrefTable::default();
        let mut offsets = Vec::new();
        for caps in pattern.captures_iter(data) {
            let number_match = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            // Reject matches whose number is the tail of a longer number.
            if number_match.start() > 0 && data[number_match.start() - 1].is_ascii_digit() {
                continue;
            }
            let number = match parse_ascii_u64(number_match.as_bytes()) {
                Some(n) if n <= u32::MAX as u64 => n as u32,
                _ => continue,
            };
            let generation = caps
                .get(2)
                .and_then(|m| parse_ascii_u64(m.as_bytes()))
                .unwrap_or(0)
                .min(u16::MAX as u64) as u16;
            let offset = number_match.start();
            table.entries.insert(
                number,
                XrefEntry::Offset { offset, generation },
            );
            offsets.push(offset);
        }
        if table.entries.is_empty() {
            return Err(Error::Malformed(
                "no indirect objects found while rebuilding cross-reference table".into(),
            ));
        }

        if let Some(trailer) = find_trailer_dict(data) {
            table.trailer = trailer;
        } else if let Some(trailer) = find_catalog_trailer(data, &offsets) {
            table.trailer = trailer;
        } else {
            return Err(Error::Malformed(
                "cross-reference table damaged and no trailer dictionary found".into(),
            ));
        }
        log::debug!(
            "rebuilt cross-reference table with {} objects",
            table.entries.len()
        );
        Ok(table)
    }

    pub fn get(&self, number: u32) -> Option<&XrefEntry> {
        self.entries.get(&number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_if_absent(&mut self, number: u32, entry: XrefEntry) {
        self.entries.entry(number).or_insert(entry);
    }

    fn merge_trailer(&mut self, dict: &Dict) {
        for (key, value) in dict {
            if !self.trailer.contains_key(key) {
                self.trailer.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Locate the byte offset announced by the final `startxref` keyword.
pub fn find_startxref(data: &[u8]) -> Option<usize> {
    let tail_start = data.len().saturating_sub(STARTXREF_WINDOW);
    let tail = &data[tail_start..];
    let keyword = b"startxref";
    let pos = tail
        .windows(keyword.len())
        .rposition(|w| w == keyword)?;

    let mut lexer = Lexer::at(data, tail_start + pos + keyword.len());
    match lexer.next_token().ok()?? {
        Token::Integer(offset) if offset >= 0 && (offset as usize) < data.len() => {
            Some(offset as usize)
        }
        _ => None,
    }
}

fn parse_chain(data: &[u8], start: usize) -> Result<XrefTable> {
    let mut table = XrefTable::default();
    let mut visited = HashSet::new();
    let mut next = Some(start);

    while let Some(offset) = next {
        if !visited.insert(offset) {
            log::warn!("cross-reference /Prev chain loops at offset {offset}; stopping");
            break;
        }
        next = parse_section(data, offset, &mut table)?;
    }
    Ok(table)
}

/// Parse one section and return the `/Prev` offset, if any.
fn parse_section(data: &[u8], offset: usize, table: &mut XrefTable) -> Result<Option<usize>> {
    if offset >= data.len() {
        return Err(Error::Malformed(format!(
            "cross-reference offset {offset} beyond end of file"
        )));
    }
    let mut lexer = Lexer::at(data, offset);
    lexer.skip_whitespace();
    if data[lexer.pos()..].starts_with(b"xref") {
        parse_classic_section(data, lexer.pos() + 4, table)
    } else {
        parse_stream_section(data, offset, table)
    }
}

fn parse_classic_section(
    data: &[u8],
    after_keyword: usize,
    table: &mut XrefTable,
) -> Result<Option<usize>> {
    let mut lexer = Lexer::at(data, after_keyword);
    // Entries wait in a local list: in hybrid files the stream named by
    // /XRefStm takes precedence over this section's own rows.
    let mut local = Vec::new();

    loop {
        let checkpoint = lexer.pos();
        match lexer.next_token()? {
            Some(Token::Integer(first)) => {
                let count = match lexer.next_token()? {
                    Some(Token::Integer(n)) if n >= 0 => n as u64,
                    other => {
                        return Err(Error::Malformed(format!(
                            "bad cross-reference subsection header: {other:?}"
                        )))
                    }
                };
                for i in 0..count {
                    let number = (first as u64 + i) as u32;
                    local.push(read_classic_entry(&mut lexer, number)?);
                }
            }
            Some(Token::Keyword(word)) if word == "trailer" => break,
            other => {
                return Err(Error::Malformed(format!(
                    "unexpected token in cross-reference table at {checkpoint}: {other:?}"
                )))
            }
        }
    }

    let mut parser = ObjectParser::at(data, lexer.pos());
    let trailer = match parser.parse_object()? {
        Object::Dict(dict) => dict,
        other => {
            return Err(Error::Malformed(format!(
                "trailer is not a dictionary, got {}",
                other.type_name()
            )))
        }
    };

    if let Some(stm_offset) = trailer.get("XRefStm").and_then(Object::as_i64) {
        if stm_offset >= 0 && (stm_offset as usize) < data.len() {
            // Ignore the hybrid stream's own /Prev; the classic trailer
            // drives the chain.
            parse_stream_section(data, stm_offset as usize, table)?;
        }
    }
    for (number, entry) in local {
        table.insert_if_absent(number, entry);
    }

    let prev = trailer
        .get("Prev")
        .and_then(Object::as_i64)
        .filter(|&p| p >= 0)
        .map(|p| p as usize);
    table.merge_trailer(&trailer);
    Ok(prev)
}

fn read_classic_entry(lexer: &mut Lexer, number: u32) -> Result<(u32, XrefEntry)> {
    let offset = match lexer.next_token()? {
        Some(Token::Integer(n)) if n >= 0 => n as usize,
        other => {
            return Err(Error::Malformed(format!(
                "bad cross-reference entry offset: {other:?}"
            )))
        }
    };
    let generation = match lexer.next_token()? {
        Some(Token::Integer(n)) if n >= 0 => n.min(u16::MAX as i64) as u16,
        other => {
            return Err(Error::Malformed(format!(
                "bad cross-reference entry generation: {other:?}"
            )))
        }
    };
    let entry = match lexer.next_token()? {
        Some(Token::Keyword(kind)) if kind == "n" => XrefEntry::Offset { offset, generation },
        Some(Token::Keyword(kind)) if kind == "f" => XrefEntry::Free,
        other => {
            return Err(Error::Malformed(format!(
                "bad cross-reference entry type: {other:?}"
            )))
        }
    };
    Ok((number, entry))
}

/// Parse a cross-reference stream section and return its `/Prev`.
fn parse_stream_section(data: &[u8], offset: usize, table: &mut XrefTable) -> Result<Option<usize>> {
    let mut parser = ObjectParser::at(data, offset);
    parser.expect_object_header()?;
    let dict = match parser.parse_object()? {
        Object::Dict(dict) => dict,
        other => {
            return Err(Error::Malformed(format!(
                "cross-reference stream object is {}, expected dictionary",
                other.type_name()
            )))
        }
    };
    if dict.get("Type").and_then(Object::as_name) != Some("XRef") {
        return Err(Error::Malformed(format!(
            "object at offset {offset} is not a cross-reference stream"
        )));
    }
    parser.expect_keyword("stream")?;
    parser.skip_stream_eol();
    let raw = read_stream_payload(data, parser.pos(), &dict)?;
    // Cross-reference streams are never encrypted; decode filters directly.
    let decoded = apply_filters(&filter_chain(&dict), raw)?;

    let widths = read_widths(&dict)?;
    let size = dict
        .get("Size")
        .and_then(Object::as_i64)
        .ok_or_else(|| Error::Malformed("cross-reference stream missing /Size".into()))?;
    let index = read_index(&dict, size)?;

    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(Error::Malformed("cross-reference stream /W is all zero".into()));
    }
    let mut rows = decoded.chunks_exact(row_len);
    for (first, count) in index {
        for i in 0..count {
            let row = match rows.next() {
                Some(row) => row,
                None => {
                    log::warn!("cross-reference stream shorter than /Index declares");
                    return finish_stream_trailer(table, dict);
                }
            };
            let number = (first + i) as u32;
            let (f1, rest) = row.split_at(widths[0]);
            let (f2, f3) = rest.split_at(widths[1]);
            // A zero-width first field defaults to a type-1 entry.
            let kind = if widths[0] == 0 { 1 } else { be_int(f1) };
            let entry = match kind {
                0 => XrefEntry::Free,
                1 => XrefEntry::Offset {
                    offset: be_int(f2) as usize,
                    generation: be_int(f3).min(u16::MAX as u64) as u16,
                },
                2 => XrefEntry::InStream {
                    container: be_int(f2) as u32,
                    index: be_int(f3) as u32,
                },
                other => {
                    log::debug!("skipping cross-reference entry of unknown type {other}");
                    continue;
                }
            };
            table.insert_if_absent(number, entry);
        }
    }
    finish_stream_trailer(table, dict)
}

fn finish_stream_trailer(table: &mut XrefTable, dict: Dict) -> Result<Option<usize>> {
    let prev = dict
        .get("Prev")
        .and_then(Object::as_i64)
        .filter(|&p| p >= 0)
        .map(|p| p as usize);
    table.merge_trailer(&dict);
    Ok(prev)
}

fn read_widths(dict: &Dict) -> Result<[usize; 3]> {
    let w = dict
        .get("W")
        .and_then(Object::as_array)
        .ok_or_else(|| Error::Malformed("cross-reference stream missing /W".into()))?;
    if w.len() < 3 {
        return Err(Error::Malformed(format!(
            "cross-reference stream /W has {} entries, expected 3",
            w.len()
        )));
    }
    let mut widths = [0usize; 3];
    for (slot, value) in widths.iter_mut().zip(w) {
        *slot = value
            .as_i64()
            .filter(|&n| (0..=8).contains(&n))
            .ok_or_else(|| Error::Malformed("bad field width in cross-reference /W".into()))?
            as usize;
    }
    Ok(widths)
}

fn read_index(dict: &Dict, size: i64) -> Result<Vec<(i64, i64)>> {
    match dict.get("Index").and_then(Object::as_array) {
        Some(values) => {
            if values.len() % 2 != 0 {
                return Err(Error::Malformed(
                    "cross-reference stream /Index has odd length".into(),
                ));
            }
            let mut pairs = Vec::with_capacity(values.len() / 2);
            for pair in values.chunks_exact(2) {
                let first = pair[0].as_i64().filter(|&n| n >= 0);
                let count = pair[1].as_i64().filter(|&n| n >= 0);
                match (first, count) {
                    (Some(first), Some(count)) => pairs.push((first, count)),
                    _ => {
                        return Err(Error::Malformed(
                            "bad subsection bounds in cross-reference /Index".into(),
                        ))
                    }
                }
            }
            Ok(pairs)
        }
        None => Ok(vec![(0, size.max(0))]),
    }
}

fn be_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Slice a stream payload starting at `start`, using a direct `/Length`
/// when present and falling back to scanning for `endstream`.
fn read_stream_payload(data: &[u8], start: usize, dict: &Dict) -> Result<Vec<u8>> {
    if let Some(len) = dict.get("Length").and_then(Object::as_i64) {
        let len = len.max(0) as usize;
        if start + len <= data.len() {
            return Ok(data[start..start + len].to_vec());
        }
    }
    let marker = b"endstream";
    let end = data[start..]
        .windows(marker.len())
        .position(|w| w == marker)
        .map(|p| start + p)
        .ok_or_else(|| Error::Malformed("unterminated stream".into()))?;
    let mut end = end;
    // Drop the EOL that separates payload from the endstream keyword.
    if end > start && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > start && data[end - 1] == b'\r' {
        end -= 1;
    }
    Ok(data[start..end].to_vec())
}

fn parse_ascii_u64(bytes: &[u8]) -> Option<u64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn find_trailer_dict(data: &[u8]) -> Option<Dict> {
    let keyword = b"trailer";
    let mut search_end = data.len();
    // Walk occurrences newest-first until one parses.
    while let Some(pos) = data[..search_end]
        .windows(keyword.len())
        .rposition(|w| w == keyword)
    {
        let mut parser = ObjectParser::at(data, pos + keyword.len());
        if let Ok(Object::Dict(dict)) = parser.parse_object() {
            if dict.contains_key("Root") {
                return Some(dict);
            }
        }
        search_end = pos;
    }
    None
}

/// Last resort for trailer-less files: look for an object dictionary
/// carrying `/Root` (a cross-reference stream) among the scanned objects.
fn find_catalog_trailer(data: &[u8], offsets: &[usize]) -> Option<Dict> {
    for &offset in offsets.iter().rev() {
        let mut parser = ObjectParser::at(data, offset);
        if parser.expect_object_header().is_err() {
            continue;
        }
        if let Ok(Object::Dict(dict)) = parser.parse_object() {
            if dict.contains_key("Root") {
                return Some(dict);
            }
        }
    }
    None
}
