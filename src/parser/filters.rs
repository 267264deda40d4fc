//! Stream filter decoding.
//!
//! Implements the filters page content and cross-reference streams actually
//! use: zlib deflate (with PNG/TIFF predictor undoing) and ASCII hex. Every
//! other filter name surfaces as [`Error::UnsupportedFilter`] so callers can
//! report the file distinctly instead of producing garbage text. Image
//! codecs (DCT, JPX) never go through here; the image extractor keeps their
//! bytes raw.

use crate::error::{Error, Result};
use crate::parser::object::{Dict, Object};
use flate2::read::ZlibDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use std::io::Read;

/// One filter application: name plus its (already resolved) parameters.
pub type FilterChain = Vec<(String, Option<Dict>)>;

/// Extract the filter chain from a stream dictionary.
///
/// `Filter` may be a single name or an array; `DecodeParms` mirror that
/// shape with possible `null` placeholders. References must be resolved by
/// the caller beforehand.
pub fn filter_chain(dict: &Dict) -> FilterChain {
    let filters: Vec<String> = match dict.get("Filter") {
        Some(Object::Name(n)) => vec![n.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    let parms: Vec<Option<Dict>> = match dict.get("DecodeParms").or_else(|| dict.get("DP")) {
        Some(Object::Dict(d)) => vec![Some(d.clone())],
        Some(Object::Array(items)) => items
            .iter()
            .map(|o| match o {
                Object::Dict(d) => Some(d.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    filters
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, parms.get(i).cloned().flatten()))
        .collect()
}

/// Run `data` through the whole filter chain.
pub fn apply_filters(chain: &FilterChain, data: Vec<u8>) -> Result<Vec<u8>> {
    let mut current = data;
    for (name, parms) in chain {
        current = match name.as_str() {
            "FlateDecode" | "Fl" => {
                let inflated = inflate(&current);
                match parms {
                    Some(p) => undo_predictor(inflated, p)?,
                    None => inflated,
                }
            }
            "ASCIIHexDecode" | "AHx" => ascii_hex_decode(&current),
            name => return Err(Error::UnsupportedFilter(name.to_string())),
        };
    }
    Ok(current)
}

/// Zlib-inflate with a salvage path for truncated or damaged tails.
///
/// Real-world files occasionally carry streams cut short by a bad `Length`;
/// the prefix that did decode is usually complete enough to use.
pub fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut decoder = ZlibDecoder::new(data);
    match decoder.read_to_end(&mut out) {
        Ok(_) => out,
        Err(_) => {
            let salvaged = inflate_tolerant(data);
            if salvaged.len() > out.len() {
                salvaged
            } else {
                out
            }
        }
    }
}

fn inflate_tolerant(data: &[u8]) -> Vec<u8> {
    let mut decomp = Decompress::new(true);
    let mut out = Vec::new();
    let mut buf = vec![0u8; 8192];
    let mut pos = 0usize;

    while pos < data.len() {
        let in_before = decomp.total_in();
        let out_before = decomp.total_out();
        let status = decomp.decompress(&data[pos..], &mut buf, FlushDecompress::Sync);
        let consumed = (decomp.total_in() - in_before) as usize;
        let produced = (decomp.total_out() - out_before) as usize;
        out.extend_from_slice(&buf[..produced]);
        match status {
            Ok(Status::StreamEnd) => break,
            Ok(_) => {
                if consumed == 0 && produced == 0 {
                    break;
                }
                pos += consumed;
            }
            Err(_) => {
                log::warn!("salvaged {} bytes from damaged deflate stream", out.len());
                break;
            }
        }
    }
    out
}

fn ascii_hex_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    for &b in data {
        if b == b'>' {
            break;
        }
        let value = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => continue,
        };
        match pending.take() {
            Some(hi) => out.push(hi * 16 + value),
            None => pending = Some(value),
        }
    }
    if let Some(hi) = pending {
        out.push(hi * 16);
    }
    out
}

/// Undo the `Predictor` transform declared in `DecodeParms`.
fn undo_predictor(data: Vec<u8>, parms: &Dict) -> Result<Vec<u8>> {
    let predictor = parms.get("Predictor").and_then(Object::as_i64).unwrap_or(1);
    match predictor {
        0 | 1 => Ok(data),
        2 => undo_tiff_predictor(data, parms),
        p if p >= 10 => undo_png_predictor(data, parms),
        p => Err(Error::UnsupportedFilter(format!("predictor {p}"))),
    }
}

fn row_geometry(parms: &Dict) -> (usize, usize) {
    let columns = parms.get("Columns").and_then(Object::as_i64).unwrap_or(1).max(1) as usize;
    let colors = parms.get("Colors").and_then(Object::as_i64).unwrap_or(1).max(1) as usize;
    let bpc = parms
        .get("BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8)
        .max(1) as usize;
    let bytes_per_pixel = (colors * bpc + 7) / 8;
    let row_len = (columns * colors * bpc + 7) / 8;
    (row_len, bytes_per_pixel.max(1))
}

fn undo_tiff_predictor(mut data: Vec<u8>, parms: &Dict) -> Result<Vec<u8>> {
    let (row_len, bpp) = row_geometry(parms);
    if row_len == 0 {
        return Ok(data);
    }
    for row_start in (0..data.len()).step_by(row_len) {
        let row_end = (row_start + row_len).min(data.len());
        for i in row_start + bpp..row_end {
            data[i] = data[i].wrapping_add(data[i - bpp]);
        }
    }
    Ok(data)
}

/// PNG filter reconstruction, one tag byte per row.
fn undo_png_predictor(data: Vec<u8>, parms: &Dict) -> Result<Vec<u8>> {
    let (row_len, bpp) = row_geometry(parms);
    if row_len == 0 {
        return Ok(data);
    }

    let stride = row_len + 1;
    let mut out = Vec::with_capacity(data.len() / stride * row_len);
    let mut prev_row = vec![0u8; row_len];

    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let filter_type = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_len, 0);

        match filter_type {
            0 => {}
            1 => {
                for i in bpp..row_len {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            2 => {
                for i in 0..row_len {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as u32 } else { 0 };
                    let up = prev_row[i] as u32;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let up = prev_row[i];
                    let up_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    row[i] = row[i].wrapping_add(paeth_predictor(left, up, up_left));
                }
            }
            t => {
                return Err(Error::Malformed(format!("invalid PNG filter type {t}")));
            }
        }

        out.extend_from_slice(&row);
        prev_row = row;
    }
    Ok(out)
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i32 + b as i32 - c as i32;
    let pa = (p - a as i32).abs();
    let pb = (p - b as i32).abs();
    let pc = (p - c as i32).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn parms(entries: &[(&str, i64)]) -> Dict {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Object::Integer(*v)))
            .collect()
    }

    #[test]
    fn test_flate_roundtrip() {
        let original = b"BT /F1 12 Tf (Hello, world) Tj ET".repeat(20);
        let chain = vec![("FlateDecode".to_string(), None)];
        let decoded = apply_filters(&chain, deflate(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_truncated_flate_salvages_prefix() {
        let original = b"salvage me please, most of this should survive".repeat(50);
        let mut compressed = deflate(&original);
        compressed.truncate(compressed.len() - 6);
        let decoded = inflate(&compressed);
        assert!(!decoded.is_empty());
        assert!(original.starts_with(&decoded[..decoded.len().min(original.len())]));
    }

    #[test]
    fn test_ascii_hex() {
        let chain = vec![("ASCIIHexDecode".to_string(), None)];
        let decoded = apply_filters(&chain, b"48 65 6C 6C 6F>".to_vec()).unwrap();
        assert_eq!(decoded, b"Hello");
    }

    #[test]
    fn test_unsupported_filter_is_detected() {
        let chain = vec![("JBIG2Decode".to_string(), None)];
        let err = apply_filters(&chain, vec![1, 2, 3]).unwrap_err();
        assert_eq!(err.category(), "unsupported-filter");
        assert!(err.to_string().contains("JBIG2Decode"));
    }

    #[test]
    fn test_filter_chain_shapes() {
        let mut dict = Dict::new();
        dict.insert("Filter".into(), Object::Name("FlateDecode".into()));
        assert_eq!(filter_chain(&dict).len(), 1);

        let mut dict = Dict::new();
        dict.insert(
            "Filter".into(),
            Object::Array(vec![
                Object::Name("ASCIIHexDecode".into()),
                Object::Name("FlateDecode".into()),
            ]),
        );
        dict.insert(
            "DecodeParms".into(),
            Object::Array(vec![Object::Null, Object::Dict(parms(&[("Predictor", 12)]))]),
        );
        let chain = filter_chain(&dict);
        assert_eq!(chain.len(), 2);
        assert!(chain[0].1.is_none());
        assert!(chain[1].1.is_some());
    }

    // ==================== Predictors ====================

    #[test]
    fn test_png_up_predictor() {
        let p = parms(&[("Predictor", 12), ("Columns", 4)]);
        let data = vec![2, 1, 2, 3, 4, 2, 1, 1, 1, 1];
        let out = undo_predictor(data, &p).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 2, 3, 4, 5]);
    }

    #[test]
    fn test_png_sub_predictor() {
        let p = parms(&[("Predictor", 11), ("Columns", 4)]);
        let data = vec![1, 1, 1, 1, 1];
        let out = undo_predictor(data, &p).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_png_average_predictor() {
        let p = parms(&[("Predictor", 13), ("Columns", 4)]);
        let data = vec![3, 2, 2, 2, 2];
        let out = undo_predictor(data, &p).unwrap();
        assert_eq!(out, vec![2, 3, 3, 3]);
    }

    #[test]
    fn test_png_paeth_first_row_acts_like_sub() {
        let p = parms(&[("Predictor", 15), ("Columns", 3)]);
        let data = vec![4, 5, 5, 5];
        let out = undo_predictor(data, &p).unwrap();
        assert_eq!(out, vec![5, 10, 15]);
    }

    #[test]
    fn test_tiff_predictor() {
        let p = parms(&[("Predictor", 2), ("Columns", 4)]);
        let data = vec![10, 1, 1, 1];
        let out = undo_predictor(data, &p).unwrap();
        assert_eq!(out, vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_paeth_function() {
        assert_eq!(paeth_predictor(0, 0, 0), 0);
        assert_eq!(paeth_predictor(1, 2, 1), 2);
        assert_eq!(paeth_predictor(4, 3, 1), 4);
    }
}
