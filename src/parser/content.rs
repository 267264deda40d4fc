//! Content-stream interpretation.
//!
//! Walks the operator stream of a page and emits positioned text spans
//! plus image-draw events. Only the text and positioning operators are
//! modeled; color, clipping and path operators are ignored, and unknown
//! operators are skipped after discarding their operands so damaged or
//! exotic streams never abort a conversion.

use crate::model::TextSpan;
use crate::parser::lexer::{ObjectParser, Token};
use crate::parser::object::Object;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// A font referenced by a page's resource dictionary.
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// Resource name (the `/F1` in `/F1 12 Tf`)
    pub id: String,

    /// Base font name, subset prefix stripped
    pub base_name: String,

    /// Bold face, judged from the base name
    pub bold: bool,

    /// Italic face, judged from the base name
    pub italic: bool,
}

impl FontInfo {
    pub fn new(id: impl Into<String>, base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        let lower = base_name.to_lowercase();
        let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let italic = lower.contains("italic") || lower.contains("oblique");
        Self {
            id: id.into(),
            base_name,
            bold,
            italic,
        }
    }
}

/// An XObject drawn by a `Do` operator, in page coordinates.
#[derive(Debug, Clone)]
pub struct ImageDraw {
    /// XObject resource name
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything the interpreter extracted from one page.
#[derive(Debug, Default)]
pub struct PageContent {
    pub spans: Vec<TextSpan>,
    pub images: Vec<ImageDraw>,
}

/// Interpret a decoded content stream against the page's font map.
pub fn interpret(data: &[u8], fonts: &HashMap<String, FontInfo>) -> PageContent {
    Interpreter::new(data, fonts).run()
}

/// TJ adjustments more negative than this (in thousandths of text space)
/// are treated as an inter-word gap.
const WORD_GAP_THRESHOLD: f64 = -200.0;

/// Affine transform in the PDF row-vector convention.
#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self` applied first, then `after`.
    fn then(&self, after: &Matrix) -> Matrix {
        Matrix {
            a: self.a * after.a + self.b * after.c,
            b: self.a * after.b + self.b * after.d,
            c: self.c * after.a + self.d * after.c,
            d: self.c * after.b + self.d * after.d,
            e: self.e * after.a + self.f * after.c + after.e,
            f: self.e * after.b + self.f * after.d + after.f,
        }
    }

    /// Horizontal scale factor of the transform.
    fn scale_x(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

struct TextState {
    font: Option<FontInfo>,
    size: f32,
    leading: f32,
    matrix: Matrix,
    line_matrix: Matrix,
}

impl TextState {
    fn new() -> Self {
        Self {
            font: None,
            size: 0.0,
            leading: 0.0,
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }
}

struct Interpreter<'a> {
    parser: ObjectParser<'a>,
    data: &'a [u8],
    fonts: &'a HashMap<String, FontInfo>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text: TextState,
    output: PageContent,
}

impl<'a> Interpreter<'a> {
    fn new(data: &'a [u8], fonts: &'a HashMap<String, FontInfo>) -> Self {
        Self {
            parser: ObjectParser::new(data),
            data,
            fonts,
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text: TextState::new(),
            output: PageContent::default(),
        }
    }

    fn run(mut self) -> PageContent {
        let mut operands: Vec<Object> = Vec::new();
        loop {
            let token = match self.parser.next_token() {
                Ok(Some(token)) => token,
                Ok(None) => break,
                Err(err) => {
                    log::debug!("stopping content interpretation: {err}");
                    break;
                }
            };
            match token {
                Token::Keyword(op) => {
                    self.execute(&op, &operands);
                    operands.clear();
                }
                other => match self.parser.parse_object_from(other) {
                    Ok(obj) => operands.push(obj),
                    Err(err) => {
                        log::debug!("bad operand in content stream: {err}");
                        operands.clear();
                    }
                },
            }
        }
        self.output
    }

    fn execute(&mut self, op: &str, operands: &[Object]) {
        match op {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(m) = self.ctm_stack.pop() {
                    self.ctm = m;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.text.matrix = Matrix::IDENTITY;
                self.text.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let (Some(name), Some(size)) = (
                    operands.first().and_then(Object::as_name),
                    operands.get(1).and_then(number),
                ) {
                    self.text.size = size;
                    self.text.font = match self.fonts.get(name) {
                        Some(font) => Some(font.clone()),
                        None => {
                            log::debug!("font resource /{name} did not resolve");
                            None
                        }
                    };
                }
            }
            "Td" => {
                if let Some((tx, ty)) = pair(operands) {
                    self.text.next_line(tx, ty);
                }
            }
            "TD" => {
                if let Some((tx, ty)) = pair(operands) {
                    self.text.leading = -ty;
                    self.text.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.text.line_matrix = m;
                    self.text.matrix = m;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(number) {
                    self.text.leading = l;
                }
            }
            "T*" => {
                let leading = self.text.leading;
                self.text.next_line(0.0, -leading);
            }
            "Tj" => {
                if let Some(Object::String(bytes)) = operands.first() {
                    self.show_text(bytes);
                }
            }
            "'" => {
                let leading = self.text.leading;
                self.text.next_line(0.0, -leading);
                if let Some(Object::String(bytes)) = operands.first() {
                    self.show_text(bytes);
                }
            }
            "\"" => {
                // Word/char spacing operands are ignored; the string still
                // starts a new line.
                let leading = self.text.leading;
                self.text.next_line(0.0, -leading);
                if let Some(Object::String(bytes)) = operands.last() {
                    self.show_text(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show_text_array(items);
                }
            }
            "Do" => {
                if let Some(name) = operands.first().and_then(Object::as_name) {
                    self.output.images.push(ImageDraw {
                        name: name.to_string(),
                        x: self.ctm.e,
                        y: self.ctm.f,
                        width: self.ctm.a.abs(),
                        height: self.ctm.d.abs(),
                    });
                }
            }
            "BI" => self.skip_inline_image(),
            _ => {
                log::debug!("skipping content operator '{op}'");
            }
        }
    }

    fn show_text(&mut self, bytes: &[u8]) {
        let text: String = decode_string(bytes).nfc().collect();
        if text.is_empty() {
            return;
        }

        let size = self.text.size;
        let render = self.text.matrix.then(&self.ctm);
        let scale = render.scale_x();
        // Without width tables a glyph advances roughly half an em.
        let advance = text.chars().count() as f32 * size * 0.5;

        if !text.trim().is_empty() {
            let font = self.text.font.as_ref();
            self.output.spans.push(TextSpan {
                width: advance * scale,
                font_size: size * scale,
                x: render.e,
                y: render.f,
                font_id: font.map(|f| f.id.clone()),
                bold: font.map(|f| f.bold).unwrap_or(false),
                italic: font.map(|f| f.italic).unwrap_or(false),
                text,
            });
        }
        self.text.matrix = Matrix::translation(advance, 0.0).then(&self.text.matrix);
    }

    fn show_text_array(&mut self, items: &[Object]) {
        for item in items {
            match item {
                Object::String(bytes) => self.show_text(bytes),
                Object::Integer(_) | Object::Real(_) => {
                    let v = item.as_f64().unwrap_or(0.0);
                    if v < WORD_GAP_THRESHOLD {
                        self.insert_word_gap();
                    }
                    let tx = (-v as f32 / 1000.0) * self.text.size;
                    self.text.matrix = Matrix::translation(tx, 0.0).then(&self.text.matrix);
                }
                _ => {}
            }
        }
    }

    /// Large negative TJ kerning reads as a word gap; CJK text does not
    /// use space-separated words, so a gap after a CJK glyph is ignored.
    fn insert_word_gap(&mut self) {
        if let Some(last) = self.output.spans.last_mut() {
            match last.text.chars().last() {
                Some(c) if is_cjk(c) => {}
                Some(c) if c != ' ' => last.text.push(' '),
                _ => {}
            }
        }
    }

    /// Skip `BI ... ID <binary> EI` without tokenizing the payload.
    fn skip_inline_image(&mut self) {
        loop {
            match self.parser.next_token() {
                Ok(Some(Token::Keyword(k))) if k == "ID" => break,
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => return,
            }
        }
        let start = self.parser.pos();
        let mut i = start;
        while i + 1 < self.data.len() {
            if self.data[i] == b'E'
                && self.data[i + 1] == b'I'
                && (i == 0 || self.data[i - 1].is_ascii_whitespace())
                && self
                    .data
                    .get(i + 2)
                    .map(|b| b.is_ascii_whitespace())
                    .unwrap_or(true)
            {
                self.parser.seek(i + 2);
                return;
            }
            i += 1;
        }
        self.parser.seek(self.data.len());
    }
}

fn number(obj: &Object) -> Option<f32> {
    obj.as_f64().map(|v| v as f32)
}

fn pair(operands: &[Object]) -> Option<(f32, f32)> {
    if operands.len() < 2 {
        return None;
    }
    Some((
        number(&operands[operands.len() - 2])?,
        number(&operands[operands.len() - 1])?,
    ))
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let v: Vec<f32> = operands[operands.len() - 6..]
        .iter()
        .filter_map(number)
        .collect();
    if v.len() != 6 {
        return None;
    }
    Some(Matrix {
        a: v[0],
        b: v[1],
        c: v[2],
        d: v[3],
        e: v[4],
        f: v[5],
    })
}

/// Decode string bytes: UTF-16BE when the BOM announces it, UTF-8 when
/// valid, Latin-1 otherwise.
pub(crate) fn decode_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF      // Hiragana, Katakana
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified
        | 0xAC00..=0xD7AF    // Hangul syllables
        | 0xF900..=0xFAFF    // CJK compatibility
        | 0xFF00..=0xFFEF    // Fullwidth forms
    )
}
