//! Tokenizer and object parser for PDF syntax.
//!
//! The lexer walks a byte slice and yields owned tokens; it keeps no state
//! beyond the cursor, so callers can seek freely (the cross-reference
//! resolver jumps to arbitrary offsets). The object parser layers the
//! `number number R` lookahead and dictionary/array assembly on top.

use crate::error::{Error, Result};
use crate::parser::object::{Dict, ObjRef, Object};

/// PDF whitespace class.
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

/// PDF delimiter class.
pub fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    /// `/Name`, hex escapes already decoded.
    Name(String),
    /// Literal or hex string, escapes already decoded.
    Str(Vec<u8>),
    ArrayOpen,
    ArrayClose,
    DictOpen,
    DictClose,
    /// Bare keyword: `obj`, `endobj`, `stream`, `R`, `true`, operators, ...
    Keyword(String),
}

/// Cursor-based tokenizer over a byte slice.
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skip whitespace and `%` comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Position the cursor at the first payload byte after a `stream`
    /// keyword (a single EOL follows the keyword per the format).
    pub fn skip_stream_eol(&mut self) {
        match self.peek() {
            Some(b'\r') => {
                self.pos += 1;
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.pos += 1,
            _ => {}
        }
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        let start = self.pos;
        let b = match self.bump() {
            Some(b) => b,
            None => return Ok(None),
        };

        let token = match b {
            b'/' => Token::Name(self.read_name()),
            b'(' => Token::Str(self.read_literal_string()?),
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    Token::DictOpen
                } else {
                    Token::Str(self.read_hex_string())
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    Token::DictClose
                } else {
                    return Err(Error::Malformed(format!("stray '>' at offset {start}")));
                }
            }
            b'[' => Token::ArrayOpen,
            b']' => Token::ArrayClose,
            b')' => {
                return Err(Error::Malformed(format!("stray ')' at offset {start}")));
            }
            b'{' => Token::Keyword("{".into()),
            b'}' => Token::Keyword("}".into()),
            b'0'..=b'9' | b'+' | b'-' | b'.' => {
                self.pos = start;
                self.read_number()?
            }
            _ => {
                self.pos = start;
                Token::Keyword(self.read_keyword())
            }
        };
        Ok(Some(token))
    }

    fn read_name(&mut self) -> String {
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                let hi = self.peek().and_then(hex_value);
                if let Some(hi) = hi {
                    self.pos += 1;
                    let lo = self.peek().and_then(hex_value);
                    if let Some(lo) = lo {
                        self.pos += 1;
                        out.push(hi * 16 + lo);
                        continue;
                    }
                    out.push(b'#');
                    out.push(to_hex_digit(hi));
                    continue;
                }
                out.push(b'#');
            } else {
                out.push(b);
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn read_literal_string(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let b = self
                .bump()
                .ok_or_else(|| Error::Malformed("unterminated literal string".into()))?;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => {
                    let esc = self
                        .bump()
                        .ok_or_else(|| Error::Malformed("unterminated escape in string".into()))?;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(8),
                        b'f' => out.push(12),
                        b'(' | b')' | b'\\' => out.push(esc),
                        b'0'..=b'7' => {
                            let mut value = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        self.pos += 1;
                                        value = value * 8 + (d - b'0') as u32;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xff) as u8);
                        }
                        // Backslash-EOL is a line continuation.
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        other => out.push(other),
                    }
                }
                _ => out.push(b),
            }
        }
    }

    fn read_hex_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pending: Option<u8> = None;
        while let Some(b) = self.bump() {
            if b == b'>' {
                break;
            }
            if let Some(v) = hex_value(b) {
                match pending.take() {
                    Some(hi) => out.push(hi * 16 + v),
                    None => pending = Some(v),
                }
            }
        }
        // Odd final digit acts as the high nibble.
        if let Some(hi) = pending {
            out.push(hi * 16);
        }
        out
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| Error::Malformed(format!("invalid number at offset {start}")))?;
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Token::Integer(n));
        }
        // "." and ".5" style reals, and "+.2"
        let normalized = if text.starts_with('.') {
            format!("0{text}")
        } else if let Some(rest) = text.strip_prefix("+.") {
            format!("0.{rest}")
        } else if let Some(rest) = text.strip_prefix("-.") {
            format!("-0.{rest}")
        } else {
            text.to_string()
        };
        normalized
            .parse::<f64>()
            .map(Token::Real)
            .map_err(|_| Error::Malformed(format!("invalid number '{text}' at offset {start}")))
    }

    fn read_keyword(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_regular(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.data[start..self.pos]).into_owned()
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn to_hex_digit(v: u8) -> u8 {
    match v {
        0..=9 => b'0' + v,
        _ => b'a' + v - 10,
    }
}

/// Object-level parser with pushback, used for both body objects and
/// dictionary-valued structures like trailers.
pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
    buffer: Vec<Token>,
}

impl<'a> ObjectParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            buffer: Vec::new(),
        }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            lexer: Lexer::at(data, pos),
            buffer: Vec::new(),
        }
    }

    /// Cursor position. Only meaningful when no token is buffered, which
    /// holds after any complete `parse_object`/`next_token` sequence.
    pub fn pos(&self) -> usize {
        self.lexer.pos()
    }

    pub fn skip_stream_eol(&mut self) {
        self.lexer.skip_stream_eol()
    }

    /// Move the cursor, dropping any buffered lookahead.
    pub fn seek(&mut self, pos: usize) {
        self.buffer.clear();
        self.lexer.seek(pos);
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(t) = self.buffer.pop() {
            return Ok(Some(t));
        }
        self.lexer.next_token()
    }

    fn push_back(&mut self, token: Token) {
        self.buffer.push(token);
    }

    /// Read the next keyword, failing when something else appears.
    pub fn expect_keyword(&mut self, word: &str) -> Result<()> {
        match self.next_token()? {
            Some(Token::Keyword(k)) if k == word => Ok(()),
            Some(other) => Err(Error::Malformed(format!(
                "expected keyword '{word}', found {other:?}"
            ))),
            None => Err(Error::Malformed(format!(
                "expected keyword '{word}', found end of input"
            ))),
        }
    }

    /// Read an indirect object header (`N G obj`), returning number and
    /// generation.
    pub fn expect_object_header(&mut self) -> Result<(u32, u16)> {
        let number = match self.next_token()? {
            Some(Token::Integer(n)) if n >= 0 => n as u32,
            other => {
                return Err(Error::Malformed(format!(
                    "expected object number, got {other:?}"
                )))
            }
        };
        let generation = match self.next_token()? {
            Some(Token::Integer(n)) if n >= 0 => n.min(u16::MAX as i64) as u16,
            other => {
                return Err(Error::Malformed(format!(
                    "expected object generation, got {other:?}"
                )))
            }
        };
        self.expect_keyword("obj")?;
        Ok((number, generation))
    }

    /// Parse one object in value position.
    ///
    /// Two integers followed by `R` collapse into a reference; any other
    /// lookahead is pushed back untouched.
    pub fn parse_object(&mut self) -> Result<Object> {
        let token = self
            .next_token()?
            .ok_or_else(|| Error::Malformed("unexpected end of input".into()))?;
        self.parse_object_from(token)
    }

    /// Parse an object whose first token has already been read. Content
    /// interpretation uses this to push operator operands.
    pub(crate) fn parse_object_from(&mut self, token: Token) -> Result<Object> {
        match token {
            Token::Integer(a) => {
                if let Some(second) = self.next_token()? {
                    if let Token::Integer(b) = second {
                        if let Some(third) = self.next_token()? {
                            if matches!(&third, Token::Keyword(k) if k == "R") {
                                let number = u32::try_from(a).unwrap_or(0);
                                let generation = u16::try_from(b).unwrap_or(0);
                                return Ok(Object::Reference(ObjRef::new(number, generation)));
                            }
                            self.push_back(third);
                        }
                        self.push_back(Token::Integer(b));
                    } else {
                        self.push_back(second);
                    }
                }
                Ok(Object::Integer(a))
            }
            Token::Real(r) => Ok(Object::Real(r)),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::Str(s) => Ok(Object::String(s)),
            Token::ArrayOpen => self.parse_array(),
            Token::DictOpen => self.parse_dict().map(Object::Dict),
            Token::Keyword(k) => match k.as_str() {
                "true" => Ok(Object::Boolean(true)),
                "false" => Ok(Object::Boolean(false)),
                "null" => Ok(Object::Null),
                other => Err(Error::Malformed(format!(
                    "unexpected keyword '{other}' in object position"
                ))),
            },
            Token::ArrayClose | Token::DictClose => Err(Error::Malformed(
                "unbalanced closing delimiter in object position".into(),
            )),
        }
    }

    fn parse_array(&mut self) -> Result<Object> {
        let mut items = Vec::new();
        loop {
            let token = self
                .next_token()?
                .ok_or_else(|| Error::Malformed("unterminated array".into()))?;
            if token == Token::ArrayClose {
                return Ok(Object::Array(items));
            }
            items.push(self.parse_object_from(token)?);
        }
    }

    /// Parse dictionary entries after the opening `<<`.
    pub fn parse_dict(&mut self) -> Result<Dict> {
        let mut dict = Dict::new();
        loop {
            let token = self
                .next_token()?
                .ok_or_else(|| Error::Malformed("unterminated dictionary".into()))?;
            match token {
                Token::DictClose => return Ok(dict),
                Token::Name(key) => {
                    let value = self.parse_object()?;
                    dict.insert(key, value);
                }
                other => {
                    return Err(Error::Malformed(format!(
                        "expected name key in dictionary, found {other:?}"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(data: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(data);
        let mut out = Vec::new();
        while let Some(t) = lexer.next_token().unwrap() {
            out.push(t);
        }
        out
    }

    // ==================== Lexer ====================

    #[test]
    fn test_numbers() {
        let tokens = all_tokens(b"42 -17 +3 3.14 -.5 .25 4.");
        assert_eq!(
            tokens,
            vec![
                Token::Integer(42),
                Token::Integer(-17),
                Token::Integer(3),
                Token::Real(3.14),
                Token::Real(-0.5),
                Token::Real(0.25),
                Token::Real(4.0),
            ]
        );
    }

    #[test]
    fn test_names_with_hex_escapes() {
        let tokens = all_tokens(b"/Type /A#42C /Lime#20Green");
        assert_eq!(
            tokens,
            vec![
                Token::Name("Type".into()),
                Token::Name("ABC".into()),
                Token::Name("Lime Green".into()),
            ]
        );
    }

    #[test]
    fn test_literal_string_escapes() {
        let tokens = all_tokens(b"(has \\(nested\\) parens) (octal \\101) (a(b)c)");
        assert_eq!(
            tokens,
            vec![
                Token::Str(b"has (nested) parens".to_vec()),
                Token::Str(b"octal A".to_vec()),
                Token::Str(b"a(b)c".to_vec()),
            ]
        );
    }

    #[test]
    fn test_line_continuation() {
        let tokens = all_tokens(b"(split\\\nline)");
        assert_eq!(tokens, vec![Token::Str(b"splitline".to_vec())]);
    }

    #[test]
    fn test_hex_strings() {
        let tokens = all_tokens(b"<48656C6C6F> <48 65 6C> <9>");
        assert_eq!(
            tokens,
            vec![
                Token::Str(b"Hello".to_vec()),
                Token::Str(b"Hel".to_vec()),
                Token::Str(vec![0x90]),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = all_tokens(b"12 % this is a comment\n/After");
        assert_eq!(tokens, vec![Token::Integer(12), Token::Name("After".into())]);
    }

    #[test]
    fn test_dict_delimiters() {
        let tokens = all_tokens(b"<< /K 1 >> [ 2 ]");
        assert_eq!(
            tokens,
            vec![
                Token::DictOpen,
                Token::Name("K".into()),
                Token::Integer(1),
                Token::DictClose,
                Token::ArrayOpen,
                Token::Integer(2),
                Token::ArrayClose,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let tokens = all_tokens(b"obj endobj stream true Tj");
        let words: Vec<String> = tokens
            .into_iter()
            .map(|t| match t {
                Token::Keyword(k) => k,
                other => panic!("expected keyword, got {other:?}"),
            })
            .collect();
        assert_eq!(words, ["obj", "endobj", "stream", "true", "Tj"]);
    }

    // ==================== Object parser ====================

    #[test]
    fn test_parse_reference() {
        let mut parser = ObjectParser::new(b"12 0 R");
        let obj = parser.parse_object().unwrap();
        assert_eq!(obj, Object::Reference(ObjRef::new(12, 0)));
    }

    #[test]
    fn test_two_integers_not_a_reference() {
        let mut parser = ObjectParser::new(b"[12 0 7]");
        let obj = parser.parse_object().unwrap();
        assert_eq!(
            obj,
            Object::Array(vec![
                Object::Integer(12),
                Object::Integer(0),
                Object::Integer(7),
            ])
        );
    }

    #[test]
    fn test_parse_nested_dict() {
        let mut parser =
            ObjectParser::new(b"<< /Type /Page /MediaBox [0 0 612 792] /Parent 2 0 R >>");
        let obj = parser.parse_object().unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Type").unwrap().as_name(), Some("Page"));
        assert_eq!(dict.get("MediaBox").unwrap().as_array().unwrap().len(), 4);
        assert_eq!(
            dict.get("Parent").unwrap().as_reference(),
            Some(ObjRef::new(2, 0))
        );
    }

    #[test]
    fn test_parse_booleans_and_null() {
        let mut parser = ObjectParser::new(b"[true false null]");
        let obj = parser.parse_object().unwrap();
        assert_eq!(
            obj,
            Object::Array(vec![
                Object::Boolean(true),
                Object::Boolean(false),
                Object::Null,
            ])
        );
    }

    #[test]
    fn test_mixed_array_with_references() {
        let mut parser = ObjectParser::new(b"[(text) 3 0 R /Name 4 5]");
        let obj = parser.parse_object().unwrap();
        let items = obj.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[1].as_reference(), Some(ObjRef::new(3, 0)));
        assert_eq!(items[3], Object::Integer(4));
        assert_eq!(items[4], Object::Integer(5));
    }

    #[test]
    fn test_unterminated_dict_fails() {
        let mut parser = ObjectParser::new(b"<< /K 1");
        assert!(parser.parse_object().is_err());
    }

    #[test]
    fn test_object_header() {
        let mut parser = ObjectParser::new(b"12 0 obj << /A 1 >> endobj");
        assert_eq!(parser.expect_object_header().unwrap(), (12, 0));
        assert!(parser.parse_object().unwrap().as_dict().is_some());

        let mut bad = ObjectParser::new(b"12 zero obj");
        assert!(bad.expect_object_header().is_err());
    }

    #[test]
    fn test_stream_eol_skipping() {
        let data = b"stream\r\nPAYLOAD";
        let mut lexer = Lexer::new(data);
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Keyword("stream".into())));
        lexer.skip_stream_eol();
        assert_eq!(&data[lexer.pos()..], b"PAYLOAD");
    }
}
