//! Low-level PDF object model.
//!
//! Every value a PDF file can carry is one variant of [`Object`], a closed
//! sum type. Consumers match exhaustively; unsupported shapes fail at the
//! match site instead of deep inside a dynamic lookup.

use std::collections::HashMap;

/// Dictionary mapping name keys to objects.
pub type Dict = HashMap<String, Object>;

/// Reference to an indirect object: `number generation R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub number: u32,
    pub generation: u16,
}

impl ObjRef {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

/// A stream object: dictionary plus payload bytes.
///
/// `data` holds the bytes as stored in the file, already decrypted when the
/// document carries a security handler. Filter decoding is applied on
/// demand by the document, never here.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dict,
    pub data: Vec<u8>,
}

impl Stream {
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Self { dict, data }
    }
}

/// A parsed PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Raw string bytes; text encoding is the consumer's concern.
    String(Vec<u8>),
    Name(String),
    Array(Vec<Object>),
    Dict(Dict),
    Stream(Box<Stream>),
    Reference(ObjRef),
}

impl Object {
    /// Variant name for diagnostics ("expected X, got Y").
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(_) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dict(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value of an Integer or Real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Integer(n) => Some(*n as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(d) => Some(d),
            // A stream's dictionary answers dictionary lookups too.
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Dictionary access for structure-critical paths.
    pub fn expect_dict(&self, what: &str) -> crate::Result<&Dict> {
        self.as_dict().ok_or_else(|| {
            crate::Error::Malformed(format!("{what}: expected dictionary, got {}", self.type_name()))
        })
    }

    /// Stream access for structure-critical paths.
    pub fn expect_stream(&self, what: &str) -> crate::Result<&Stream> {
        self.as_stream().ok_or_else(|| {
            crate::Error::Malformed(format!("{what}: expected stream, got {}", self.type_name()))
        })
    }

    /// Integer access for structure-critical paths.
    pub fn expect_i64(&self, what: &str) -> crate::Result<i64> {
        self.as_i64().ok_or_else(|| {
            crate::Error::Malformed(format!("{what}: expected integer, got {}", self.type_name()))
        })
    }
}

/// Lenient integer lookup on a dictionary.
pub fn dict_get_i64(dict: &Dict, key: &str) -> Option<i64> {
    dict.get(key).and_then(Object::as_i64)
}

/// Lenient name lookup on a dictionary.
pub fn dict_get_name<'a>(dict: &'a Dict, key: &str) -> Option<&'a str> {
    dict.get(key).and_then(Object::as_name)
}
