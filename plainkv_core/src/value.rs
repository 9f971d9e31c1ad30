//! The in-memory model of storable values.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::encoding::{self, BINARY_SOURCE_ENCODING, Classification};

/// Metadata attached to a stored value.
///
/// May be empty and may nest arbitrarily, with the same shapes as ordinary
/// values. Key insertion order is preserved on the wire but carries no
/// meaning; equality ignores it.
pub type Metadata = IndexMap<String, Value>;

/// A raw byte payload plus the name of the encoding it was tagged with on
/// ingest.
///
/// The tag is recorded as `original_encoding` when the payload is written
/// at the top level of an envelope. It is ingest bookkeeping, not content:
/// equality is byte-for-byte, and decoding an envelope always reconstructs
/// the payload with the default tag regardless of what was recorded.
#[derive(Debug, Clone)]
pub struct Binary {
    bytes: Bytes,
    source_encoding: String,
}

impl Binary {
    /// Wraps raw bytes with the default source-encoding tag.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self::with_source_encoding(bytes, BINARY_SOURCE_ENCODING)
    }

    /// Wraps raw bytes tagged with the named source encoding.
    pub fn with_source_encoding(
        bytes: impl Into<Bytes>,
        source_encoding: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            source_encoding: source_encoding.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn source_encoding(&self) -> &str {
        &self.source_encoding
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Byte-for-byte. The source-encoding tag is excluded so that a decoded
// payload compares equal to the one that was encoded.
impl PartialEq for Binary {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Binary {}

/// A storable value.
///
/// Closed, recursive sum type; all codec logic matches on it exhaustively,
/// so adding a variant forces every consumer to be updated.
///
/// The `Text`/`Bytes` split is the crux of the model: `Text` holds only
/// well-formed UTF-8 (guaranteed by `String`), and any payload that fails
/// that validation must live in `Bytes`. String-shaped data of unknown
/// validity therefore has to enter through [`Value::from_raw`], which runs
/// the classifier — the variant is derived from the data, never declared
/// by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Binary),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Ingests a string-shaped payload of unknown validity.
    ///
    /// Runs the encoding classifier and picks `Text` or `Bytes`
    /// accordingly. A single malformed byte anywhere makes the whole
    /// payload `Bytes`.
    pub fn from_raw(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        match encoding::classify(&bytes) {
            Classification::TextSafe => {
                // Lossless: the classifier just validated the payload.
                Value::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            Classification::Binary { .. } => Value::Bytes(Binary::new(bytes)),
        }
    }

    /// Returns true for `Bytes` payloads.
    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(binary) => Some(binary.bytes()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    // &str is well-formed UTF-8 by construction, no classification needed.
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}
