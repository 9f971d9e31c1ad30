//! Classification of string-shaped payloads as text or binary.
//!
//! The envelope format is text-based, so every string-shaped payload has to
//! be sorted into one of two buckets before it can travel: well-formed UTF-8
//! that can be written as a JSON string literal, or raw bytes that must be
//! transported as base64. Everything downstream depends on this
//! classification being derived from the data itself.

/// Encoding name recorded as `original_encoding` for payloads that failed
/// text validation. This is the conventional label for untyped 8-bit data
/// in the stores this wire format is compatible with.
pub const BINARY_SOURCE_ENCODING: &str = "ASCII-8BIT";

/// Result of classifying a byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The payload is well-formed UTF-8 and can travel as a string literal.
    TextSafe,
    /// The payload contains at least one malformed sequence and must be
    /// transported as base64. Carries the original byte length.
    Binary { len: usize },
}

/// Classifies a byte payload as text-safe or binary.
///
/// The check is exact: a single malformed byte anywhere classifies the
/// whole payload as binary.
pub fn classify(bytes: &[u8]) -> Classification {
    match std::str::from_utf8(bytes) {
        Ok(_) => Classification::TextSafe,
        Err(_) => Classification::Binary { len: bytes.len() },
    }
}
