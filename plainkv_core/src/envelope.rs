//! The self-describing text envelope that carries a value and its metadata.
//!
//! Every stored entry is a single compact JSON object:
//!
//! ```json
//! {"value": <json-value>, "metadata": <json-object>}
//! ```
//!
//! or, when the top-level value is binary:
//!
//! ```json
//! {"value": "<base64>", "encoding": "base64", "original_encoding": "<name>", "metadata": <json-object>}
//! ```
//!
//! Two quirks of the format are wire-stable and deliberately kept:
//!
//! - Binary payloads are only representable at the top level. A binary
//!   payload nested inside a list or map fails with
//!   [`EnvelopeError::UnsupportedShape`] instead of producing a lossy
//!   envelope; the format defines no encoding for that case yet.
//! - `original_encoding` is recorded on encode but not restored on decode:
//!   a decoded binary payload always carries the default source-encoding
//!   tag. The bytes themselves are restored exactly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value::{Binary, Metadata, Value};

const ENCODING_BASE64: &str = "base64";

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("binary value nested inside {0} is not supported")]
    UnsupportedShape(&'static str),
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("non-finite float {0} cannot be written to an envelope")]
    NonFiniteFloat(f64),
}

/// Wire shape of a stored entry.
///
/// Field order here is field order on the wire. Decoding does not depend
/// on it, but the fixed order keeps envelopes byte-comparable.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    value: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_encoding: Option<String>,
    metadata: Json,
}

/// Serializes a value and its metadata into envelope text.
///
/// A top-level `Bytes` value travels as base64 with `encoding` and
/// `original_encoding` markers. `Bytes` anywhere below the top level
/// (including inside metadata) fails with
/// [`EnvelopeError::UnsupportedShape`].
pub fn encode(value: &Value, metadata: &Metadata) -> Result<String, EnvelopeError> {
    let envelope = match value {
        Value::Bytes(binary) => Envelope {
            value: Json::String(BASE64.encode(binary.bytes())),
            encoding: Some(ENCODING_BASE64.to_owned()),
            original_encoding: Some(binary.source_encoding().to_owned()),
            metadata: map_to_json(metadata, "metadata")?,
        },
        other => Envelope {
            value: to_json(other, "the envelope")?,
            encoding: None,
            original_encoding: None,
            metadata: map_to_json(metadata, "metadata")?,
        },
    };
    serde_json::to_string(&envelope).map_err(|err| EnvelopeError::MalformedEnvelope(err.to_string()))
}

/// Reconstructs a value and its metadata from envelope text.
///
/// Fails with [`EnvelopeError::MalformedEnvelope`] if the text is not a
/// valid envelope, and with [`EnvelopeError::InvalidBase64`] if an encoding
/// marker is present but the payload is not valid base64.
pub fn decode(text: &str) -> Result<(Value, Metadata), EnvelopeError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|err| EnvelopeError::MalformedEnvelope(err.to_string()))?;

    let metadata = match envelope.metadata {
        Json::Object(entries) => object_to_map(entries)?,
        other => {
            return Err(EnvelopeError::MalformedEnvelope(format!(
                "metadata must be an object, got {}",
                json_type_name(&other)
            )));
        }
    };

    let value = match envelope.encoding.as_deref() {
        Some(ENCODING_BASE64) => {
            let Json::String(payload) = envelope.value else {
                return Err(EnvelopeError::MalformedEnvelope(
                    "base64 encoding declared on a non-string value".to_owned(),
                ));
            };
            let bytes = BASE64.decode(payload.as_bytes())?;
            // The recorded original_encoding is not restored; decoded
            // binary always carries the default tag.
            Value::Bytes(Binary::new(bytes))
        }
        Some(other) => {
            return Err(EnvelopeError::MalformedEnvelope(format!(
                "unknown encoding {other:?}"
            )));
        }
        None => from_json(envelope.value)?,
    };

    Ok((value, metadata))
}

fn to_json(value: &Value, container: &'static str) -> Result<Json, EnvelopeError> {
    match value {
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Integer(n) => Ok(Json::from(*n)),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or(EnvelopeError::NonFiniteFloat(*f)),
        Value::Text(s) => Ok(Json::String(s.clone())),
        Value::Bytes(_) => Err(EnvelopeError::UnsupportedShape(container)),
        Value::List(items) => items
            .iter()
            .map(|item| to_json(item, "a list"))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array),
        Value::Map(entries) => {
            let mut object = serde_json::Map::with_capacity(entries.len());
            for (key, entry) in entries {
                object.insert(key.clone(), to_json(entry, "a map")?);
            }
            Ok(Json::Object(object))
        }
    }
}

fn map_to_json(entries: &Metadata, container: &'static str) -> Result<Json, EnvelopeError> {
    let mut object = serde_json::Map::with_capacity(entries.len());
    for (key, entry) in entries {
        object.insert(key.clone(), to_json(entry, container)?);
    }
    Ok(Json::Object(object))
}

fn from_json(json: Json) -> Result<Value, EnvelopeError> {
    match json {
        Json::Null => Err(EnvelopeError::MalformedEnvelope(
            "null is not a storable value".to_owned(),
        )),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if n.is_u64() {
                Err(EnvelopeError::MalformedEnvelope(format!(
                    "integer {n} is out of range"
                )))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(EnvelopeError::MalformedEnvelope(format!(
                    "unrepresentable number {n}"
                )))
            }
        }
        Json::String(s) => Ok(Value::Text(s)),
        Json::Array(items) => items
            .into_iter()
            .map(from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Json::Object(entries) => Ok(Value::Map(object_to_map(entries)?)),
    }
}

fn object_to_map(
    entries: serde_json::Map<String, Json>,
) -> Result<IndexMap<String, Value>, EnvelopeError> {
    let mut map = IndexMap::with_capacity(entries.len());
    for (key, entry) in entries {
        map.insert(key, from_json(entry)?);
    }
    Ok(map)
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo_bar_baz_42() -> Metadata {
        IndexMap::from([
            ("foo".to_owned(), Value::from("bar")),
            ("baz".to_owned(), Value::from(42i64)),
        ])
    }

    #[test]
    fn test_encode_bool() {
        let text = encode(&Value::Bool(true), &foo_bar_baz_42()).unwrap();
        assert_eq!(text, r#"{"value":true,"metadata":{"foo":"bar","baz":42}}"#);
    }

    #[test]
    fn test_encode_text() {
        let text = encode(&Value::from("some string"), &Metadata::new()).unwrap();
        assert_eq!(text, r#"{"value":"some string","metadata":{}}"#);
    }

    #[test]
    fn test_encode_integer() {
        let text = encode(&Value::Integer(255), &Metadata::new()).unwrap();
        assert_eq!(text, r#"{"value":255,"metadata":{}}"#);
    }

    #[test]
    fn test_encode_float_keeps_fractional_precision() {
        let metadata = IndexMap::from([(
            "foo".to_owned(),
            Value::Map(IndexMap::from([("bar".to_owned(), Value::from("baz"))])),
        )]);
        let text = encode(&Value::Float(2.3849), &metadata).unwrap();
        assert_eq!(text, r#"{"value":2.3849,"metadata":{"foo":{"bar":"baz"}}}"#);
    }

    #[test]
    fn test_encode_list_of_text() {
        let value = Value::List(vec![
            Value::from("valid UTF-8 1"),
            Value::from("valid UTF-8 2"),
        ]);
        let text = encode(&value, &foo_bar_baz_42()).unwrap();
        assert_eq!(
            text,
            r#"{"value":["valid UTF-8 1","valid UTF-8 2"],"metadata":{"foo":"bar","baz":42}}"#
        );
    }

    #[test]
    fn test_encode_nested_map() {
        let value = Value::Map(IndexMap::from([
            ("key1".to_owned(), Value::from("test_string")),
            ("key2".to_owned(), Value::from(1000i64)),
            ("key3".to_owned(), Value::from(false)),
            (
                "key4".to_owned(),
                Value::Map(IndexMap::from([(
                    "nestedkey1".to_owned(),
                    Value::from("nested_test_string"),
                )])),
            ),
        ]));
        let text = encode(&value, &foo_bar_baz_42()).unwrap();
        assert_eq!(
            text,
            r#"{"value":{"key1":"test_string","key2":1000,"key3":false,"key4":{"nestedkey1":"nested_test_string"}},"metadata":{"foo":"bar","baz":42}}"#
        );
    }

    #[test]
    fn test_encode_top_level_binary() {
        let value = Value::from_raw(vec![0xff, 0xfe, 0xfd]);
        assert!(value.is_binary());
        let text = encode(&value, &foo_bar_baz_42()).unwrap();
        assert_eq!(
            text,
            r#"{"value":"//79","encoding":"base64","original_encoding":"ASCII-8BIT","metadata":{"foo":"bar","baz":42}}"#
        );
    }

    #[test]
    fn test_binary_round_trip_is_byte_exact() {
        // A payload with invalid sequences scattered through valid text,
        // the shape of a real keytab file.
        let mut payload = b"\x05\x02key material ".to_vec();
        payload.extend_from_slice(&[0xff, 0xc0, 0x80, 0x00, 0x9f]);
        payload.extend_from_slice(b" trailing");

        let value = Value::from_raw(payload.clone());
        let metadata = foo_bar_baz_42();
        let text = encode(&value, &metadata).unwrap();

        let (decoded, decoded_metadata) = decode(&text).unwrap();
        assert_eq!(decoded.as_bytes().unwrap().as_ref(), payload.as_slice());
        assert_eq!(decoded, value);
        assert_eq!(decoded_metadata, metadata);
    }

    #[test]
    fn test_original_encoding_is_not_restored_on_decode() {
        let value = Value::Bytes(Binary::with_source_encoding(vec![0xff, 0x00], "UTF-16"));
        let text = encode(&value, &Metadata::new()).unwrap();
        assert!(text.contains(r#""original_encoding":"UTF-16""#));

        let (decoded, _) = decode(&text).unwrap();
        match &decoded {
            Value::Bytes(binary) => {
                assert_eq!(binary.source_encoding(), "ASCII-8BIT");
            }
            other => panic!("expected Bytes, got {other:?}"),
        }
        // Bytes-only equality still makes the round trip compare equal.
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_round_trip_every_plain_shape() {
        let metadata = foo_bar_baz_42();
        let values = vec![
            Value::Bool(false),
            Value::Integer(-9000),
            Value::Float(0.5),
            Value::from("plain text"),
            Value::List(vec![Value::from(1i64), Value::from("two"), Value::Bool(true)]),
            Value::Map(IndexMap::from([
                ("list".to_owned(), Value::List(vec![Value::Float(1.25)])),
                ("flag".to_owned(), Value::Bool(true)),
            ])),
        ];
        for value in values {
            let text = encode(&value, &metadata).unwrap();
            let (decoded, decoded_metadata) = decode(&text).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(decoded_metadata, metadata);
        }
    }

    #[test]
    fn test_binary_in_list_is_rejected() {
        let value = Value::List(vec![
            Value::from("valid"),
            Value::from_raw(vec![0xff, 0xfe]),
        ]);
        let err = encode(&value, &Metadata::new()).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedShape("a list")));
    }

    #[test]
    fn test_binary_in_map_is_rejected() {
        let value = Value::Map(IndexMap::from([
            ("key1".to_owned(), Value::from_raw(vec![0xff, 0xfe])),
            ("key2".to_owned(), Value::from(1000i64)),
        ]));
        let err = encode(&value, &Metadata::new()).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedShape("a map")));
    }

    #[test]
    fn test_binary_nested_deep_is_rejected() {
        let value = Value::Map(IndexMap::from([(
            "outer".to_owned(),
            Value::List(vec![Value::from_raw(vec![0xff])]),
        )]));
        let err = encode(&value, &Metadata::new()).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedShape(_)));
    }

    #[test]
    fn test_binary_in_metadata_is_rejected() {
        let metadata = IndexMap::from([(
            "blob".to_owned(),
            Value::from_raw(vec![0xff, 0x00]),
        )]);
        let err = encode(&Value::Bool(true), &metadata).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedShape("metadata")));
    }

    #[test]
    fn test_encode_non_finite_float_fails() {
        let err = encode(&Value::Float(f64::NAN), &Metadata::new()).unwrap_err();
        assert!(matches!(err, EnvelopeError::NonFiniteFloat(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_missing_value() {
        let err = decode(r#"{"metadata":{}}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_missing_metadata() {
        let err = decode(r#"{"value":true}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_non_object_metadata() {
        let err = decode(r#"{"value":true,"metadata":[1,2]}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_null_value() {
        let err = decode(r#"{"value":null,"metadata":{}}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        let err = decode(r#"{"value":"eA==","encoding":"base32","metadata":{}}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_base64_on_non_string() {
        let err = decode(r#"{"value":42,"encoding":"base64","metadata":{}}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_base64_payload() {
        let err = decode(r#"{"value":"!!not base64!!","encoding":"base64","metadata":{}}"#)
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidBase64(_)));
    }

    #[test]
    fn test_decode_rejects_integer_beyond_i64() {
        let err = decode(r#"{"value":9223372036854775808,"metadata":{}}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_integral_number_is_integer_not_float() {
        let (value, _) = decode(r#"{"value":255,"metadata":{}}"#).unwrap();
        assert_eq!(value, Value::Integer(255));
    }

    #[test]
    fn test_decode_fractional_number_is_float() {
        let (value, _) = decode(r#"{"value":2.3849,"metadata":{}}"#).unwrap();
        assert_eq!(value, Value::Float(2.3849));
    }
}
