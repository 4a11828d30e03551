//! Generic value-to-text encoding.
//!
//! Null, booleans, text, and finite floats map onto plain JSON. Integers,
//! bytes, and non-finite floats use single-key tagged objects so that no
//! `Value::Text` can ever decode as another variant.

use crate::value::Value;
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt::Write as _;
use thiserror::Error as ThisError;

const INTEGER_TAG: &str = "$integer";
const BYTES_TAG: &str = "$bytes";
const FLOAT_TAG: &str = "$float";

///
/// ValueDecodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ValueDecodeError {
    #[error("json {kind} is not a scalar index value")]
    UnsupportedJson { kind: &'static str },

    #[error("tagged value must be an object with exactly one key")]
    MalformedTag,

    #[error("unknown value tag '{tag}'")]
    UnknownTag { tag: String },

    #[error("invalid '{tag}' payload: {reason}")]
    InvalidPayload { tag: &'static str, reason: String },
}

impl Value {
    /// Encode this value as JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(value) => JsonValue::Bool(*value),
            Self::Text(text) => JsonValue::String(text.clone()),
            Self::Int(value) => tagged(INTEGER_TAG, value.to_string()),
            Self::Bytes(bytes) => tagged(BYTES_TAG, encode_hex(bytes)),
            Self::Float(value) => match Number::from_f64(*value) {
                Some(number) => JsonValue::Number(number),
                None => tagged(FLOAT_TAG, non_finite_label(*value).to_string()),
            },
        }
    }

    /// Decode one value previously produced by [`Value::to_json`].
    pub fn from_json(json: &JsonValue) -> Result<Self, ValueDecodeError> {
        match json {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(value) => Ok(Self::Bool(*value)),
            JsonValue::String(text) => Ok(Self::Text(text.clone())),
            JsonValue::Number(number) => number.as_f64().map(Self::Float).ok_or_else(|| {
                ValueDecodeError::InvalidPayload {
                    tag: FLOAT_TAG,
                    reason: format!("number {number} is not representable"),
                }
            }),
            JsonValue::Object(object) => decode_tagged(object),
            JsonValue::Array(_) => Err(ValueDecodeError::UnsupportedJson { kind: "array" }),
        }
    }
}

fn tagged(tag: &str, payload: String) -> JsonValue {
    let mut object = Map::with_capacity(1);
    object.insert(tag.to_string(), JsonValue::String(payload));

    JsonValue::Object(object)
}

fn decode_tagged(object: &Map<String, JsonValue>) -> Result<Value, ValueDecodeError> {
    let mut entries = object.iter();
    let (Some((tag, payload)), None) = (entries.next(), entries.next()) else {
        return Err(ValueDecodeError::MalformedTag);
    };
    let JsonValue::String(payload) = payload else {
        return Err(ValueDecodeError::MalformedTag);
    };

    match tag.as_str() {
        INTEGER_TAG => payload
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|err| ValueDecodeError::InvalidPayload {
                tag: INTEGER_TAG,
                reason: err.to_string(),
            }),
        BYTES_TAG => decode_hex(payload).map(Value::Bytes),
        FLOAT_TAG => match payload.as_str() {
            "NaN" => Ok(Value::Float(f64::NAN)),
            "Infinity" => Ok(Value::Float(f64::INFINITY)),
            "-Infinity" => Ok(Value::Float(f64::NEG_INFINITY)),
            other => Err(ValueDecodeError::InvalidPayload {
                tag: FLOAT_TAG,
                reason: format!("'{other}' is not a non-finite float label"),
            }),
        },
        other => Err(ValueDecodeError::UnknownTag {
            tag: other.to_string(),
        }),
    }
}

const fn non_finite_label(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn decode_hex(text: &str) -> Result<Vec<u8>, ValueDecodeError> {
    if !text.len().is_multiple_of(2) {
        return Err(ValueDecodeError::InvalidPayload {
            tag: BYTES_TAG,
            reason: "odd number of hex characters".to_string(),
        });
    }

    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for (idx, pair) in bytes.chunks_exact(2).enumerate() {
        let (Some(hi), Some(lo)) = (decode_hex_nibble(pair[0]), decode_hex_nibble(pair[1])) else {
            return Err(ValueDecodeError::InvalidPayload {
                tag: BYTES_TAG,
                reason: format!("invalid hex at position {}", idx * 2),
            });
        };
        out.push((hi << 4) | lo);
    }

    Ok(out)
}

const fn decode_hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
