//! Module: cursor
//! Responsibility: the opaque text form of a resumable index position.
//! Does not own: how a position narrows a stream; that is the paginator's job.
//! Boundary: every cursor handed to or accepted from callers passes through here.

#[cfg(test)]
mod tests;

use crate::{
    ABSENT_MARKER, MAX_CURSOR_LEN,
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::IndexKey,
    value::{Value, ValueDecodeError},
};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error as ThisError;

// Cursor text of the empty key.
const END_CURSOR: &str = "[]";

// Prefix added to real text values that would otherwise read as the marker.
const ESCAPE_PREFIX: char = '_';

///
/// CursorDecodeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum CursorDecodeError {
    #[error("cursor is empty")]
    Empty,

    #[error("cursor exceeds max length: {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor is not valid json: {reason}")]
    Json { reason: String },

    #[error("cursor must encode a json array")]
    NotArray,

    #[error("cursor slot {position} is invalid: {source}")]
    Value {
        position: usize,
        source: ValueDecodeError,
    },

    #[error("cursor slot {position} ends with the absent marker but is not escaped")]
    UnescapedMarker { position: usize },
}

impl From<CursorDecodeError> for InternalError {
    fn from(err: CursorDecodeError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Cursor, err.to_string())
    }
}

///
/// Cursor
///
/// Serialized index key marking a resumable position. The empty key (`"[]"`)
/// is the end-of-range cursor: resuming from it yields nothing.
///

#[derive(Clone, Debug, Deref, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn end() -> Self {
        Self(END_CURSOR.to_string())
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.0 == END_CURSOR
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Cursor {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Encode `key` as cursor text.
///
/// The absent marker becomes the literal text `"undefined"`; real text that
/// ends in `"undefined"` gains one leading underscore so the two never collide.
#[must_use]
pub fn serialize_cursor(key: &IndexKey) -> Cursor {
    let slots = key.iter().map(|slot| match slot {
        None => JsonValue::String(ABSENT_MARKER.to_string()),
        Some(Value::Text(text)) if text.ends_with(ABSENT_MARKER) => {
            JsonValue::String(format!("{ESCAPE_PREFIX}{text}"))
        }
        Some(value) => value.to_json(),
    });

    Cursor(JsonValue::Array(slots.collect()).to_string())
}

/// Decode cursor text produced by [`serialize_cursor`].
pub fn deserialize_cursor(cursor: &str) -> Result<IndexKey, CursorDecodeError> {
    deserialize_cursor_with_limit(cursor, MAX_CURSOR_LEN)
}

/// Decode cursor text, rejecting anything longer than `max_len` bytes.
pub fn deserialize_cursor_with_limit(
    cursor: &str,
    max_len: usize,
) -> Result<IndexKey, CursorDecodeError> {
    if cursor.trim().is_empty() {
        return Err(CursorDecodeError::Empty);
    }
    if cursor.len() > max_len {
        return Err(CursorDecodeError::TooLong {
            len: cursor.len(),
            max: max_len,
        });
    }

    let json: JsonValue =
        serde_json::from_str(cursor).map_err(|err| CursorDecodeError::Json {
            reason: err.to_string(),
        })?;
    let JsonValue::Array(slots) = json else {
        return Err(CursorDecodeError::NotArray);
    };

    slots
        .iter()
        .enumerate()
        .map(|(position, slot)| decode_slot(position, slot))
        .collect()
}

fn decode_slot(position: usize, slot: &JsonValue) -> Result<Option<Value>, CursorDecodeError> {
    if let JsonValue::String(text) = slot {
        if text == ABSENT_MARKER {
            return Ok(None);
        }
        if text.ends_with(ABSENT_MARKER) {
            return text
                .strip_prefix(ESCAPE_PREFIX)
                .map(|unescaped| Some(Value::text(unescaped)))
                .ok_or(CursorDecodeError::UnescapedMarker { position });
        }
    }

    Value::from_json(slot)
        .map(Some)
        .map_err(|source| CursorDecodeError::Value { position, source })
}
