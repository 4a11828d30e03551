use crate::{
    cursor::{
        Cursor, CursorDecodeError, deserialize_cursor, deserialize_cursor_with_limit,
        serialize_cursor,
    },
    error::ErrorOrigin,
    error::InternalError,
    key::IndexKey,
    value::Value,
};
use proptest::prelude::*;

fn round_trip(key: &IndexKey) -> IndexKey {
    deserialize_cursor(&serialize_cursor(key)).expect("serialized cursor should decode")
}

#[test]
fn absent_marker_and_literal_text_do_not_collide() {
    let key = IndexKey::new(vec![
        None,
        Some(Value::text("undefined")),
        Some(Value::text("_undefined")),
        Some(Value::text("__undefined")),
        Some(Value::text("not undefined")),
    ]);

    let cursor = serialize_cursor(&key);
    assert_eq!(
        cursor.as_str(),
        r#"["undefined","_undefined","__undefined","___undefined","_not undefined"]"#
    );
    assert_eq!(round_trip(&key), key);
}

#[test]
fn typed_values_survive_the_round_trip() {
    let key = IndexKey::new(vec![
        Some(Value::Null),
        Some(Value::Int(-42)),
        Some(Value::Float(1.5)),
        Some(Value::Float(f64::INFINITY)),
        Some(Value::Bool(true)),
        Some(Value::Bytes(vec![0, 255])),
        Some(Value::text("1")),
    ]);

    assert_eq!(round_trip(&key), key);
}

#[test]
fn empty_key_is_the_end_cursor() {
    let cursor = serialize_cursor(&IndexKey::empty());

    assert_eq!(cursor, Cursor::end());
    assert!(cursor.is_end());
    assert_eq!(round_trip(&IndexKey::empty()), IndexKey::empty());
}

#[test]
fn decode_rejects_malformed_input() {
    assert_eq!(deserialize_cursor(""), Err(CursorDecodeError::Empty));
    assert_eq!(deserialize_cursor("  "), Err(CursorDecodeError::Empty));
    assert_eq!(
        deserialize_cursor(r#"{"a":1}"#),
        Err(CursorDecodeError::NotArray)
    );
    assert!(matches!(
        deserialize_cursor("[1,"),
        Err(CursorDecodeError::Json { .. })
    ));
    assert!(matches!(
        deserialize_cursor("[[1]]"),
        Err(CursorDecodeError::Value { position: 0, .. })
    ));
    assert_eq!(
        deserialize_cursor(r#"[1.0,"xundefined"]"#),
        Err(CursorDecodeError::UnescapedMarker { position: 1 })
    );
}

#[test]
fn decode_enforces_length_limit() {
    let cursor = serialize_cursor(&IndexKey::from_values([Value::text("x".repeat(32))]));
    let len = cursor.len();

    assert!(deserialize_cursor_with_limit(&cursor, len).is_ok());
    assert_eq!(
        deserialize_cursor_with_limit(&cursor, len - 1),
        Err(CursorDecodeError::TooLong { len, max: len - 1 })
    );
}

#[test]
fn decode_errors_convert_with_cursor_origin() {
    let err: InternalError = CursorDecodeError::NotArray.into();

    assert_eq!(err.origin, ErrorOrigin::Cursor);
    assert!(err.is_unsupported());
}

#[test]
fn cursor_serializes_as_plain_string() {
    let cursor = serialize_cursor(&IndexKey::from_values([Value::Int(3)]));
    let json = serde_json::to_string(&cursor).expect("cursor should serialize");

    assert_eq!(json, r#""[{\"$integer\":\"3\"}]""#);
    let back: Cursor = serde_json::from_str(&json).expect("cursor should deserialize");
    assert_eq!(back, cursor);
}

///
/// PROPERTIES
///

fn text_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        "[a-z_]{0,6}",
        "_{0,3}undefined",
        "[a-z]{0,3}undefined",
    ]
    .boxed()
}

fn slot_strategy() -> BoxedStrategy<Option<Value>> {
    prop_oneof![
        Just(None::<Value>),
        Just(Some(Value::Null)),
        any::<i64>().prop_map(|v| Some(Value::Int(v))),
        (-1.0e9f64..1.0e9).prop_map(|v| Some(Value::Float(v))),
        any::<bool>().prop_map(|v| Some(Value::Bool(v))),
        prop::collection::vec(any::<u8>(), 0..4).prop_map(|v| Some(Value::Bytes(v))),
        text_strategy().prop_map(|t| Some(Value::Text(t))),
    ]
    .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_key_round_trips(slots in prop::collection::vec(slot_strategy(), 0..6)) {
        let key = IndexKey::new(slots);
        prop_assert_eq!(round_trip(&key), key);
    }
}
