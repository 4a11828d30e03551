use crate::value::{Value, ValueDecodeError};
use serde_json::json;

#[test]
fn canonical_order_ranks_variants_before_payloads() {
    let ordered = [
        Value::Null,
        Value::Int(-5),
        Value::Int(7),
        Value::Float(-1.5),
        Value::Float(f64::INFINITY),
        Value::Bool(false),
        Value::Bool(true),
        Value::text(""),
        Value::text("a"),
        Value::Bytes(vec![0]),
    ];

    for pair in ordered.windows(2) {
        assert!(
            pair[0] < pair[1],
            "expected {:?} to sort before {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn float_equality_follows_total_order() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    assert!(Value::Float(-0.0) < Value::Float(0.0));
}

#[test]
fn json_encoding_keeps_text_distinct_from_tagged_variants() {
    assert_eq!(Value::Int(42).to_json(), json!({ "$integer": "42" }));
    assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_json(), json!({ "$bytes": "ab01" }));
    assert_eq!(Value::text("$integer").to_json(), json!("$integer"));
    assert_eq!(Value::Float(f64::NAN).to_json(), json!({ "$float": "NaN" }));
}

#[test]
fn json_decoding_restores_each_variant() {
    let values = [
        Value::Null,
        Value::Int(i64::MIN),
        Value::Float(2.5),
        Value::Float(f64::NEG_INFINITY),
        Value::Bool(true),
        Value::text("undefined"),
        Value::Bytes(vec![1, 2, 255]),
    ];

    for value in values {
        let decoded = Value::from_json(&value.to_json()).expect("encoded value should decode");
        assert_eq!(decoded, value);
    }
}

#[test]
fn json_decoding_rejects_unknown_and_malformed_tags() {
    let err = Value::from_json(&json!({ "$date": "2024" })).expect_err("unknown tag must fail");
    assert_eq!(
        err,
        ValueDecodeError::UnknownTag {
            tag: "$date".to_string()
        }
    );

    let err = Value::from_json(&json!({ "$integer": "1", "$bytes": "00" }))
        .expect_err("two-key object must fail");
    assert_eq!(err, ValueDecodeError::MalformedTag);

    let err = Value::from_json(&json!([1])).expect_err("arrays are not scalars");
    assert_eq!(err, ValueDecodeError::UnsupportedJson { kind: "array" });

    assert!(Value::from_json(&json!({ "$bytes": "abc" })).is_err());
}
