use crate::{
    direction::Direction,
    document::Document,
    error::{ErrorClass, ErrorOrigin},
    range::{FieldBound, RangeOp, SimpleRange},
    store::{CREATION_TIME_INDEX, IndexStore, MemoryStore, ScanRequest},
    value::Value,
};

fn seeded() -> (MemoryStore, Vec<String>) {
    let store = MemoryStore::new();
    let fields = store.define_index("messages", "by_channel", &["channel"]);
    for (channel, body) in [(2, "b"), (1, "a"), (2, "c"), (3, "d")] {
        store.insert(
            "messages",
            Document::new().with("channel", channel).with("body", body),
        );
    }

    (store, fields)
}

fn request(fields: &[String], range: SimpleRange, direction: Direction) -> ScanRequest {
    ScanRequest {
        table: "messages".to_string(),
        index: "by_channel".to_string(),
        index_fields: fields.to_vec(),
        range,
        direction,
    }
}

fn bodies(store: &MemoryStore, request: &ScanRequest) -> Vec<String> {
    store
        .scan(request)
        .expect("scan should open")
        .map(|row| {
            row.expect("row should load")
                .get("body")
                .and_then(Value::as_text)
                .map(str::to_string)
                .expect("seeded rows carry a body")
        })
        .collect()
}

#[test]
fn define_index_appends_system_fields_once() {
    let store = MemoryStore::new();

    assert_eq!(
        store.define_index("t", "by_a", &["a"]),
        vec!["a", "_creationTime", "_id"]
    );
    assert_eq!(
        store.define_index("t", "by_a_id", &["a", "_id"]),
        vec!["a", "_id", "_creationTime"]
    );
    assert_eq!(
        store
            .index_fields("t", CREATION_TIME_INDEX)
            .expect("creation-time index is implicit"),
        vec!["_creationTime", "_id"]
    );
}

#[test]
fn scan_orders_by_index_key_in_both_directions() {
    let (store, fields) = seeded();

    let asc = request(&fields, SimpleRange::default(), Direction::Asc);
    assert_eq!(bodies(&store, &asc), ["a", "b", "c", "d"]);

    let desc = request(&fields, SimpleRange::default(), Direction::Desc);
    assert_eq!(bodies(&store, &desc), ["d", "c", "b", "a"]);
}

#[test]
fn scan_applies_equality_and_inequality() {
    let (store, fields) = seeded();

    let range = SimpleRange::new(vec![FieldBound::new(
        RangeOp::Gte,
        "channel",
        Some(Value::Int(2)),
    )]);
    assert_eq!(
        bodies(&store, &request(&fields, range, Direction::Asc)),
        ["b", "c", "d"]
    );

    let range = SimpleRange::new(vec![FieldBound::new(
        RangeOp::Eq,
        "channel",
        Some(Value::Int(2)),
    )]);
    assert_eq!(
        bodies(&store, &request(&fields, range, Direction::Desc)),
        ["c", "b"]
    );
}

#[test]
fn scan_rejects_ranges_the_primitive_cannot_run() {
    let (store, fields) = seeded();

    let range = SimpleRange::new(vec![
        FieldBound::new(RangeOp::Gt, "channel", Some(Value::Int(1))),
        FieldBound::new(RangeOp::Eq, "_creationTime", Some(Value::Float(1.0))),
    ]);
    let err = store
        .scan(&request(&fields, range, Direction::Asc))
        .err()
        .expect("equality after an inequality should be rejected");
    assert_eq!(err.origin, ErrorOrigin::Range);
    assert!(err.is_invariant_violation());

    let range = SimpleRange::new(vec![FieldBound::new(
        RangeOp::Eq,
        "_id",
        Some(Value::text("x")),
    )]);
    assert!(store.scan(&request(&fields, range, Direction::Asc)).is_err());
}

#[test]
fn scan_reports_missing_tables_and_indexes() {
    let (store, fields) = seeded();

    let mut missing_table = request(&fields, SimpleRange::default(), Direction::Asc);
    missing_table.table = "users".to_string();
    let err = store
        .scan(&missing_table)
        .err()
        .expect("unknown table should fail");
    assert_eq!(err.class, ErrorClass::NotFound);

    let mut missing_index = request(&fields, SimpleRange::default(), Direction::Asc);
    missing_index.index = "by_author".to_string();
    let err = store
        .scan(&missing_index)
        .err()
        .expect("unknown index should fail");
    assert_eq!(err.class, ErrorClass::NotFound);
}

#[test]
fn injected_failure_fails_exactly_one_scan() {
    let (store, fields) = seeded();
    let all = request(&fields, SimpleRange::default(), Direction::Asc);

    store.fail_next_scan("store timed out");
    let err = store.scan(&all).err().expect("injected failure should surface");
    assert_eq!(err.origin, ErrorOrigin::Store);
    assert_eq!(err.class, ErrorClass::Internal);
    assert_eq!(err.message, "store timed out");

    assert_eq!(bodies(&store, &all).len(), 4);
}

#[test]
fn remove_where_drops_matching_rows() {
    let (store, _) = seeded();

    let removed = store.remove_where("messages", |doc| {
        doc.get("channel") == Some(&Value::Int(2))
    });
    assert_eq!(removed, 2);
    assert_eq!(store.len("messages"), 2);
    assert_eq!(store.remove_where("nothing", |_| true), 0);
}
