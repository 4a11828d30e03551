use crate::{
    config::StreamConfig,
    cursor::{Cursor, serialize_cursor},
    direction::Direction,
    document::Document,
    error::{ErrorClass, ErrorOrigin},
    key::{IndexBounds, IndexKey},
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    page::{Page, PageRequest, SplitAdvisory, paginate, paginate_with_config},
    store::MemoryStore,
    stream::{QueryStream, ScanStats},
    value::Value,
};
use std::{cell::RefCell, rc::Rc};

fn seeded(count: i64) -> Rc<MemoryStore> {
    let store = Rc::new(MemoryStore::new());
    store.define_index("items", "by_n", &["n"]);
    for n in 0..count {
        store.insert("items", Document::new().with("n", n));
    }

    store
}

fn items(store: &Rc<MemoryStore>, order: Direction) -> QueryStream {
    QueryStream::range(store.clone(), "items", "by_n", IndexBounds::unbounded(), order)
        .expect("index is defined")
}

fn ns(page: &Page) -> Vec<i64> {
    page.items
        .iter()
        .filter_map(|doc| doc.get("n").and_then(Value::as_int))
        .collect()
}

// Full index key of every row, in stream order.
fn keys(stream: &QueryStream) -> Vec<IndexKey> {
    stream
        .collect_rows(&mut ScanStats::default())
        .expect("stream should drain")
        .into_iter()
        .map(|(key, _)| key)
        .collect()
}

fn serve(stream: &QueryStream, request: &PageRequest) -> Page {
    paginate(stream, request, &mut ScanStats::default()).expect("page should be served")
}

#[test]
fn first_page_stops_at_the_item_target() {
    let store = seeded(10);
    let stream = items(&store, Direction::Asc);
    let keys = keys(&stream);

    let page = serve(&stream, &PageRequest::first(3));

    assert_eq!(ns(&page), [0, 1, 2]);
    assert!(page.has_more);
    assert_eq!(page.continue_cursor, serialize_cursor(&keys[2]));
    assert_eq!(page.rows_read, 3);
    assert_eq!(page.split_advisory, None);
    assert_eq!(page.split_cursor, None);

    let next = serve(&stream, &PageRequest::after(page.continue_cursor, 3));
    assert_eq!(ns(&next), [3, 4, 5]);
}

#[test]
fn exhausted_stream_ends_with_the_end_cursor() {
    let store = seeded(4);
    let stream = items(&store, Direction::Asc);

    let page = serve(&stream, &PageRequest::first(10));

    assert_eq!(ns(&page), [0, 1, 2, 3]);
    assert!(!page.has_more);
    assert_eq!(page.continue_cursor, Cursor::end());

    let after_end = serve(&stream, &PageRequest::after(Cursor::end(), 10));
    assert!(after_end.items.is_empty());
    assert!(!after_end.has_more);
}

#[test]
fn descending_pages_walk_backwards() {
    let store = seeded(5);
    let stream = items(&store, Direction::Desc);

    let first = serve(&stream, &PageRequest::first(2));
    let second = serve(&stream, &PageRequest::after(first.continue_cursor.clone(), 2));
    let third = serve(&stream, &PageRequest::after(second.continue_cursor.clone(), 2));

    assert_eq!(ns(&first), [4, 3]);
    assert_eq!(ns(&second), [2, 1]);
    assert_eq!(ns(&third), [0]);
    assert!(!third.has_more);
}

#[test]
fn zero_item_requests() {
    let store = seeded(3);
    let stream = items(&store, Direction::Asc);

    let err = paginate(&stream, &PageRequest::first(0), &mut ScanStats::default())
        .expect_err("nothing to resume from");
    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(err.origin, ErrorOrigin::Page);

    let cursor = serialize_cursor(&keys(&stream)[0]);
    let mut stats = ScanStats::default();
    let page = paginate(&stream, &PageRequest::after(cursor.clone(), 0), &mut stats)
        .expect("zero items after a cursor is fine");

    assert!(page.items.is_empty());
    assert!(page.has_more);
    assert_eq!(page.continue_cursor, cursor);
    assert_eq!(stats, ScanStats::default());
}

#[test]
fn zero_row_cap_is_rejected() {
    let store = seeded(3);
    let stream = items(&store, Direction::Asc);

    let err = paginate(
        &stream,
        &PageRequest::first(2).with_maximum_rows_read(0),
        &mut ScanStats::default(),
    )
    .expect_err("a page must be allowed to read something");

    assert!(err.is_unsupported());
    assert!(err.message.contains("at least 1"));
}

#[test]
fn row_cap_cuts_the_page_and_requires_a_split() {
    let store = seeded(10);
    let stream = items(&store, Direction::Asc)
        .filter_with(|doc| Ok(doc.get("n").and_then(Value::as_int).is_some_and(|n| n % 2 == 0)));
    let keys = keys(&stream);

    let page = serve(&stream, &PageRequest::first(10).with_maximum_rows_read(4));

    assert_eq!(ns(&page), [0, 2]);
    assert!(page.has_more);
    assert_eq!(page.rows_read, 4);
    assert_eq!(page.continue_cursor, serialize_cursor(&keys[3]));
    assert_eq!(page.split_advisory, Some(SplitAdvisory::Required));
    assert_eq!(page.split_cursor, Some(serialize_cursor(&keys[1])));
}

#[test]
fn filtered_reads_past_the_target_recommend_a_split() {
    let store = seeded(10);
    let stream = items(&store, Direction::Asc)
        .filter_with(|doc| Ok(doc.get("n").and_then(Value::as_int).is_some_and(|n| n % 3 == 0)));
    let keys = keys(&stream);

    let page = serve(&stream, &PageRequest::first(2));

    assert_eq!(ns(&page), [0, 3]);
    assert_eq!(page.rows_read, 4);
    assert_eq!(page.split_advisory, Some(SplitAdvisory::Recommended));
    assert_eq!(page.split_cursor, Some(serialize_cursor(&keys[1])));
}

#[test]
fn end_cursor_pins_the_page_end() {
    let store = seeded(6);
    let stream = items(&store, Direction::Asc);

    let original = serve(&stream, &PageRequest::first(3));
    assert_eq!(ns(&original), [0, 1, 2]);

    // A concurrent insert lands inside the served page.
    store.insert("items", Document::new().with("n", 1));

    let refetched = serve(
        &stream,
        &PageRequest::first(3).with_end_cursor(original.continue_cursor.clone()),
    );

    assert_eq!(ns(&refetched), [0, 1, 1, 2]);
    assert!(refetched.has_more);
    assert_eq!(refetched.continue_cursor, original.continue_cursor);

    let rest = serve(&stream, &PageRequest::after(refetched.continue_cursor, 10));
    assert_eq!(ns(&rest), [3, 4, 5]);
}

#[test]
fn end_cursor_at_the_end_reads_everything() {
    let store = seeded(4);
    let stream = items(&store, Direction::Asc);

    let page = serve(&stream, &PageRequest::first(1).with_end_cursor(Cursor::end()));

    assert_eq!(ns(&page), [0, 1, 2, 3]);
    assert!(!page.has_more);
    assert_eq!(page.continue_cursor, Cursor::end());
}

#[test]
fn malformed_cursors_are_rejected() {
    let store = seeded(2);
    let stream = items(&store, Direction::Asc);

    let err = paginate(
        &stream,
        &PageRequest::after(Cursor::new("not json"), 2),
        &mut ScanStats::default(),
    )
    .expect_err("cursor is not JSON");
    assert_eq!(err.origin, ErrorOrigin::Cursor);

    let config = StreamConfig {
        max_cursor_len: 4,
        ..StreamConfig::default()
    };
    let cursor = serialize_cursor(&keys(&stream)[0]);
    let err = paginate_with_config(
        &stream,
        &PageRequest::after(cursor, 2),
        &config,
        &mut ScanStats::default(),
    )
    .expect_err("cursor exceeds the configured length");
    assert!(err.message.contains("exceeds max length"));
}

#[test]
fn configured_row_cap_applies_unless_the_request_overrides_it() {
    let store = seeded(10);
    let stream = items(&store, Direction::Asc);
    let config = StreamConfig {
        maximum_rows_read: Some(2),
        ..StreamConfig::default()
    };

    let capped = paginate_with_config(
        &stream,
        &PageRequest::first(5),
        &config,
        &mut ScanStats::default(),
    )
    .expect("page should be served");
    assert_eq!(ns(&capped), [0, 1]);
    assert_eq!(capped.split_advisory, Some(SplitAdvisory::Required));

    let overridden = paginate_with_config(
        &stream,
        &PageRequest::first(5).with_maximum_rows_read(8),
        &config,
        &mut ScanStats::default(),
    )
    .expect("page should be served");
    assert_eq!(ns(&overridden), [0, 1, 2, 3, 4]);
    assert_eq!(overridden.split_advisory, None);
}

#[derive(Default)]
struct RecordingSink {
    events: RefCell<Vec<String>>,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        if matches!(event, MetricsEvent::PageServed { .. }) {
            self.events.borrow_mut().push(format!("{event:?}"));
        }
    }
}

#[test]
fn served_pages_are_reported_to_the_sink() {
    let store = seeded(3);
    let stream = items(&store, Direction::Asc);
    let sink = Rc::new(RecordingSink::default());

    with_metrics_sink(sink.clone(), || serve(&stream, &PageRequest::first(2)));

    assert_eq!(
        sink.events.borrow().as_slice(),
        [
            "PageServed { table: Some(\"items\"), items: 2, rows_read: 2, advisory: None }"
                .to_string()
        ]
    );
}
