use crate::{
    direction::Direction,
    error::ErrorOrigin,
    key::{BoundKey, BoundKind, IndexBounds, IndexKey, compare_bound_keys},
    value::Value,
};
use proptest::prelude::*;
use std::cmp::Ordering;

fn key(values: &[i64]) -> IndexKey {
    IndexKey::from_values(values.iter().copied().map(Value::Int))
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn shared_prefix_decides_before_length_or_kind() {
    let left = BoundKey::successor(key(&[1, 9]));
    let right = BoundKey::predecessor(key(&[2]));

    assert_eq!(compare_bound_keys(&left, &right), Ordering::Less);
    assert_eq!(compare_bound_keys(&right, &left), Ordering::Greater);
}

#[test]
fn same_length_breaks_ties_by_kind() {
    let pred = BoundKey::predecessor(key(&[2, 3]));
    let exact = BoundKey::exact(key(&[2, 3]));
    let succ = BoundKey::successor(key(&[2, 3]));

    assert_eq!(compare_bound_keys(&pred, &exact), Ordering::Less);
    assert_eq!(compare_bound_keys(&exact, &succ), Ordering::Less);
    assert_eq!(compare_bound_keys(&pred, &succ), Ordering::Less);
    assert_eq!(compare_bound_keys(&exact, &exact.clone()), Ordering::Equal);
}

#[test]
fn shorter_successor_sits_above_everything_with_its_prefix() {
    let short_succ = BoundKey::successor(key(&[2]));

    for longer in [
        BoundKey::exact(key(&[2, 100])),
        BoundKey::successor(key(&[2, 3])),
        BoundKey::predecessor(key(&[2, 3])),
    ] {
        assert_eq!(compare_bound_keys(&short_succ, &longer), Ordering::Greater);
    }
    assert_eq!(
        compare_bound_keys(&short_succ, &BoundKey::exact(key(&[3, 0]))),
        Ordering::Less
    );
}

#[test]
fn shorter_predecessor_sits_below_everything_with_its_prefix() {
    let short_pred = BoundKey::predecessor(key(&[2]));

    for longer in [
        BoundKey::exact(key(&[2, -100])),
        BoundKey::predecessor(key(&[2, 3])),
        BoundKey::successor(key(&[2, 3])),
    ] {
        assert_eq!(compare_bound_keys(&short_pred, &longer), Ordering::Less);
    }
}

#[test]
fn absent_slots_sort_below_null() {
    let absent = BoundKey::exact(IndexKey::new(vec![None]));
    let null = BoundKey::exact(IndexKey::new(vec![Some(Value::Null)]));

    assert_eq!(compare_bound_keys(&absent, &null), Ordering::Less);
}

#[test]
fn intersect_keeps_tightest_ends() {
    let outer = IndexBounds::new(key(&[1]), true, key(&[9]), true);
    let inner = IndexBounds::new(key(&[3, 4]), false, key(&[9, 1]), true);

    let both = outer.intersect(&inner);
    assert_eq!(both, IndexBounds::new(key(&[3, 4]), false, key(&[9, 1]), true));
    assert_eq!(inner.intersect(&outer), both);
}

#[test]
fn intersect_with_unbounded_is_identity() {
    let bounds = IndexBounds::new(key(&[5, 2]), false, key(&[5, 9]), true);

    assert_eq!(bounds.intersect(&IndexBounds::unbounded()), bounds);
    assert_eq!(IndexBounds::unbounded().intersect(&bounds), bounds);
}

#[test]
fn empty_detection_respects_inclusivity() {
    assert!(!IndexBounds::prefix(key(&[5])).is_empty());
    assert!(IndexBounds::new(key(&[5]), false, key(&[5]), true).is_empty());
    assert!(IndexBounds::new(key(&[5]), false, key(&[5, 3]), true).is_empty());
    assert!(!IndexBounds::new(key(&[5, 3]), true, key(&[5]), true).is_empty());
    assert!(IndexBounds::new(IndexKey::empty(), false, IndexKey::empty(), true).is_empty());
}

#[test]
fn after_skips_every_key_with_the_prefix() {
    let asc = IndexBounds::after(key(&[4]), Direction::Asc);
    assert!(!asc.contains(&key(&[4, 1000])));
    assert!(asc.contains(&key(&[5, -1000])));

    let desc = IndexBounds::after(key(&[4]), Direction::Desc);
    assert!(!desc.contains(&key(&[4, -1000])));
    assert!(desc.contains(&key(&[3, 1000])));
}

#[test]
fn common_prefix_reports_pinned_values() {
    let bounds = IndexBounds::new(key(&[5, 2]), false, key(&[5, 9]), true);
    assert_eq!(bounds.common_prefix(), key(&[5]));
    assert_eq!(IndexBounds::unbounded().common_prefix(), IndexKey::empty());
}

#[test]
fn validate_rejects_bounds_longer_than_index() {
    let bounds = IndexBounds::new(key(&[1, 2, 3]), true, IndexKey::empty(), true);

    let err = bounds
        .validate_for(&fields(&["a", "b"]))
        .expect_err("three-slot bound must not fit a two-field index");
    assert_eq!(err.origin, ErrorOrigin::Key);
    assert!(err.is_unsupported());
    assert!(bounds.validate_for(&fields(&["a", "b", "c"])).is_ok());
}

///
/// PROPERTIES
///

fn slot_strategy() -> BoxedStrategy<Option<Value>> {
    prop_oneof![
        1 => Just(None::<Value>),
        1 => Just(Some(Value::Null)),
        4 => (0i64..4).prop_map(|v| Some(Value::Int(v))),
        1 => prop_oneof![Just("undefined"), Just("a")].prop_map(|t| Some(Value::text(t))),
    ]
    .boxed()
}

fn bound_key_strategy() -> BoxedStrategy<BoundKey> {
    (
        prop::collection::vec(slot_strategy(), 0..4),
        prop_oneof![
            Just(BoundKind::Predecessor),
            Just(BoundKind::Exact),
            Just(BoundKind::Successor)
        ],
    )
        .prop_map(|(slots, kind)| BoundKey::new(IndexKey::new(slots), kind))
        .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn comparator_is_antisymmetric(a in bound_key_strategy(), b in bound_key_strategy()) {
        prop_assert_eq!(compare_bound_keys(&a, &b), compare_bound_keys(&b, &a).reverse());
    }

    #[test]
    fn comparator_is_transitive(
        a in bound_key_strategy(),
        b in bound_key_strategy(),
        c in bound_key_strategy(),
    ) {
        let ab = compare_bound_keys(&a, &b);
        let bc = compare_bound_keys(&b, &c);
        let ac = compare_bound_keys(&a, &c);

        if ab.is_le() && bc.is_le() {
            prop_assert!(ac.is_le());
        }
        if ab.is_eq() && bc.is_eq() {
            prop_assert!(ac.is_eq());
        }
        if ab.is_lt() && bc.is_le() {
            prop_assert!(ac.is_lt());
        }
    }

    #[test]
    fn comparator_matches_exact_self(slots in prop::collection::vec(slot_strategy(), 0..4)) {
        let key = IndexKey::new(slots);
        prop_assert_eq!(
            compare_bound_keys(&BoundKey::exact(key.clone()), &BoundKey::exact(key)),
            Ordering::Equal
        );
    }

    #[test]
    fn same_length_exact_keys_follow_tuple_order(
        left in prop::collection::vec(slot_strategy(), 3),
        right in prop::collection::vec(slot_strategy(), 3),
    ) {
        let left = IndexKey::new(left);
        let right = IndexKey::new(right);
        prop_assert_eq!(
            compare_bound_keys(&BoundKey::exact(left.clone()), &BoundKey::exact(right.clone())),
            left.cmp(&right)
        );
    }
}
