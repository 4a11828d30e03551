use crate::key::{BoundKey, BoundKind};
use std::cmp::Ordering;

/// Total order over bound-annotated keys of possibly unequal length.
///
/// Each bound behaves as its key followed by one marker slot: `Predecessor`
/// below every value, `Exact` just above that, `Successor` above every value.
/// Comparing those extended sequences lexicographically gives the rules below,
/// which is why the order is antisymmetric and transitive:
/// - shared slots compare lexicographically;
/// - same length breaks ties by kind (`Predecessor < Exact < Successor`);
/// - a shorter key is below a longer one with the same prefix unless it is a
///   `Successor`, which is above everything carrying its prefix.
///
/// Two `Exact` keys of different length never occur for validated ranges; they
/// resolve shortest-first like plain tuples.
#[must_use]
pub fn compare_bound_keys(left: &BoundKey, right: &BoundKey) -> Ordering {
    let shared = left
        .key
        .iter()
        .zip(right.key.iter())
        .map(|(l, r)| l.cmp(r))
        .find(|ordering| ordering.is_ne());
    if let Some(ordering) = shared {
        return ordering;
    }

    match left.key.len().cmp(&right.key.len()) {
        Ordering::Equal => left.kind.rank().cmp(&right.kind.rank()),
        Ordering::Less => dangling_prefix_ordering(left.kind),
        Ordering::Greater => dangling_prefix_ordering(right.kind).reverse(),
    }
}

// Position of a shorter bound relative to any longer key extending its prefix.
const fn dangling_prefix_ordering(shorter: BoundKind) -> Ordering {
    match shorter {
        BoundKind::Predecessor | BoundKind::Exact => Ordering::Less,
        BoundKind::Successor => Ordering::Greater,
    }
}
