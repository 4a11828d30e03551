//! Module: stream::order
//! Responsibility: comparator policy for ordered row streams.
//! Does not own: stream traversal mechanics.
//! Boundary: centralizes ASC/DESC comparison for stream combinators.

use crate::{direction::Direction, key::IndexKey};
use std::cmp::Ordering;

///
/// KeyOrderComparator
///
/// Comparator wrapper for monotonicity checks and merge decisions, so
/// combinators never branch on traversal direction themselves.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct KeyOrderComparator {
    direction: Direction,
}

impl KeyOrderComparator {
    #[must_use]
    pub(crate) const fn from_direction(direction: Direction) -> Self {
        Self { direction }
    }

    /// `Less` when `left` is emitted before `right`.
    pub(crate) fn compare(self, left: &IndexKey, right: &IndexKey) -> Ordering {
        self.direction.apply(left.cmp(right))
    }

    // Return whether `current` violates stream monotonicity after `previous`.
    pub(crate) fn violates_monotonicity(self, previous: &IndexKey, current: &IndexKey) -> bool {
        self.compare(previous, current).is_gt()
    }

    // Human-readable direction label for invariant diagnostics.
    pub(crate) const fn order_label(self) -> &'static str {
        self.direction.label()
    }
}
