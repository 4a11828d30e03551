use crate::{
    direction::Direction,
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::{BoundKey, IndexKey, compare_bound_keys},
};
use std::cmp::Ordering;

///
/// IndexBounds
///
/// Two-sided range over an index, always expressed in ascending field order
/// regardless of iteration direction. An empty key on either side with an
/// inclusive flag means that side is unbounded; an empty exclusive lower key
/// sits above every key, which is how the "end of range" cursor narrows to
/// nothing.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexBounds {
    pub lower: IndexKey,
    pub lower_inclusive: bool,
    pub upper: IndexKey,
    pub upper_inclusive: bool,
}

impl Default for IndexBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl IndexBounds {
    #[must_use]
    pub const fn new(
        lower: IndexKey,
        lower_inclusive: bool,
        upper: IndexKey,
        upper_inclusive: bool,
    ) -> Self {
        Self {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        }
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(IndexKey::empty(), true, IndexKey::empty(), true)
    }

    /// Every key carrying `prefix`.
    #[must_use]
    pub fn prefix(prefix: IndexKey) -> Self {
        Self::new(prefix.clone(), true, prefix, true)
    }

    /// Everything strictly after `key` in iteration order `direction`.
    ///
    /// A short `key` skips every key carrying it as a prefix.
    #[must_use]
    pub fn after(key: IndexKey, direction: Direction) -> Self {
        match direction {
            Direction::Asc => Self::new(key, false, IndexKey::empty(), true),
            Direction::Desc => Self::new(IndexKey::empty(), true, key, false),
        }
    }

    /// Lower end as a bound position.
    #[must_use]
    pub fn lower_bound_key(&self) -> BoundKey {
        if self.lower_inclusive {
            BoundKey::predecessor(self.lower.clone())
        } else {
            BoundKey::successor(self.lower.clone())
        }
    }

    /// Upper end as a bound position.
    #[must_use]
    pub fn upper_bound_key(&self) -> BoundKey {
        if self.upper_inclusive {
            BoundKey::successor(self.upper.clone())
        } else {
            BoundKey::predecessor(self.upper.clone())
        }
    }

    /// Tightest range admitted by both `self` and `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let take_other_lower =
            compare_bound_keys(&other.lower_bound_key(), &self.lower_bound_key()).is_gt();
        let take_other_upper =
            compare_bound_keys(&other.upper_bound_key(), &self.upper_bound_key()).is_lt();

        let (lower, lower_inclusive) = if take_other_lower {
            (other.lower.clone(), other.lower_inclusive)
        } else {
            (self.lower.clone(), self.lower_inclusive)
        };
        let (upper, upper_inclusive) = if take_other_upper {
            (other.upper.clone(), other.upper_inclusive)
        } else {
            (self.upper.clone(), self.upper_inclusive)
        };

        Self::new(lower, lower_inclusive, upper, upper_inclusive)
    }

    /// Whether no key can satisfy both ends.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        compare_bound_keys(&self.lower_bound_key(), &self.upper_bound_key()) != Ordering::Less
    }

    /// Whether a full-length key lies inside this range.
    #[must_use]
    pub fn contains(&self, key: &IndexKey) -> bool {
        let exact = BoundKey::exact(key.clone());

        compare_bound_keys(&self.lower_bound_key(), &exact).is_lt()
            && compare_bound_keys(&exact, &self.upper_bound_key()).is_lt()
    }

    /// Values shared by both ends; every key in the range is pinned to them.
    #[must_use]
    pub fn common_prefix(&self) -> IndexKey {
        self.lower.common_prefix(&self.upper)
    }

    /// Reject bound keys longer than the index they walk.
    pub fn validate_for(&self, index_fields: &[String]) -> Result<(), InternalError> {
        for (side, key) in [("lower", &self.lower), ("upper", &self.upper)] {
            if key.len() > index_fields.len() {
                return Err(InternalError::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Key,
                    format!(
                        "{side} bound has {} fields but index {index_fields:?} has {}",
                        key.len(),
                        index_fields.len()
                    ),
                ));
            }
        }

        Ok(())
    }
}
