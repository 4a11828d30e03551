//! Module: key
//! Responsibility: index-key positions, bound annotations, and their total order.
//! Does not own: range splitting or store traversal.
//! Boundary: every stream, cursor, and page compares positions through this module.

mod bounds;
mod compare;

#[cfg(test)]
mod tests;

use crate::value::Value;
use derive_more::{Deref, IntoIterator};

// re-exports
pub use bounds::IndexBounds;
pub use compare::compare_bound_keys;

///
/// IndexKey
///
/// Ordered tuple of index-field values, at most as long as the index being
/// walked. `None` is the absent marker: a field that was never bound. It is
/// distinct from every real value and sorts below all of them.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, Ord, PartialEq, PartialOrd)]
pub struct IndexKey(Vec<Option<Value>>);

impl IndexKey {
    #[must_use]
    pub const fn new(slots: Vec<Option<Value>>) -> Self {
        Self(slots)
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a key where every slot holds a real value.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        values.into_iter().map(Some).collect()
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<Value>] {
        &self.0
    }

    /// Leading `len` slots (or the whole key when shorter).
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Slots after the leading `len`.
    #[must_use]
    pub fn suffix_after(&self, len: usize) -> Self {
        Self(self.0[len.min(self.0.len())..].to_vec())
    }

    /// Append `tail` after this key.
    #[must_use]
    pub fn concat(&self, tail: &Self) -> Self {
        let mut slots = Vec::with_capacity(self.0.len() + tail.0.len());
        slots.extend_from_slice(&self.0);
        slots.extend_from_slice(&tail.0);

        Self(slots)
    }

    /// Longest shared prefix of two keys.
    #[must_use]
    pub fn common_prefix(&self, other: &Self) -> Self {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(left, right)| left == right)
            .map(|(left, _)| left.clone())
            .collect()
    }
}

impl FromIterator<Option<Value>> for IndexKey {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Option<Value>>> for IndexKey {
    fn from(slots: Vec<Option<Value>>) -> Self {
        Self(slots)
    }
}

///
/// BoundKind
///
/// How a possibly-short key stands for a position in the index:
/// `Predecessor` sits immediately below every key with this prefix,
/// `Successor` immediately above them, and `Exact` is the key itself.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BoundKind {
    Predecessor,
    Exact,
    Successor,
}

impl BoundKind {
    // Same-length tie-break rank.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Self::Predecessor => 0,
            Self::Exact => 1,
            Self::Successor => 2,
        }
    }
}

///
/// BoundKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundKey {
    pub key: IndexKey,
    pub kind: BoundKind,
}

impl BoundKey {
    #[must_use]
    pub const fn new(key: IndexKey, kind: BoundKind) -> Self {
        Self { key, kind }
    }

    #[must_use]
    pub const fn exact(key: IndexKey) -> Self {
        Self::new(key, BoundKind::Exact)
    }

    #[must_use]
    pub const fn predecessor(key: IndexKey) -> Self {
        Self::new(key, BoundKind::Predecessor)
    }

    #[must_use]
    pub const fn successor(key: IndexKey) -> Self {
        Self::new(key, BoundKind::Successor)
    }
}
