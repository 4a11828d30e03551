//! Module: range
//! Responsibility: store-legal range shapes and lowering of arbitrary bounds into them.
//! Does not own: store traversal or stream composition.
//! Boundary: base range streams split their bounds here before every scan.

mod builder;
mod split;


use crate::{error::InternalError, key::IndexKey, value::Value};
use std::{cmp::Ordering, fmt};

// re-exports
pub use builder::{IndexRangeBuilder, RangeBuildError};
pub use split::split_range;

///
/// RangeOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RangeOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    /// Exclusive form of an inequality; a field that is stepped past can never
    /// itself be included again.
    #[must_use]
    pub const fn exclusive(self) -> Self {
        match self {
            Self::Gt | Self::Gte => Self::Gt,
            Self::Lt | Self::Lte => Self::Lt,
            Self::Eq => Self::Eq,
        }
    }

    #[must_use]
    pub const fn is_lower(self) -> bool {
        matches!(self, Self::Gt | Self::Gte)
    }

    /// Whether a slot comparing `ordering` against the bound value passes.
    #[must_use]
    pub const fn admits(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Gt => ordering.is_gt(),
            Self::Gte => ordering.is_ge(),
            Self::Lt => ordering.is_lt(),
            Self::Lte => ordering.is_le(),
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

///
/// FieldBound
///
/// One constraint on one index field. `value` is `None` when the constraint
/// targets the absent marker.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldBound {
    pub op: RangeOp,
    pub field: String,
    pub value: Option<Value>,
}

impl FieldBound {
    #[must_use]
    pub fn new(op: RangeOp, field: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            op,
            field: field.into(),
            value,
        }
    }
}

impl fmt::Display for FieldBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {value:?}", self.field, self.op.symbol()),
            None => write!(f, "{} {} <absent>", self.field, self.op.symbol()),
        }
    }
}

///
/// SimpleRange
///
/// The only range shape a backing store executes natively: equality on a
/// prefix of the index fields, then at most one lower and one upper
/// inequality on the next field.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SimpleRange {
    bounds: Vec<FieldBound>,
}

impl SimpleRange {
    #[must_use]
    pub const fn new(bounds: Vec<FieldBound>) -> Self {
        Self { bounds }
    }

    #[must_use]
    pub fn bounds(&self) -> &[FieldBound] {
        &self.bounds
    }

    /// Equality constraints, in index order.
    pub fn equalities(&self) -> impl Iterator<Item = &FieldBound> {
        self.bounds.iter().filter(|bound| bound.op == RangeOp::Eq)
    }

    /// Trailing inequality constraints (zero, one, or two on a single field).
    pub fn inequalities(&self) -> impl Iterator<Item = &FieldBound> {
        self.bounds.iter().filter(|bound| bound.op != RangeOp::Eq)
    }

    /// Check this range is expressible by the store primitive over `index_fields`.
    pub fn validate(&self, index_fields: &[String]) -> Result<(), InternalError> {
        let mut next_equality = 0usize;
        let mut inequality_field: Option<usize> = None;
        let mut lower_seen = false;
        let mut upper_seen = false;

        for bound in &self.bounds {
            let Some(position) = index_fields.iter().position(|f| *f == bound.field) else {
                return Err(InternalError::range_invariant(format!(
                    "range constrains '{}' which is not an index field of {index_fields:?}",
                    bound.field
                )));
            };

            if bound.op == RangeOp::Eq {
                if inequality_field.is_some() || position != next_equality {
                    return Err(InternalError::range_invariant(format!(
                        "equality on '{}' does not extend the equality prefix ({self})",
                        bound.field
                    )));
                }
                next_equality += 1;
                continue;
            }

            match inequality_field {
                None if position == next_equality => inequality_field = Some(position),
                Some(existing) if existing == position => {}
                _ => {
                    return Err(InternalError::range_invariant(format!(
                        "inequality on '{}' is not on the field after the equality prefix ({self})",
                        bound.field
                    )));
                }
            }

            let seen = if bound.op.is_lower() {
                &mut lower_seen
            } else {
                &mut upper_seen
            };
            if *seen {
                return Err(InternalError::range_invariant(format!(
                    "range has more than one {} bound on '{}' ({self})",
                    if bound.op.is_lower() { "lower" } else { "upper" },
                    bound.field
                )));
            }
            *seen = true;
        }

        Ok(())
    }

    /// Whether a full index key satisfies every constraint in this range.
    #[must_use]
    pub fn matches(&self, index_fields: &[String], key: &IndexKey) -> bool {
        self.bounds.iter().all(|bound| {
            index_fields
                .iter()
                .position(|f| *f == bound.field)
                .and_then(|position| key.get(position))
                .is_some_and(|slot| bound.op.admits(slot.cmp(&bound.value)))
        })
    }
}

impl fmt::Display for SimpleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bounds.is_empty() {
            return f.write_str("<full index>");
        }
        for (idx, bound) in self.bounds.iter().enumerate() {
            if idx > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{bound}")?;
        }

        Ok(())
    }
}
