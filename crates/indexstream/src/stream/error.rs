use crate::{
    direction::Direction,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use thiserror::Error as ThisError;

///
/// StreamPlanError
///
/// Construction-time misuse of stream combinators. Never retried.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum StreamPlanError {
    #[error("{operator} requires at least one child stream")]
    NoChildren { operator: &'static str },

    #[error("{operator} child {child} is ordered {found}, expected {expected}")]
    OrderMismatch {
        operator: &'static str,
        child: usize,
        expected: Direction,
        found: Direction,
    },

    #[error("{operator} child {child} is sorted by {found:?}, expected {expected:?}")]
    IndexFieldsMismatch {
        operator: &'static str,
        child: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error(
        "distinct fields {fields:?} must follow the pinned prefix of {index_fields:?} (pinned: {pinned})"
    )]
    DistinctFieldsUnaligned {
        fields: Vec<String>,
        index_fields: Vec<String>,
        pinned: usize,
    },

    #[error(
        "order_by fields {fields:?} must be a suffix of {index_fields:?} whose dropped fields are pinned (pinned: {pinned})"
    )]
    OrderByFieldsUnaligned {
        fields: Vec<String>,
        index_fields: Vec<String>,
        pinned: usize,
    },

    #[error("singleton key has {key_len} values but the stream is sorted by {field_count} fields")]
    SingletonKeyLength { key_len: usize, field_count: usize },
}

impl From<StreamPlanError> for InternalError {
    fn from(err: StreamPlanError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Stream, err.to_string())
    }
}
