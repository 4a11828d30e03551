use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::{IndexBounds, IndexKey},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// RangeBuildError
///

#[derive(Debug, Eq, ThisError, PartialEq)]
pub enum RangeBuildError {
    #[error("field '{field}' is not the next field of the index (expected {expected:?})")]
    FieldOutOfOrder {
        field: String,
        expected: Option<String>,
    },

    #[error("equality on '{field}' after an inequality on '{inequality_field}'")]
    EqualityAfterInequality {
        field: String,
        inequality_field: String,
    },

    #[error("second {side} bound on '{field}'")]
    DuplicateBound { side: &'static str, field: String },
}

impl From<RangeBuildError> for InternalError {
    fn from(err: RangeBuildError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Range, err.to_string())
    }
}

///
/// IndexRangeBuilder
///
/// Fluent construction of `IndexBounds` over one index: equalities on the
/// leading fields in index order, then at most one lower and one upper bound
/// on the next field.
///

#[derive(Clone, Debug)]
pub struct IndexRangeBuilder {
    fields: Vec<String>,
    prefix: Vec<Option<Value>>,
    inequality_field: Option<usize>,
    lower: Option<(Option<Value>, bool)>,
    upper: Option<(Option<Value>, bool)>,
}

impl IndexRangeBuilder {
    #[must_use]
    pub fn new(fields: &[String]) -> Self {
        Self {
            fields: fields.to_vec(),
            prefix: Vec::new(),
            inequality_field: None,
            lower: None,
            upper: None,
        }
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Result<Self, RangeBuildError> {
        self.eq_slot(field, Some(value.into()))
    }

    /// Pin `field` to the absent marker.
    pub fn eq_absent(self, field: &str) -> Result<Self, RangeBuildError> {
        self.eq_slot(field, None)
    }

    pub fn gt(self, field: &str, value: impl Into<Value>) -> Result<Self, RangeBuildError> {
        self.lower_bound(field, value.into(), false)
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Result<Self, RangeBuildError> {
        self.lower_bound(field, value.into(), true)
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Result<Self, RangeBuildError> {
        self.upper_bound(field, value.into(), false)
    }

    pub fn lte(self, field: &str, value: impl Into<Value>) -> Result<Self, RangeBuildError> {
        self.upper_bound(field, value.into(), true)
    }

    #[must_use]
    pub fn build(self) -> IndexBounds {
        let prefix = IndexKey::new(self.prefix);
        let end = |side: Option<(Option<Value>, bool)>| match side {
            Some((value, inclusive)) => (prefix.concat(&IndexKey::new(vec![value])), inclusive),
            None => (prefix.clone(), true),
        };
        let (lower, lower_inclusive) = end(self.lower);
        let (upper, upper_inclusive) = end(self.upper);

        IndexBounds::new(lower, lower_inclusive, upper, upper_inclusive)
    }

    fn eq_slot(mut self, field: &str, value: Option<Value>) -> Result<Self, RangeBuildError> {
        if let Some(position) = self.inequality_field {
            return Err(RangeBuildError::EqualityAfterInequality {
                field: field.to_string(),
                inequality_field: self.fields[position].clone(),
            });
        }
        self.expect_next_field(field)?;
        self.prefix.push(value);

        Ok(self)
    }

    fn lower_bound(
        mut self,
        field: &str,
        value: Value,
        inclusive: bool,
    ) -> Result<Self, RangeBuildError> {
        self.inequality_on(field)?;
        if self.lower.is_some() {
            return Err(RangeBuildError::DuplicateBound {
                side: "lower",
                field: field.to_string(),
            });
        }
        self.lower = Some((Some(value), inclusive));

        Ok(self)
    }

    fn upper_bound(
        mut self,
        field: &str,
        value: Value,
        inclusive: bool,
    ) -> Result<Self, RangeBuildError> {
        self.inequality_on(field)?;
        if self.upper.is_some() {
            return Err(RangeBuildError::DuplicateBound {
                side: "upper",
                field: field.to_string(),
            });
        }
        self.upper = Some((Some(value), inclusive));

        Ok(self)
    }

    // Inequalities all sit on the single field after the equality prefix.
    fn inequality_on(&mut self, field: &str) -> Result<(), RangeBuildError> {
        match self.inequality_field {
            Some(position) if self.fields[position] == field => Ok(()),
            Some(position) => Err(RangeBuildError::FieldOutOfOrder {
                field: field.to_string(),
                expected: Some(self.fields[position].clone()),
            }),
            None => {
                self.expect_next_field(field)?;
                self.inequality_field = Some(self.prefix.len());
                Ok(())
            }
        }
    }

    fn expect_next_field(&self, field: &str) -> Result<(), RangeBuildError> {
        let expected = self.fields.get(self.prefix.len());
        if expected.is_some_and(|next| next == field) {
            return Ok(());
        }

        Err(RangeBuildError::FieldOutOfOrder {
            field: field.to_string(),
            expected: expected.cloned(),
        })
    }
}
