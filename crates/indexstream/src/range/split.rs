use crate::{
    direction::Direction,
    error::InternalError,
    key::IndexBounds,
    range::{FieldBound, RangeOp, SimpleRange},
    value::Value,
};

/// Lower a two-sided bound into store-legal ranges, emitted in iteration order.
///
/// The bound is walked from its start side (lower for ascending, upper for
/// descending): shared leading values become equalities, the start side is
/// stepped down one field at a time, then a middle range covers the first
/// differing field, then the end side is stepped back up. Scanning the result
/// in order visits exactly the keys of the unsplit range, in the same order.
///
/// An empty bound yields no ranges at all.
pub fn split_range(
    index_fields: &[String],
    order: Direction,
    bounds: &IndexBounds,
) -> Result<Vec<SimpleRange>, InternalError> {
    bounds.validate_for(index_fields)?;
    if bounds.is_empty() {
        return Ok(Vec::new());
    }

    let lower_op = if bounds.lower_inclusive {
        RangeOp::Gte
    } else {
        RangeOp::Gt
    };
    let upper_op = if bounds.upper_inclusive {
        RangeOp::Lte
    } else {
        RangeOp::Lt
    };
    let (start, mut start_op, end, mut end_op) = match order {
        Direction::Asc => (bounds.lower.slots(), lower_op, bounds.upper.slots(), upper_op),
        Direction::Desc => (bounds.upper.slots(), upper_op, bounds.lower.slots(), lower_op),
    };

    // Phase 1: pin every leading value both ends agree on.
    let shared = start
        .iter()
        .zip(end.iter())
        .take_while(|(s, e)| s == e)
        .count();
    let common: Vec<FieldBound> = index_fields
        .iter()
        .zip(&start[..shared])
        .map(|(field, value)| FieldBound::new(RangeOp::Eq, field.clone(), value.clone()))
        .collect();
    let fields = &index_fields[shared..];
    let mut start = &start[shared..];
    let mut end = &end[shared..];

    // Phase 2: step the start side down toward the shared prefix.
    let mut ranges = Vec::new();
    while start.len() > 1 {
        ranges.push(single_inequality(&common, fields, start_op, start));
        start = &start[..start.len() - 1];
        start_op = start_op.exclusive();
    }

    // Phase 3: step the end side down as well; emitted in reverse below.
    let mut end_ranges = Vec::new();
    while end.len() > 1 {
        end_ranges.push(single_inequality(&common, fields, end_op, end));
        end = &end[..end.len() - 1];
        end_op = end_op.exclusive();
    }

    // Phase 4: the middle range on the first field past the shared prefix.
    let middle = match (start.first(), end.first()) {
        (Some(start_value), Some(end_value)) => {
            let mut bounds = common.clone();
            bounds.push(FieldBound::new(start_op, fields[0].clone(), start_value.clone()));
            bounds.push(FieldBound::new(end_op, fields[0].clone(), end_value.clone()));
            SimpleRange::new(bounds)
        }
        (_, None) => single_inequality(&common, fields, start_op, start),
        (None, Some(_)) => single_inequality(&common, fields, end_op, end),
    };
    ranges.push(middle);
    ranges.extend(end_ranges.into_iter().rev());

    Ok(ranges)
}

// Equalities on all but the last value of `key`, then `op` on the last one.
fn single_inequality(
    common: &[FieldBound],
    fields: &[String],
    op: RangeOp,
    key: &[Option<Value>],
) -> SimpleRange {
    let mut bounds = common.to_vec();
    if let Some((last, leading)) = key.split_last() {
        bounds.extend(
            fields
                .iter()
                .zip(leading)
                .map(|(field, value)| FieldBound::new(RangeOp::Eq, field.clone(), value.clone())),
        );
        bounds.push(FieldBound::new(op, fields[leading.len()].clone(), last.clone()));
    }

    SimpleRange::new(bounds)
}
