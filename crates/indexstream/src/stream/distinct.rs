use crate::{
    direction::Direction,
    error::InternalError,
    key::{BoundKey, IndexBounds, IndexKey, compare_bound_keys},
    stream::{
        IndexedStream, QueryStream, RowStream, RowStreamBox, ScanStats, StreamPlanError,
        StreamRow,
    },
};

///
/// DistinctStream
///
/// Loose index scan: emits the first document for each value of the
/// distinct fields, then narrows past that value instead of reading the rest
/// of the group. Filtered rows pass through and do not close a group.
///

#[derive(Clone, Debug)]
pub struct DistinctStream {
    stream: Box<QueryStream>,
    fields: Vec<String>,
    prefix_len: usize,
    resume: Option<GroupResume>,
}

///
/// GroupResume
///
/// Start position inside a group. Whether the group was already represented
/// is only known once `lookback` (the group up to `after`) is read.
///

#[derive(Clone, Debug)]
struct GroupResume {
    after: IndexKey,
    lookback: Vec<QueryStream>,
}

impl DistinctStream {
    pub fn new(stream: QueryStream, fields: Vec<String>) -> Result<Self, InternalError> {
        let prefix_len = distinct_prefix_len(&stream, &fields)?;

        Ok(Self {
            stream: Box::new(stream),
            fields,
            prefix_len,
            resume: None,
        })
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    // Exclusive start key that lands inside a group.
    fn resume_key(&self, bounds: &IndexBounds) -> Option<IndexKey> {
        let (key, inclusive) = match self.stream.order() {
            Direction::Asc => (&bounds.lower, bounds.lower_inclusive),
            Direction::Desc => (&bounds.upper, bounds.upper_inclusive),
        };

        (!inclusive && key.len() > self.prefix_len).then(|| key.clone())
    }

    // Must run against `self.stream` before it is narrowed past `after`.
    fn resume_after(&self, after: IndexKey) -> Result<GroupResume, InternalError> {
        let order = self.stream.order();
        let group = after.prefix(self.prefix_len);
        let window = match order {
            Direction::Asc => IndexBounds::new(group.clone(), true, after.clone(), true),
            Direction::Desc => IndexBounds::new(after.clone(), true, group.clone(), true),
        };
        let segment = self.stream.narrow(&window)?;

        let Some(prev) = &self.resume else {
            return Ok(GroupResume {
                after,
                lookback: vec![segment],
            });
        };
        let later = order
            .apply(compare_bound_keys(
                &BoundKey::successor(after.clone()),
                &BoundKey::successor(prev.after.clone()),
            ))
            .is_gt();
        if !later {
            return Ok(prev.clone());
        }

        // Within the same group, the earlier window still covers what sits
        // before the previous start.
        let lookback = if prev.after.prefix(self.prefix_len) == group {
            let mut lookback = prev.lookback.clone();
            lookback.push(segment);
            lookback
        } else {
            vec![segment]
        };

        Ok(GroupResume { after, lookback })
    }
}

// Distinct fields must sit directly after some pinned leading fields.
fn distinct_prefix_len(stream: &QueryStream, fields: &[String]) -> Result<usize, StreamPlanError> {
    let index_fields = stream.index_fields();
    let pinned = stream.equality_prefix().len();

    (0..=pinned.min(index_fields.len()))
        .find(|&start| index_fields[start..].starts_with(fields))
        .map(|start| start + fields.len())
        .ok_or_else(|| StreamPlanError::DistinctFieldsUnaligned {
            fields: fields.to_vec(),
            index_fields: index_fields.to_vec(),
            pinned,
        })
}

impl IndexedStream for DistinctStream {
    fn order(&self) -> Direction {
        self.stream.order()
    }

    fn index_fields(&self) -> &[String] {
        self.stream.index_fields()
    }

    fn equality_prefix(&self) -> IndexKey {
        self.stream.equality_prefix()
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        bounds.validate_for(self.stream.index_fields())?;

        let resume = match self.resume_key(bounds) {
            Some(after) => Some(self.resume_after(after)?),
            None => self.resume.clone(),
        };

        Ok(QueryStream::Distinct(Self {
            stream: Box::new(self.stream.narrow(bounds)?),
            fields: self.fields.clone(),
            prefix_len: self.prefix_len,
            resume,
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        Ok(Box::new(DistinctRows {
            base: (*self.stream).clone(),
            resume: self.resume.clone(),
            current: None,
            order: self.stream.order(),
            prefix_len: self.prefix_len,
            done: false,
        }))
    }

    fn table(&self) -> Option<&str> {
        self.stream.table()
    }
}

///
/// DistinctRows
///
/// `base` is re-narrowed after every emitted group; `current` is the open
/// scan over what remains.
///

struct DistinctRows {
    base: QueryStream,
    resume: Option<GroupResume>,
    current: Option<RowStreamBox>,
    order: Direction,
    prefix_len: usize,
    done: bool,
}

impl RowStream for DistinctRows {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        if self.done {
            return Ok(None);
        }
        if let Some(resume) = self.resume.take()
            && group_represented(&resume.lookback, stats)?
        {
            let skip = IndexBounds::after(resume.after.prefix(self.prefix_len), self.order);
            self.base = self.base.narrow(&skip)?;
        }
        if self.current.is_none() {
            self.current = Some(self.base.open()?);
        }
        let Some(rows) = self.current.as_mut() else {
            return Ok(None);
        };

        let Some((key, doc)) = rows.next_row(stats)? else {
            self.done = true;
            return Ok(None);
        };
        if doc.is_some() {
            let skip = IndexBounds::after(key.prefix(self.prefix_len), self.order);
            self.base = self.base.narrow(&skip)?;
            self.current = None;
        }

        Ok(Some((key, doc)))
    }
}

// Whether any document sits in the windows. Rows read here count as scanned.
fn group_represented(
    lookback: &[QueryStream],
    stats: &mut ScanStats,
) -> Result<bool, InternalError> {
    for window in lookback {
        let mut rows = window.open()?;
        while let Some((_, doc)) = rows.next_row(stats)? {
            if doc.is_some() {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
