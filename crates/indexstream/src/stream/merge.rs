use crate::{
    direction::Direction,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    obs::sink::{self, InvariantKind, MetricsEvent},
    stream::{
        IndexedStream, KeyOrderComparator, QueryStream, RowStream, RowStreamBox, ScanStats,
        StreamRow, common_equality_prefix, common_shape, narrow_all,
    },
};

///
/// MergeStream
///
/// K-way merge of children that share order and index fields. Every row of
/// every child is emitted once; equal keys come out lowest child first.
///

#[derive(Clone, Debug)]
pub struct MergeStream {
    streams: Vec<QueryStream>,
    order: Direction,
    index_fields: Vec<String>,
}

impl MergeStream {
    pub fn new(streams: Vec<QueryStream>) -> Result<Self, InternalError> {
        let (order, index_fields) = common_shape("merge", &streams)?;

        Ok(Self {
            streams,
            order,
            index_fields,
        })
    }

    #[must_use]
    pub fn streams(&self) -> &[QueryStream] {
        &self.streams
    }
}

impl IndexedStream for MergeStream {
    fn order(&self) -> Direction {
        self.order
    }

    fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    fn equality_prefix(&self) -> IndexKey {
        common_equality_prefix(&self.streams)
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        Ok(QueryStream::Merge(Self {
            streams: narrow_all(&self.streams, bounds)?,
            order: self.order,
            index_fields: self.index_fields.clone(),
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        let comparator = KeyOrderComparator::from_direction(self.order);
        let sides = self
            .streams
            .iter()
            .enumerate()
            .map(|(child, stream)| Ok(MergeSide::new(child, stream.open()?, comparator)))
            .collect::<Result<Vec<_>, InternalError>>()?;

        Ok(Box::new(MergeRows { sides, comparator }))
    }

    fn table(&self) -> Option<&str> {
        self.streams.iter().find_map(|stream| stream.table())
    }
}

///
/// MergeSide
///
/// Per-child lookahead state: one pending row, exhaustion status, and the
/// last key taken from this child for monotonicity checks.
///

struct MergeSide {
    child: usize,
    rows: RowStreamBox,
    pending: Option<StreamRow>,
    done: bool,
    last_key: Option<IndexKey>,
    comparator: KeyOrderComparator,
}

impl MergeSide {
    fn new(child: usize, rows: RowStreamBox, comparator: KeyOrderComparator) -> Self {
        Self {
            child,
            rows,
            pending: None,
            done: false,
            last_key: None,
            comparator,
        }
    }

    // Ensure one lookahead row is available for this child.
    fn ensure_item(&mut self, stats: &mut ScanStats) -> Result<(), InternalError> {
        if self.done || self.pending.is_some() {
            return Ok(());
        }

        match self.rows.next_row(stats)? {
            Some(row) => {
                self.validate_monotonicity(&row.0)?;
                self.pending = Some(row);
            }
            None => self.done = true,
        }

        Ok(())
    }

    fn validate_monotonicity(&self, current: &IndexKey) -> Result<(), InternalError> {
        let Some(previous) = self.last_key.as_ref() else {
            return Ok(());
        };
        if !self.comparator.violates_monotonicity(previous, current) {
            return Ok(());
        }

        sink::record(MetricsEvent::StreamInvariant {
            kind: InvariantKind::MergeOrder,
        });

        Err(InternalError::stream_invariant(format!(
            "stream invariant violated: merge child {} emitted out-of-order key for {} (previous key: {previous:?}, current key: {current:?})",
            self.child,
            self.comparator.order_label(),
        )))
    }

    fn take_item(&mut self) -> Option<StreamRow> {
        let row = self.pending.take()?;
        self.last_key = Some(row.0.clone());

        Some(row)
    }
}

///
/// MergeRows
///

struct MergeRows {
    sides: Vec<MergeSide>,
    comparator: KeyOrderComparator,
}

impl RowStream for MergeRows {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        // Fan out: every child holds one pending row before a winner is picked.
        for side in &mut self.sides {
            side.ensure_item(stats)?;
        }

        // Strictly-less replacement keeps the lowest child on ties.
        let mut winner: Option<(usize, &IndexKey)> = None;
        for (idx, side) in self.sides.iter().enumerate() {
            let Some((key, _)) = side.pending.as_ref() else {
                continue;
            };
            if winner.is_none_or(|(_, best)| self.comparator.compare(key, best).is_lt()) {
                winner = Some((idx, key));
            }
        }

        let Some((idx, _)) = winner else {
            return Ok(None);
        };

        Ok(self.sides[idx].take_item())
    }
}
