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
use std::collections::VecDeque;

///
/// ConcatStream
///
/// Children are read strictly one after another. They are expected to cover
/// order-adjacent, disjoint ranges; a key that steps backwards across any row
/// boundary is a fatal invariant violation.
///

#[derive(Clone, Debug)]
pub struct ConcatStream {
    streams: Vec<QueryStream>,
    order: Direction,
    index_fields: Vec<String>,
}

impl ConcatStream {
    pub fn new(streams: Vec<QueryStream>) -> Result<Self, InternalError> {
        let (order, index_fields) = common_shape("concat", &streams)?;

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

impl IndexedStream for ConcatStream {
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
        Ok(QueryStream::Concat(Self {
            streams: narrow_all(&self.streams, bounds)?,
            order: self.order,
            index_fields: self.index_fields.clone(),
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        Ok(Box::new(ConcatRows {
            pending: self.streams.iter().cloned().collect(),
            current: None,
            last_key: None,
            comparator: KeyOrderComparator::from_direction(self.order),
        }))
    }

    fn table(&self) -> Option<&str> {
        self.streams.iter().find_map(|stream| stream.table())
    }
}

///
/// ConcatRows
///

struct ConcatRows {
    pending: VecDeque<QueryStream>,
    current: Option<RowStreamBox>,
    last_key: Option<IndexKey>,
    comparator: KeyOrderComparator,
}

impl ConcatRows {
    fn check_order(&self, current: &IndexKey) -> Result<(), InternalError> {
        let Some(previous) = self.last_key.as_ref() else {
            return Ok(());
        };
        if !self.comparator.violates_monotonicity(previous, current) {
            return Ok(());
        }

        sink::record(MetricsEvent::StreamInvariant {
            kind: InvariantKind::ConcatOrder,
        });

        Err(InternalError::stream_invariant(format!(
            "stream invariant violated: concat emitted out-of-order key for {} (previous key: {previous:?}, current key: {current:?})",
            self.comparator.order_label(),
        )))
    }
}

impl RowStream for ConcatRows {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        loop {
            if self.current.is_none() {
                let Some(next) = self.pending.pop_front() else {
                    return Ok(None);
                };
                self.current = Some(next.open()?);
            }
            let Some(rows) = self.current.as_mut() else {
                return Ok(None);
            };

            match rows.next_row(stats)? {
                Some((key, doc)) => {
                    self.check_order(&key)?;
                    self.last_key = Some(key.clone());

                    return Ok(Some((key, doc)));
                }
                None => self.current = None,
            }
        }
    }
}
