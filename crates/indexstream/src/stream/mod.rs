//! Module: stream
//! Responsibility: composable, order-preserving row streams over index ranges.
//! Does not own: range lowering (range) or page boundaries (page).
//! Boundary: callers build a `QueryStream` value, then pull rows from `open()`.
//!
//! A `QueryStream` is an immutable descriptor. Nothing touches the store until
//! it is opened and pulled; `narrow` always returns a new descriptor.

mod base;
mod concat;
mod consume;
mod distinct;
mod error;
mod filter;
mod flat_map;
mod merge;
mod order;
mod order_by;
mod singleton;


use crate::{
    direction::Direction,
    document::Document,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    store::IndexStore,
};
use std::rc::Rc;

pub(crate) use order::KeyOrderComparator;

// re-exports
pub use base::BaseRangeStream;
pub use concat::ConcatStream;
pub use consume::ResponseError;
pub use distinct::DistinctStream;
pub use error::StreamPlanError;
pub use filter::{FilterStream, MapStream, RowMapper, RowPredicate};
pub use flat_map::{FlatMapStream, StreamMapper};
pub use merge::MergeStream;
pub use order_by::OrderByStream;
pub use singleton::{EmptyStream, SingletonStream};

///
/// StreamRow
///
/// One pulled position: the row's full index key and its document, or `None`
/// when the row was read but filtered out.
///

pub type StreamRow = (IndexKey, Option<Document>);

///
/// ScanStats
///
/// Explicit accumulator threaded through every pull.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanStats {
    pub scans_opened: u64,
    pub rows_scanned: u64,
}

///
/// RowStream
///
/// Pull-based contract for an opened stream. Rows arrive in the stream's
/// declared order; `Ok(None)` means exhausted.
///

pub trait RowStream {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError>;
}

pub type RowStreamBox = Box<dyn RowStream>;

impl<T> RowStream for Box<T>
where
    T: RowStream + ?Sized,
{
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        self.as_mut().next_row(stats)
    }
}

///
/// IndexedStream
///
/// Capabilities every stream descriptor answers.
///

pub trait IndexedStream {
    fn order(&self) -> Direction;

    /// Fields the stream is sorted by, in order.
    fn index_fields(&self) -> &[String];

    /// Values the leading index fields are pinned to for every row.
    fn equality_prefix(&self) -> IndexKey;

    /// Equivalent stream restricted to `bounds` (ascending field order).
    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError>;

    fn open(&self) -> Result<RowStreamBox, InternalError>;

    /// Table the stream reads, for instrumentation.
    fn table(&self) -> Option<&str> {
        None
    }
}

///
/// QueryStream
///

#[derive(Clone, Debug)]
pub enum QueryStream {
    BaseRange(BaseRangeStream),
    Concat(ConcatStream),
    Merge(MergeStream),
    FlatMap(FlatMapStream),
    Distinct(DistinctStream),
    OrderBy(OrderByStream),
    Filter(FilterStream),
    Map(MapStream),
    Singleton(SingletonStream),
    Empty(EmptyStream),
}

macro_rules! dispatch {
    ($value:expr, $stream:ident => $body:expr) => {
        match $value {
            QueryStream::BaseRange($stream) => $body,
            QueryStream::Concat($stream) => $body,
            QueryStream::Merge($stream) => $body,
            QueryStream::FlatMap($stream) => $body,
            QueryStream::Distinct($stream) => $body,
            QueryStream::OrderBy($stream) => $body,
            QueryStream::Filter($stream) => $body,
            QueryStream::Map($stream) => $body,
            QueryStream::Singleton($stream) => $body,
            QueryStream::Empty($stream) => $body,
        }
    };
}

impl IndexedStream for QueryStream {
    fn order(&self) -> Direction {
        dispatch!(self, stream => stream.order())
    }

    fn index_fields(&self) -> &[String] {
        dispatch!(self, stream => stream.index_fields())
    }

    fn equality_prefix(&self) -> IndexKey {
        dispatch!(self, stream => stream.equality_prefix())
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        dispatch!(self, stream => stream.narrow(bounds))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        dispatch!(self, stream => stream.open())
    }

    fn table(&self) -> Option<&str> {
        dispatch!(self, stream => stream.table())
    }
}

impl QueryStream {
    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    /// Rows of `table` inside `bounds` on `index`.
    pub fn range(
        store: Rc<dyn IndexStore>,
        table: &str,
        index: &str,
        bounds: IndexBounds,
        order: Direction,
    ) -> Result<Self, InternalError> {
        BaseRangeStream::new(store, table, index, bounds, order).map(Self::BaseRange)
    }

    /// Exactly one row at `key`, which must be a full key of `index_fields`.
    pub fn singleton<S: AsRef<str>>(
        key: IndexKey,
        doc: Option<Document>,
        order: Direction,
        index_fields: &[S],
    ) -> Result<Self, InternalError> {
        SingletonStream::new(key, doc, order, owned_fields(index_fields)).map(Self::Singleton)
    }

    #[must_use]
    pub fn empty<S: AsRef<str>>(order: Direction, index_fields: &[S]) -> Self {
        Self::Empty(EmptyStream::new(order, owned_fields(index_fields)))
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    /// Children in sequence; each must cover a range after the previous one.
    pub fn concat(streams: Vec<Self>) -> Result<Self, InternalError> {
        ConcatStream::new(streams).map(Self::Concat)
    }

    /// K-way merge of children sharing order and index fields.
    pub fn merge(streams: Vec<Self>) -> Result<Self, InternalError> {
        MergeStream::new(streams).map(Self::Merge)
    }

    /// For every row, the rows of the stream `mapper` builds from it.
    pub fn flat_map<S, F>(self, inner_fields: &[S], mapper: F) -> Result<Self, InternalError>
    where
        S: AsRef<str>,
        F: Fn(&Document) -> Result<Self, InternalError> + 'static,
    {
        FlatMapStream::new(self, owned_fields(inner_fields), Rc::new(mapper)).map(Self::FlatMap)
    }

    /// First row for each distinct value of `fields`.
    pub fn distinct<S: AsRef<str>>(self, fields: &[S]) -> Result<Self, InternalError> {
        DistinctStream::new(self, owned_fields(fields)).map(Self::Distinct)
    }

    /// Reinterpret the stream as ordered by a suffix of its index fields.
    pub fn order_by<S: AsRef<str>>(self, fields: &[S]) -> Result<Self, InternalError> {
        OrderByStream::new(self, owned_fields(fields)).map(Self::OrderBy)
    }

    /// Keep rows matching `predicate`; the rest still count as read.
    #[must_use]
    pub fn filter_with<F>(self, predicate: F) -> Self
    where
        F: Fn(&Document) -> Result<bool, InternalError> + 'static,
    {
        Self::Filter(FilterStream::new(self, Rc::new(predicate)))
    }

    /// Transform documents; returning `None` filters the row.
    #[must_use]
    pub fn map<F>(self, mapper: F) -> Self
    where
        F: Fn(Document) -> Result<Option<Document>, InternalError> + 'static,
    {
        Self::Map(MapStream::new(self, Rc::new(mapper)))
    }
}

fn owned_fields<S: AsRef<str>>(fields: &[S]) -> Vec<String> {
    fields.iter().map(|field| field.as_ref().to_string()).collect()
}

// Order and index fields every child of a multi-child operator must share.
fn common_shape(
    operator: &'static str,
    streams: &[QueryStream],
) -> Result<(Direction, Vec<String>), StreamPlanError> {
    let Some(first) = streams.first() else {
        return Err(StreamPlanError::NoChildren { operator });
    };
    let order = first.order();
    let index_fields = first.index_fields();

    for (child, stream) in streams.iter().enumerate().skip(1) {
        if stream.order() != order {
            return Err(StreamPlanError::OrderMismatch {
                operator,
                child,
                expected: order,
                found: stream.order(),
            });
        }
        if stream.index_fields() != index_fields {
            return Err(StreamPlanError::IndexFieldsMismatch {
                operator,
                child,
                expected: index_fields.to_vec(),
                found: stream.index_fields().to_vec(),
            });
        }
    }

    Ok((order, index_fields.to_vec()))
}

// Longest prefix pinned in every child.
fn common_equality_prefix(streams: &[QueryStream]) -> IndexKey {
    let mut children = streams.iter();
    let Some(first) = children.next() else {
        return IndexKey::empty();
    };

    children.fold(first.equality_prefix(), |prefix, stream| {
        prefix.common_prefix(&stream.equality_prefix())
    })
}

fn narrow_all(streams: &[QueryStream], bounds: &IndexBounds) -> Result<Vec<QueryStream>, InternalError> {
    streams.iter().map(|stream| stream.narrow(bounds)).collect()
}
