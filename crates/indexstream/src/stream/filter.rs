use crate::{
    direction::Direction,
    document::Document,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    stream::{IndexedStream, QueryStream, RowStream, RowStreamBox, ScanStats, StreamRow},
};
use std::{fmt, rc::Rc};

pub type RowPredicate = Rc<dyn Fn(&Document) -> Result<bool, InternalError>>;
pub type RowMapper = Rc<dyn Fn(Document) -> Result<Option<Document>, InternalError>>;

///
/// FilterStream
///
/// Rows failing the predicate are still pulled, as `None` documents, so row
/// accounting above this stream sees every row read.
///

#[derive(Clone)]
pub struct FilterStream {
    stream: Box<QueryStream>,
    predicate: RowPredicate,
}

impl FilterStream {
    #[must_use]
    pub fn new(stream: QueryStream, predicate: RowPredicate) -> Self {
        Self {
            stream: Box::new(stream),
            predicate,
        }
    }
}

impl fmt::Debug for FilterStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStream")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl IndexedStream for FilterStream {
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
        Ok(QueryStream::Filter(Self {
            stream: Box::new(self.stream.narrow(bounds)?),
            predicate: Rc::clone(&self.predicate),
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        let inner = self.stream.open()?;
        let predicate = Rc::clone(&self.predicate);

        Ok(Box::new(TransformRows::new(inner, move |doc| {
            Ok(if predicate(&doc)? { Some(doc) } else { None })
        })))
    }

    fn table(&self) -> Option<&str> {
        self.stream.table()
    }
}

///
/// MapStream
///

#[derive(Clone)]
pub struct MapStream {
    stream: Box<QueryStream>,
    mapper: RowMapper,
}

impl MapStream {
    #[must_use]
    pub fn new(stream: QueryStream, mapper: RowMapper) -> Self {
        Self {
            stream: Box::new(stream),
            mapper,
        }
    }
}

impl fmt::Debug for MapStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStream")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl IndexedStream for MapStream {
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
        Ok(QueryStream::Map(Self {
            stream: Box::new(self.stream.narrow(bounds)?),
            mapper: Rc::clone(&self.mapper),
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        let inner = self.stream.open()?;
        let mapper = Rc::clone(&self.mapper);

        Ok(Box::new(TransformRows::new(inner, move |doc| mapper(doc))))
    }

    fn table(&self) -> Option<&str> {
        self.stream.table()
    }
}

///
/// TransformRows
///
/// Applies a document transform; keys pass through untouched and filtered
/// rows stay filtered.
///

struct TransformRows<F> {
    inner: RowStreamBox,
    transform: F,
}

impl<F> TransformRows<F>
where
    F: Fn(Document) -> Result<Option<Document>, InternalError>,
{
    fn new(inner: RowStreamBox, transform: F) -> Self {
        Self { inner, transform }
    }
}

impl<F> RowStream for TransformRows<F>
where
    F: Fn(Document) -> Result<Option<Document>, InternalError>,
{
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        let Some((key, doc)) = self.inner.next_row(stats)? else {
            return Ok(None);
        };
        let doc = match doc {
            Some(doc) => (self.transform)(doc)?,
            None => None,
        };

        Ok(Some((key, doc)))
    }
}
