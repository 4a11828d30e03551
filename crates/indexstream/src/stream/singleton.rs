use crate::{
    direction::Direction,
    document::Document,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    stream::{
        IndexedStream, QueryStream, RowStream, RowStreamBox, ScanStats, StreamPlanError,
        StreamRow,
    },
};

///
/// SingletonStream
///
/// Exactly one row at a full-length key. The row may be a filtered
/// placeholder (`doc == None`) that still counts as one row read.
///

#[derive(Clone, Debug)]
pub struct SingletonStream {
    key: IndexKey,
    doc: Option<Document>,
    order: Direction,
    index_fields: Vec<String>,
}

impl SingletonStream {
    pub fn new(
        key: IndexKey,
        doc: Option<Document>,
        order: Direction,
        index_fields: Vec<String>,
    ) -> Result<Self, InternalError> {
        if key.len() != index_fields.len() {
            return Err(StreamPlanError::SingletonKeyLength {
                key_len: key.len(),
                field_count: index_fields.len(),
            }
            .into());
        }

        Ok(Self {
            key,
            doc,
            order,
            index_fields,
        })
    }

    #[must_use]
    pub const fn key(&self) -> &IndexKey {
        &self.key
    }
}

impl IndexedStream for SingletonStream {
    fn order(&self) -> Direction {
        self.order
    }

    fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    fn equality_prefix(&self) -> IndexKey {
        self.key.clone()
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        bounds.validate_for(&self.index_fields)?;

        if bounds.contains(&self.key) {
            Ok(QueryStream::Singleton(self.clone()))
        } else {
            Ok(QueryStream::Empty(EmptyStream::new(
                self.order,
                self.index_fields.clone(),
            )))
        }
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        Ok(Box::new(OnceRows(Some((self.key.clone(), self.doc.clone())))))
    }
}

///
/// EmptyStream
///

#[derive(Clone, Debug)]
pub struct EmptyStream {
    order: Direction,
    index_fields: Vec<String>,
}

impl EmptyStream {
    #[must_use]
    pub const fn new(order: Direction, index_fields: Vec<String>) -> Self {
        Self {
            order,
            index_fields,
        }
    }
}

impl IndexedStream for EmptyStream {
    fn order(&self) -> Direction {
        self.order
    }

    fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    fn equality_prefix(&self) -> IndexKey {
        IndexKey::empty()
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        bounds.validate_for(&self.index_fields)?;

        Ok(QueryStream::Empty(self.clone()))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        Ok(Box::new(OnceRows(None)))
    }
}

// Zero or one pending row.
struct OnceRows(Option<StreamRow>);

impl RowStream for OnceRows {
    fn next_row(&mut self, _stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        Ok(self.0.take())
    }
}
