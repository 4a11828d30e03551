use crate::{
    direction::Direction,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    stream::{
        IndexedStream, QueryStream, RowStream, RowStreamBox, ScanStats, StreamPlanError,
        StreamRow,
    },
};

///
/// OrderByStream
///
/// Presents a stream as sorted by a suffix of its index fields. Valid only
/// when every dropped leading field is pinned, so the stream already is in
/// that order. Keys are reported without the dropped fields.
///

#[derive(Clone, Debug)]
pub struct OrderByStream {
    stream: Box<QueryStream>,
    fields: Vec<String>,
    pinned: IndexKey,
}

impl OrderByStream {
    pub fn new(stream: QueryStream, fields: Vec<String>) -> Result<Self, InternalError> {
        let index_fields = stream.index_fields();
        let equality_prefix = stream.equality_prefix();
        let aligned = index_fields.ends_with(&fields)
            && equality_prefix.len() >= index_fields.len() - fields.len();

        if !aligned {
            return Err(StreamPlanError::OrderByFieldsUnaligned {
                fields,
                index_fields: index_fields.to_vec(),
                pinned: equality_prefix.len(),
            }
            .into());
        }

        let pinned = equality_prefix.prefix(index_fields.len() - fields.len());

        Ok(Self {
            stream: Box::new(stream),
            fields,
            pinned,
        })
    }

    /// Values of the dropped leading fields.
    #[must_use]
    pub const fn pinned(&self) -> &IndexKey {
        &self.pinned
    }
}

impl IndexedStream for OrderByStream {
    fn order(&self) -> Direction {
        self.stream.order()
    }

    fn index_fields(&self) -> &[String] {
        &self.fields
    }

    fn equality_prefix(&self) -> IndexKey {
        self.stream.equality_prefix().suffix_after(self.pinned.len())
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        bounds.validate_for(&self.fields)?;

        let inner = IndexBounds::new(
            self.pinned.concat(&bounds.lower),
            bounds.lower_inclusive,
            self.pinned.concat(&bounds.upper),
            bounds.upper_inclusive,
        );

        Ok(QueryStream::OrderBy(Self {
            stream: Box::new(self.stream.narrow(&inner)?),
            fields: self.fields.clone(),
            pinned: self.pinned.clone(),
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        Ok(Box::new(StripPrefixRows {
            inner: self.stream.open()?,
            dropped: self.pinned.len(),
        }))
    }

    fn table(&self) -> Option<&str> {
        self.stream.table()
    }
}

// Drops the pinned leading slots from every key.
struct StripPrefixRows {
    inner: RowStreamBox,
    dropped: usize,
}

impl RowStream for StripPrefixRows {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        Ok(self
            .inner
            .next_row(stats)?
            .map(|(key, doc)| (key.suffix_after(self.dropped), doc)))
    }
}
