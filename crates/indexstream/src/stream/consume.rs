use crate::{
    document::Document,
    error::{ErrorClass, ErrorOrigin, InternalError},
    stream::{IndexedStream, QueryStream, RowStream, ScanStats, StreamRow},
};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Errors related to interpreting the documents a stream produced.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ResponseError {
    #[error("expected at most one document, found more (table {table})")]
    NotUnique { table: String },
}

impl ResponseError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::NotUnique { .. } => ErrorClass::Conflict,
        }
    }
}

impl From<ResponseError> for InternalError {
    fn from(err: ResponseError) -> Self {
        Self::new(err.class(), ErrorOrigin::Stream, err.to_string())
    }
}

impl QueryStream {
    // ------------------------------------------------------------------
    // Whole-stream consumption
    // ------------------------------------------------------------------

    /// Every document, in stream order. Filtered rows are read and dropped.
    pub fn collect(&self, stats: &mut ScanStats) -> Result<Vec<Document>, InternalError> {
        let mut rows = self.open()?;
        let mut docs = Vec::new();
        while let Some((_, doc)) = rows.next_row(stats)? {
            docs.extend(doc);
        }

        Ok(docs)
    }

    /// Every row including filtered placeholders, with keys.
    pub fn collect_rows(&self, stats: &mut ScanStats) -> Result<Vec<StreamRow>, InternalError> {
        let mut rows = self.open()?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row(stats)? {
            out.push(row);
        }

        Ok(out)
    }

    // ------------------------------------------------------------------
    // Bounded consumption
    // ------------------------------------------------------------------

    /// At most `limit` documents; nothing is pulled past the last one taken.
    pub fn take(&self, limit: usize, stats: &mut ScanStats) -> Result<Vec<Document>, InternalError> {
        let mut docs = Vec::with_capacity(limit);
        if limit == 0 {
            return Ok(docs);
        }

        let mut rows = self.open()?;
        while let Some((_, doc)) = rows.next_row(stats)? {
            docs.extend(doc);
            if docs.len() >= limit {
                break;
            }
        }

        Ok(docs)
    }

    pub fn first(&self, stats: &mut ScanStats) -> Result<Option<Document>, InternalError> {
        Ok(self.take(1, stats)?.pop())
    }

    /// The only document, if any. A second document is an error.
    pub fn unique(&self, stats: &mut ScanStats) -> Result<Option<Document>, InternalError> {
        let mut docs = self.take(2, stats)?;
        if docs.len() > 1 {
            return Err(ResponseError::NotUnique {
                table: self.table().unwrap_or("<unknown>").to_string(),
            }
            .into());
        }

        Ok(docs.pop())
    }
}
