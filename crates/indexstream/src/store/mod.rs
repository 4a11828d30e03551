//! Module: store
//! Responsibility: the single scan primitive the engine consumes from a backing store.
//! Does not own: range lowering, ordering across scans, or pagination.
//! Boundary: base range streams are the only callers of `IndexStore::scan`.

mod memory;

#[cfg(test)]
mod tests;

use crate::{direction::Direction, document::Document, error::InternalError, range::SimpleRange};

// re-exports
pub use memory::{CREATION_TIME_FIELD, CREATION_TIME_INDEX, ID_FIELD, MemoryStore};

///
/// RowIter
///
/// Ordered rows produced by one scan. Errors are surfaced unchanged to the
/// stream pulling them.
///

pub type RowIter = Box<dyn Iterator<Item = Result<Document, InternalError>>>;

///
/// ScanRequest
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanRequest {
    pub table: String,
    pub index: String,
    pub index_fields: Vec<String>,
    pub range: SimpleRange,
    pub direction: Direction,
}

impl ScanRequest {
    /// Reject ranges the store primitive cannot execute.
    pub fn validate(&self) -> Result<(), InternalError> {
        self.range.validate(&self.index_fields)
    }
}

///
/// IndexStore
///
/// Backing store capability: scan one index with an equality prefix and at
/// most one trailing inequality, in a given direction. Implementations are
/// expected to give a consistent point-in-time view per scan; the engine never
/// retries a failed scan.
///

pub trait IndexStore {
    /// Declared field list of `index` on `table`.
    fn index_fields(&self, table: &str, index: &str) -> Result<Vec<String>, InternalError>;

    fn scan(&self, request: &ScanRequest) -> Result<RowIter, InternalError>;
}
