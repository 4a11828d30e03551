//! Indexed query streams: composable, order-preserving lazy sequences built on
//! top of a store that can only scan an index with an equality prefix and at
//! most one trailing inequality, plus resumable cursor pagination over them.
#![warn(unreachable_pub)]

pub mod config;
pub mod cursor;
pub mod direction;
pub mod document;
pub mod error;
pub mod key;
pub mod obs;
pub mod page;
pub mod range;
pub mod store;
pub mod stream;
pub mod value;

///
/// CONSTANTS
///

/// Literal text that stands for the absent key marker inside a cursor.
pub const ABSENT_MARKER: &str = "undefined";

/// Upper bound on cursor text accepted from untrusted callers.
pub const MAX_CURSOR_LEN: usize = 8 * 1024;

///
/// Prelude
///
/// Prelude contains only the vocabulary needed to build and page streams.
///

pub mod prelude {
    pub use crate::{
        cursor::Cursor,
        direction::Direction,
        document::Document,
        key::{IndexBounds, IndexKey},
        page::{Page, PageRequest, SplitAdvisory},
        range::IndexRangeBuilder,
        store::{IndexStore, MemoryStore},
        stream::{IndexedStream, QueryStream, ScanStats},
        value::Value,
    };
}
