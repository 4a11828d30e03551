//! Module: page
//! Responsibility: turning any stream into resumable, cost-bounded pages.
//! Does not own: stream composition or cursor text encoding.
//! Boundary: callers hand a stream plus a `PageRequest` and get a `Page` back.

#[cfg(test)]
mod tests;

use crate::{
    config::StreamConfig,
    cursor::{Cursor, deserialize_cursor_with_limit, serialize_cursor},
    direction::Direction,
    document::Document,
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::{IndexBounds, IndexKey},
    obs::sink::{self, MetricsEvent},
    stream::{IndexedStream, QueryStream, RowStream, ScanStats},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// PageRequestError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum PageRequestError {
    #[error("a page of zero items needs a resume cursor")]
    ZeroTargetWithoutCursor,

    #[error("maximum rows read must be at least 1")]
    ZeroRowCap,
}

impl From<PageRequestError> for InternalError {
    fn from(err: PageRequestError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Page, err.to_string())
    }
}

///
/// SplitAdvisory
///
/// Signal that a page read enough rows to be worth re-fetching as two
/// independent halves around `Page::split_cursor`.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SplitAdvisory {
    Recommended,
    Required,
}

///
/// PageRequest
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PageRequest {
    /// Resume strictly after this position. `None` starts at the beginning.
    pub cursor: Option<Cursor>,

    /// Soft target; ignored when `end_cursor` is set.
    pub num_items: usize,

    /// Stop at exactly this position (inclusive), as served earlier.
    pub end_cursor: Option<Cursor>,

    /// Hard cap on rows read, overriding the configured cap.
    pub maximum_rows_read: Option<usize>,
}

impl PageRequest {
    /// First page of up to `num_items` documents.
    #[must_use]
    pub const fn first(num_items: usize) -> Self {
        Self {
            cursor: None,
            num_items,
            end_cursor: None,
            maximum_rows_read: None,
        }
    }

    /// Next page after `cursor`.
    #[must_use]
    pub const fn after(cursor: Cursor, num_items: usize) -> Self {
        Self {
            cursor: Some(cursor),
            num_items,
            end_cursor: None,
            maximum_rows_read: None,
        }
    }

    #[must_use]
    pub fn with_end_cursor(mut self, end_cursor: Cursor) -> Self {
        self.end_cursor = Some(end_cursor);
        self
    }

    #[must_use]
    pub const fn with_maximum_rows_read(mut self, maximum_rows_read: usize) -> Self {
        self.maximum_rows_read = Some(maximum_rows_read);
        self
    }
}

///
/// Page
///

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub items: Vec<Document>,
    pub has_more: bool,

    /// Position to resume from; the end cursor when nothing is left.
    pub continue_cursor: Cursor,

    pub split_advisory: Option<SplitAdvisory>,

    /// Midpoint of the rows read, set together with `split_advisory`.
    pub split_cursor: Option<Cursor>,

    /// Rows pulled for this page, filtered rows included.
    pub rows_read: usize,
}

impl Page {
    fn resume_only(cursor: Cursor) -> Self {
        Self {
            items: Vec::new(),
            has_more: true,
            continue_cursor: cursor,
            split_advisory: None,
            split_cursor: None,
            rows_read: 0,
        }
    }
}

/// Serve one page of `stream` with the default configuration.
pub fn paginate(
    stream: &QueryStream,
    request: &PageRequest,
    stats: &mut ScanStats,
) -> Result<Page, InternalError> {
    paginate_with_config(stream, request, &StreamConfig::default(), stats)
}

/// Serve one page of `stream`.
///
/// With an end cursor the page covers exactly `(cursor, end_cursor]` and the
/// item target is ignored, so a page re-fetched later neither gaps nor
/// overlaps its neighbours. Only the row cap can cut it short.
pub fn paginate_with_config(
    stream: &QueryStream,
    request: &PageRequest,
    config: &StreamConfig,
    stats: &mut ScanStats,
) -> Result<Page, InternalError> {
    let max_rows = request.maximum_rows_read.or(config.maximum_rows_read);
    if max_rows == Some(0) {
        return Err(PageRequestError::ZeroRowCap.into());
    }
    if request.num_items == 0 {
        let Some(cursor) = request.cursor.clone() else {
            return Err(PageRequestError::ZeroTargetWithoutCursor.into());
        };
        let page = Page::resume_only(cursor);
        record_page(stream, &page);

        return Ok(page);
    }

    // Start is exclusive (strictly after the cursor); end is inclusive.
    let start = match &request.cursor {
        Some(cursor) => (decode(cursor, config)?, false),
        None => (IndexKey::empty(), true),
    };
    let (end, max_items) = match &request.end_cursor {
        Some(cursor) => ((decode(cursor, config)?, true), None),
        None => ((IndexKey::empty(), true), Some(request.num_items)),
    };
    let ((lower, lower_inclusive), (upper, upper_inclusive)) = match stream.order() {
        Direction::Asc => (start, end),
        Direction::Desc => (end, start),
    };
    let narrowed = stream.narrow(&IndexBounds::new(
        lower,
        lower_inclusive,
        upper,
        upper_inclusive,
    ))?;

    let mut items = Vec::new();
    let mut keys: Vec<IndexKey> = Vec::new();
    let mut has_more = request
        .end_cursor
        .as_ref()
        .is_some_and(|cursor| !cursor.is_end());
    let mut continue_cursor = request.end_cursor.clone().unwrap_or_else(Cursor::end);

    let mut rows = narrowed.open()?;
    while let Some((key, doc)) = rows.next_row(stats)? {
        items.extend(doc);
        keys.push(key);

        let items_full = max_items.is_some_and(|max| items.len() >= max);
        let rows_full = max_rows.is_some_and(|max| keys.len() >= max);
        if items_full || rows_full {
            has_more = true;
            if let Some(last) = keys.last() {
                continue_cursor = serialize_cursor(last);
            }
            break;
        }
    }

    let split_advisory = if max_rows.is_some_and(|max| keys.len() >= max) {
        Some(SplitAdvisory::Required)
    } else if keys.len() >= request.num_items.saturating_add(config.split_recommended_slack) {
        Some(SplitAdvisory::Recommended)
    } else {
        None
    };
    let split_cursor = split_advisory
        .and_then(|_| keys.get(keys.len().saturating_sub(1) / 2))
        .map(serialize_cursor);

    let page = Page {
        items,
        has_more,
        continue_cursor,
        split_advisory,
        split_cursor,
        rows_read: keys.len(),
    };
    record_page(stream, &page);

    Ok(page)
}

fn decode(cursor: &Cursor, config: &StreamConfig) -> Result<IndexKey, InternalError> {
    Ok(deserialize_cursor_with_limit(cursor, config.max_cursor_len)?)
}

fn record_page(stream: &QueryStream, page: &Page) {
    sink::record(MetricsEvent::PageServed {
        table: stream.table(),
        items: page.items.len() as u64,
        rows_read: page.rows_read as u64,
        advisory: page.split_advisory,
    });
}
