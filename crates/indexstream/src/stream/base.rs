use crate::{
    direction::Direction,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    obs::sink::{self, MetricsEvent},
    range::{SimpleRange, split_range},
    store::{IndexStore, RowIter, ScanRequest},
    stream::{IndexedStream, QueryStream, RowStream, RowStreamBox, ScanStats, StreamRow},
};
use std::{fmt, rc::Rc, vec};

///
/// BaseRangeStream
///
/// Rows of one index inside one two-sided bound. Opening it lowers the bound
/// into store-legal ranges and scans them one after another.
///

#[derive(Clone)]
pub struct BaseRangeStream {
    store: Rc<dyn IndexStore>,
    table: String,
    index: String,
    index_fields: Vec<String>,
    order: Direction,
    bounds: IndexBounds,
}

impl BaseRangeStream {
    pub fn new(
        store: Rc<dyn IndexStore>,
        table: &str,
        index: &str,
        bounds: IndexBounds,
        order: Direction,
    ) -> Result<Self, InternalError> {
        let index_fields = store.index_fields(table, index)?;
        bounds.validate_for(&index_fields)?;

        Ok(Self {
            store,
            table: table.to_string(),
            index: index.to_string(),
            index_fields,
            order,
            bounds,
        })
    }

    #[must_use]
    pub const fn bounds(&self) -> &IndexBounds {
        &self.bounds
    }

    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }
}

impl fmt::Debug for BaseRangeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRangeStream")
            .field("table", &self.table)
            .field("index", &self.index)
            .field("index_fields", &self.index_fields)
            .field("order", &self.order)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl IndexedStream for BaseRangeStream {
    fn order(&self) -> Direction {
        self.order
    }

    fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    fn equality_prefix(&self) -> IndexKey {
        self.bounds.common_prefix()
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        bounds.validate_for(&self.index_fields)?;

        Ok(QueryStream::BaseRange(Self {
            bounds: self.bounds.intersect(bounds),
            ..self.clone()
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        let ranges = split_range(&self.index_fields, self.order, &self.bounds)?;

        Ok(Box::new(BaseRangeRows {
            stream: self.clone(),
            ranges: ranges.into_iter(),
            current: None,
        }))
    }

    fn table(&self) -> Option<&str> {
        Some(&self.table)
    }
}

///
/// BaseRangeRows
///
/// At most one store scan is live at a time.
///

struct BaseRangeRows {
    stream: BaseRangeStream,
    ranges: vec::IntoIter<SimpleRange>,
    current: Option<RowIter>,
}

impl BaseRangeRows {
    fn open_scan(&self, range: SimpleRange, stats: &mut ScanStats) -> Result<RowIter, InternalError> {
        let request = ScanRequest {
            table: self.stream.table.clone(),
            index: self.stream.index.clone(),
            index_fields: self.stream.index_fields.clone(),
            range,
            direction: self.stream.order,
        };
        let rows = self.stream.store.scan(&request)?;

        stats.scans_opened = stats.scans_opened.saturating_add(1);
        sink::record(MetricsEvent::ScanOpened {
            table: &self.stream.table,
            index: &self.stream.index,
        });

        Ok(rows)
    }
}

impl RowStream for BaseRangeRows {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        loop {
            if let Some(rows) = self.current.as_mut() {
                if let Some(row) = rows.next() {
                    let doc = row?;
                    stats.rows_scanned = stats.rows_scanned.saturating_add(1);
                    sink::record(MetricsEvent::RowsScanned {
                        table: &self.stream.table,
                        rows: 1,
                    });

                    return Ok(Some((doc.index_key(&self.stream.index_fields), Some(doc))));
                }
                self.current = None;
            }

            let Some(range) = self.ranges.next() else {
                return Ok(None);
            };
            self.current = Some(self.open_scan(range, stats)?);
        }
    }
}
