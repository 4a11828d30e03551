use crate::{
    direction::Direction,
    document::Document,
    error::InternalError,
    key::{IndexBounds, IndexKey},
    stream::{
        IndexedStream, QueryStream, RowStream, RowStreamBox, ScanStats, SingletonStream,
        StreamPlanError, StreamRow,
    },
};
use std::{fmt, rc::Rc};

pub type StreamMapper = Rc<dyn Fn(&Document) -> Result<QueryStream, InternalError>>;

///
/// InnerEdge
///
/// Inner-stream restriction that applies only under one outer row: the part
/// of a narrowed bound that reaches past the outer key.
///

#[derive(Clone, Debug)]
struct InnerEdge {
    outer_key: IndexKey,
    bounds: IndexBounds,
}

///
/// FlatMapStream
///
/// For each outer row, the rows of the inner stream built from it, in outer
/// order. Composite keys are the outer key followed by the inner key. A
/// filtered outer row yields one filtered placeholder so its read is still
/// accounted for.
///

#[derive(Clone)]
pub struct FlatMapStream {
    outer: Box<QueryStream>,
    mapper: StreamMapper,
    inner_fields: Vec<String>,
    index_fields: Vec<String>,
    edges: Vec<InnerEdge>,
}

impl FlatMapStream {
    pub fn new(
        outer: QueryStream,
        inner_fields: Vec<String>,
        mapper: StreamMapper,
    ) -> Result<Self, InternalError> {
        let mut index_fields = outer.index_fields().to_vec();
        index_fields.extend(inner_fields.iter().cloned());

        Ok(Self {
            outer: Box::new(outer),
            mapper,
            inner_fields,
            index_fields,
            edges: Vec::new(),
        })
    }

    #[must_use]
    pub fn inner_fields(&self) -> &[String] {
        &self.inner_fields
    }

    // Split one end of a composite bound into its outer part and, when the
    // bound reaches into the inner fields, the inner edge it implies.
    fn split_end(
        &self,
        key: &IndexKey,
        inclusive: bool,
        lower: bool,
    ) -> (IndexKey, bool, Option<InnerEdge>) {
        let outer_len = self.outer.index_fields().len();
        if key.len() <= outer_len {
            return (key.clone(), inclusive, None);
        }

        let outer_key = key.prefix(outer_len);
        let inner_key = key.suffix_after(outer_len);
        let bounds = if lower {
            IndexBounds::new(inner_key, inclusive, IndexKey::empty(), true)
        } else {
            IndexBounds::new(IndexKey::empty(), true, inner_key, inclusive)
        };

        (
            outer_key.clone(),
            true,
            Some(InnerEdge { outer_key, bounds }),
        )
    }
}

// One edge per outer key; restrictions on the same outer row intersect.
fn add_edge(edges: &mut Vec<InnerEdge>, edge: InnerEdge) {
    match edges.iter_mut().find(|have| have.outer_key == edge.outer_key) {
        Some(have) => have.bounds = have.bounds.intersect(&edge.bounds),
        None => edges.push(edge),
    }
}

impl fmt::Debug for FlatMapStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMapStream")
            .field("outer", &self.outer)
            .field("inner_fields", &self.inner_fields)
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}

impl IndexedStream for FlatMapStream {
    fn order(&self) -> Direction {
        self.outer.order()
    }

    fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    fn equality_prefix(&self) -> IndexKey {
        self.outer.equality_prefix()
    }

    fn narrow(&self, bounds: &IndexBounds) -> Result<QueryStream, InternalError> {
        bounds.validate_for(&self.index_fields)?;

        let (lower, lower_inclusive, lower_edge) =
            self.split_end(&bounds.lower, bounds.lower_inclusive, true);
        let (upper, upper_inclusive, upper_edge) =
            self.split_end(&bounds.upper, bounds.upper_inclusive, false);
        let outer_bounds = IndexBounds::new(lower, lower_inclusive, upper, upper_inclusive);
        let outer = self.outer.narrow(&outer_bounds)?;

        // Edges on outer rows the new bounds exclude can never apply again.
        let mut edges: Vec<InnerEdge> = self
            .edges
            .iter()
            .filter(|edge| outer_bounds.contains(&edge.outer_key))
            .cloned()
            .collect();
        for edge in lower_edge.into_iter().chain(upper_edge) {
            add_edge(&mut edges, edge);
        }

        Ok(QueryStream::FlatMap(Self {
            outer: Box::new(outer),
            mapper: Rc::clone(&self.mapper),
            inner_fields: self.inner_fields.clone(),
            index_fields: self.index_fields.clone(),
            edges,
        }))
    }

    fn open(&self) -> Result<RowStreamBox, InternalError> {
        Ok(Box::new(FlatMapRows {
            outer: self.outer.open()?,
            mapper: Rc::clone(&self.mapper),
            order: self.outer.order(),
            inner_fields: self.inner_fields.clone(),
            edges: self.edges.clone(),
            current: None,
            outer_rows: 0,
        }))
    }

    fn table(&self) -> Option<&str> {
        self.outer.table()
    }
}

///
/// FlatMapRows
///
/// Exactly one inner stream is live at a time.
///

struct FlatMapRows {
    outer: RowStreamBox,
    mapper: StreamMapper,
    order: Direction,
    inner_fields: Vec<String>,
    edges: Vec<InnerEdge>,
    current: Option<(IndexKey, RowStreamBox)>,
    outer_rows: usize,
}

impl FlatMapRows {
    fn check_inner(&self, inner: &QueryStream) -> Result<(), StreamPlanError> {
        if inner.order() != self.order {
            return Err(StreamPlanError::OrderMismatch {
                operator: "flat_map",
                child: self.outer_rows,
                expected: self.order,
                found: inner.order(),
            });
        }
        if inner.index_fields() != self.inner_fields.as_slice() {
            return Err(StreamPlanError::IndexFieldsMismatch {
                operator: "flat_map",
                child: self.outer_rows,
                expected: self.inner_fields.clone(),
                found: inner.index_fields().to_vec(),
            });
        }

        Ok(())
    }

    // Inner stream for one outer row, restricted by the edges sitting on it.
    fn inner_for(
        &self,
        outer_key: &IndexKey,
        outer_doc: Option<&Document>,
    ) -> Result<QueryStream, InternalError> {
        let mut inner = match outer_doc {
            Some(doc) => {
                let inner = (self.mapper)(doc)?;
                self.check_inner(&inner)?;
                inner
            }
            None => QueryStream::Singleton(SingletonStream::new(
                IndexKey::new(vec![None; self.inner_fields.len()]),
                None,
                self.order,
                self.inner_fields.clone(),
            )?),
        };

        if let Some(edge) = self.edges.iter().find(|edge| edge.outer_key == *outer_key) {
            inner = inner.narrow(&edge.bounds)?;
        }

        Ok(inner)
    }
}

impl RowStream for FlatMapRows {
    fn next_row(&mut self, stats: &mut ScanStats) -> Result<Option<StreamRow>, InternalError> {
        loop {
            if let Some((outer_key, inner)) = self.current.as_mut() {
                if let Some((inner_key, doc)) = inner.next_row(stats)? {
                    return Ok(Some((outer_key.concat(&inner_key), doc)));
                }
                self.current = None;
            }

            let Some((outer_key, outer_doc)) = self.outer.next_row(stats)? else {
                return Ok(None);
            };
            self.outer_rows += 1;

            let inner = self.inner_for(&outer_key, outer_doc.as_ref())?;
            self.current = Some((outer_key, inner.open()?));
        }
    }
}

///
/// TESTS
///
