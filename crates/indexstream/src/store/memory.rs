use crate::{
    document::Document,
    error::InternalError,
    key::IndexKey,
    store::{IndexStore, RowIter, ScanRequest},
    value::Value,
};
use std::{cell::RefCell, collections::BTreeMap};

/// System field holding the insertion order of a row.
pub const CREATION_TIME_FIELD: &str = "_creationTime";

/// System field holding the row identifier.
pub const ID_FIELD: &str = "_id";

/// Index every table carries without being declared.
pub const CREATION_TIME_INDEX: &str = "by_creation_time";

///
/// MemoryTable
///

#[derive(Debug, Default)]
struct MemoryTable {
    indexes: BTreeMap<String, Vec<String>>,
    rows: Vec<Document>,
    next_seq: u64,
}

impl MemoryTable {
    fn new() -> Self {
        let mut indexes = BTreeMap::new();
        indexes.insert(
            CREATION_TIME_INDEX.to_string(),
            vec![CREATION_TIME_FIELD.to_string(), ID_FIELD.to_string()],
        );

        Self {
            indexes,
            ..Self::default()
        }
    }
}

///
/// MemoryStore
///
/// In-process store used by tests and embedders. Every index is suffixed with
/// the `_creationTime` and `_id` system fields, so index keys are unique per
/// row. Each scan works on a snapshot taken when the scan is opened.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<BTreeMap<String, MemoryTable>>,
    fail_next_scan: RefCell<Option<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an index and return its full field list, system fields included.
    pub fn define_index(&self, table: &str, index: &str, fields: &[&str]) -> Vec<String> {
        let mut full: Vec<String> = fields.iter().map(ToString::to_string).collect();
        for system in [CREATION_TIME_FIELD, ID_FIELD] {
            if !full.iter().any(|field| field == system) {
                full.push(system.to_string());
            }
        }

        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_insert_with(MemoryTable::new)
            .indexes
            .insert(index.to_string(), full.clone());

        full
    }

    /// Insert a row, assigning any missing system fields. Returns the stored row.
    pub fn insert(&self, table: &str, mut doc: Document) -> Document {
        let mut tables = self.tables.borrow_mut();
        let entry = tables
            .entry(table.to_string())
            .or_insert_with(MemoryTable::new);

        entry.next_seq += 1;
        let seq = entry.next_seq;
        if doc.get(CREATION_TIME_FIELD).is_none() {
            #[allow(clippy::cast_precision_loss)]
            let creation_time = seq as f64;
            doc.insert(CREATION_TIME_FIELD, Value::Float(creation_time));
        }
        if doc.get(ID_FIELD).is_none() {
            doc.insert(ID_FIELD, Value::text(format!("{table}:{seq:08}")));
        }
        entry.rows.push(doc.clone());

        doc
    }

    /// Remove every row matching `predicate`; returns how many were removed.
    pub fn remove_where(&self, table: &str, predicate: impl Fn(&Document) -> bool) -> usize {
        let mut tables = self.tables.borrow_mut();
        let Some(entry) = tables.get_mut(table) else {
            return 0;
        };

        let before = entry.rows.len();
        entry.rows.retain(|doc| !predicate(doc));

        before - entry.rows.len()
    }

    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables
            .borrow()
            .get(table)
            .map_or(0, |entry| entry.rows.len())
    }

    /// Make the next scan fail with an internal store error.
    pub fn fail_next_scan(&self, message: impl Into<String>) {
        *self.fail_next_scan.borrow_mut() = Some(message.into());
    }
}

impl IndexStore for MemoryStore {
    fn index_fields(&self, table: &str, index: &str) -> Result<Vec<String>, InternalError> {
        let tables = self.tables.borrow();
        let entry = tables
            .get(table)
            .ok_or_else(|| InternalError::store_not_found(format!("table '{table}'")))?;

        entry
            .indexes
            .get(index)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("index '{table}.{index}'")))
    }

    fn scan(&self, request: &ScanRequest) -> Result<RowIter, InternalError> {
        if let Some(message) = self.fail_next_scan.borrow_mut().take() {
            return Err(InternalError::store_internal(message));
        }
        request.validate()?;

        let declared = self.index_fields(&request.table, &request.index)?;
        if declared != request.index_fields {
            return Err(InternalError::store_unsupported(format!(
                "index '{}.{}' has fields {declared:?}, scan requested {:?}",
                request.table, request.index, request.index_fields
            )));
        }

        let tables = self.tables.borrow();
        let rows = tables.get(&request.table).map_or(&[][..], |t| &t.rows[..]);
        let mut matched: Vec<(IndexKey, Document)> = rows
            .iter()
            .map(|doc| (doc.index_key(&declared), doc))
            .filter(|(key, _)| request.range.matches(&declared, key))
            .map(|(key, doc)| (key, doc.clone()))
            .collect();
        matched.sort_by(|(left, _), (right, _)| request.direction.apply(left.cmp(right)));

        Ok(Box::new(matched.into_iter().map(|(_, doc)| Ok(doc))))
    }
}
