use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for stream and page activity.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<String, TableCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Store traffic
    pub scans_opened: u64,
    pub rows_scanned: u64,

    // Pagination
    pub pages_served: u64,
    pub page_items: u64,
    pub page_rows_read: u64,
    pub split_recommended: u64,
    pub split_required: u64,

    // Consumption-time failures
    pub concat_order_violations: u64,
    pub merge_order_violations: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub scans_opened: u64,
    pub rows_scanned: u64,
    pub pages_served: u64,
    pub page_items: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,
    pub table_summaries: Vec<TableSummary>,
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub scans_opened: u64,
    pub rows_scanned: u64,
    pub pages_served: u64,
    pub avg_rows_per_scan: f64,
    pub avg_items_per_page: f64,
}

/// Build a report from the in-memory counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut table_summaries: Vec<TableSummary> = snap
        .tables
        .iter()
        .map(|(table, counters)| TableSummary {
            table: table.clone(),
            scans_opened: counters.scans_opened,
            rows_scanned: counters.rows_scanned,
            pages_served: counters.pages_served,
            avg_rows_per_scan: if counters.scans_opened > 0 {
                counters.rows_scanned as f64 / counters.scans_opened as f64
            } else {
                0.0
            },
            avg_items_per_page: if counters.pages_served > 0 {
                counters.page_items as f64 / counters.pages_served as f64
            } else {
                0.0
            },
        })
        .collect();

    // Busiest tables first, then by name for stable output.
    table_summaries.sort_by(|a, b| {
        b.rows_scanned
            .cmp(&a.rows_scanned)
            .then_with(|| a.table.cmp(&b.table))
    });

    EventReport {
        counters: snap,
        table_summaries,
    }
}
