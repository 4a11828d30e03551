//! Metrics sink boundary.
//!
//! Stream and page logic never touches `obs::metrics` directly.
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.
use crate::{obs::metrics, page::SplitAdvisory};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// InvariantKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvariantKind {
    ConcatOrder,
    MergeOrder,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricsEvent<'a> {
    ScanOpened {
        table: &'a str,
        index: &'a str,
    },
    RowsScanned {
        table: &'a str,
        rows: u64,
    },
    PageServed {
        table: Option<&'a str>,
        items: u64,
        rows_read: u64,
        advisory: Option<SplitAdvisory>,
    },
    StreamInvariant {
        kind: InvariantKind,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ScanOpened { table, index: _ } => {
                metrics::with_state_mut(|m| {
                    m.ops.scans_opened = m.ops.scans_opened.saturating_add(1);
                    let entry = m.tables.entry(table.to_string()).or_default();
                    entry.scans_opened = entry.scans_opened.saturating_add(1);
                });
            }

            MetricsEvent::RowsScanned { table, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows);
                    let entry = m.tables.entry(table.to_string()).or_default();
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows);
                });
            }

            MetricsEvent::PageServed {
                table,
                items,
                rows_read,
                advisory,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.pages_served = m.ops.pages_served.saturating_add(1);
                    m.ops.page_items = m.ops.page_items.saturating_add(items);
                    m.ops.page_rows_read = m.ops.page_rows_read.saturating_add(rows_read);
                    match advisory {
                        Some(SplitAdvisory::Recommended) => {
                            m.ops.split_recommended = m.ops.split_recommended.saturating_add(1);
                        }
                        Some(SplitAdvisory::Required) => {
                            m.ops.split_required = m.ops.split_required.saturating_add(1);
                        }
                        None => {}
                    }

                    if let Some(table) = table {
                        let entry = m.tables.entry(table.to_string()).or_default();
                        entry.pages_served = entry.pages_served.saturating_add(1);
                        entry.page_items = entry.page_items.saturating_add(items);
                    }
                });
            }

            MetricsEvent::StreamInvariant { kind } => {
                metrics::with_state_mut(|m| match kind {
                    InvariantKind::ConcatOrder => {
                        m.ops.concat_order_violations =
                            m.ops.concat_order_violations.saturating_add(1);
                    }
                    InvariantKind::MergeOrder => {
                        m.ops.merge_order_violations =
                            m.ops.merge_order_violations.saturating_add(1);
                    }
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    // Clone out of the slot so a sink may itself install an override.
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics counters on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored on every exit path, including unwinding.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
