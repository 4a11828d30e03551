//! Observability: runtime counters and the sink abstraction that feeds them.
//!
//! Streams and the paginator report through `sink::record`; nothing here
//! reads store state.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{EventOps, EventReport, EventState, TableCounters, TableSummary};
pub use sink::{
    InvariantKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
