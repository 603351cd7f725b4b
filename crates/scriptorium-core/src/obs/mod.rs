//! Observability: structured logging setup and the metrics sink boundary.

pub(crate) mod logging;
pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use logging::{LogFormat, init_logging};
pub use metrics::{EntityCounters, MetricsReport, OpCounters};
pub use sink::{CounterSink, EditOutcome, MetricsEvent, MetricsSink};
