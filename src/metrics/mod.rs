//! Metric registry, sharded aggregation, and histogram utilities.
mod aggregator;
mod histogram;
mod registry;
mod types;

#[cfg(test)]
mod tests;

pub use aggregator::{MetricsAggregator, ShardRecorder};
pub use histogram::LatencyHistogram;
pub use registry::{Builtins, MetricEntry, MetricRegistry};
pub use types::{
    CounterSummary, MetricId, MetricKind, MetricSummary, MetricsSnapshot, RateSummary, Sample,
    TrendSummary, names,
};
