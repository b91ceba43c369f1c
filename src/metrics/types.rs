use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

use super::LatencyHistogram;

/// Built-in metric names. Check outcomes default to [`ERRORS`].
pub mod names {
    pub const HTTP_REQS: &str = "http_reqs";
    pub const HTTP_REQ_DURATION: &str = "http_req_duration";
    pub const HTTP_REQ_FAILED: &str = "http_req_failed";
    pub const DATA_RECEIVED: &str = "data_received";
    pub const ITERATIONS: &str = "iterations";
    pub const ITERATION_DURATION: &str = "iteration_duration";
    pub const CHECKS: &str = "checks";
    pub const ERRORS: &str = "errors";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Rate,
    Trend,
}

impl MetricKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Rate => "rate",
            MetricKind::Trend => "trend",
        }
    }
}

/// Index into the registry; stable for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricId(pub(crate) usize);

impl MetricId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single observation, routed to one shard.
#[derive(Debug, Clone, Copy)]
pub enum Sample {
    Count(MetricId, u64),
    Rate(MetricId, bool),
    Trend(MetricId, Duration),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSummary {
    pub count: u64,
    /// Observations recorded, independent of their values.
    #[serde(default)]
    pub samples: u64,
    pub rate_per_sec: f64,
}

/// `rate` is `nonzero / total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub rate: f64,
    pub nonzero: u64,
    pub total: u64,
}

/// Durations in milliseconds. `histogram` holds the microsecond samples
/// (HDR V2, base64) so arbitrary percentiles can be recomputed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub histogram: String,
}

impl TrendSummary {
    /// Percentile `pct` (0..=100) in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedded histogram cannot be decoded.
    pub fn percentile(&self, pct: f64) -> Result<f64, MetricsError> {
        let hist = LatencyHistogram::decode_base64(&self.histogram)?;
        Ok(micros_to_ms(hist.value_at_quantile(pct_to_quantile(pct))))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSummary {
    Counter(CounterSummary),
    Rate(RateSummary),
    Trend(TrendSummary),
}

impl MetricSummary {
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        match self {
            MetricSummary::Counter(_) => MetricKind::Counter,
            MetricSummary::Rate(_) => MetricKind::Rate,
            MetricSummary::Trend(_) => MetricKind::Trend,
        }
    }

    /// Number of recorded samples, regardless of their values.
    #[must_use]
    pub const fn sample_count(&self) -> u64 {
        match self {
            MetricSummary::Counter(counter) => counter.samples,
            MetricSummary::Rate(rate) => rate.total,
            MetricSummary::Trend(trend) => trend.count,
        }
    }
}

/// Finalized, merged view of every registered metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub elapsed: Duration,
    pub metrics: BTreeMap<String, MetricSummary>,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        match self.metrics.get(name) {
            Some(MetricSummary::Counter(counter)) => counter.count,
            Some(MetricSummary::Rate(_) | MetricSummary::Trend(_)) | None => 0,
        }
    }

    #[must_use]
    pub fn rate(&self, name: &str) -> Option<&RateSummary> {
        match self.metrics.get(name) {
            Some(MetricSummary::Rate(rate)) => Some(rate),
            Some(MetricSummary::Counter(_) | MetricSummary::Trend(_)) | None => None,
        }
    }

    #[must_use]
    pub fn trend(&self, name: &str) -> Option<&TrendSummary> {
        match self.metrics.get(name) {
            Some(MetricSummary::Trend(trend)) => Some(trend),
            Some(MetricSummary::Counter(_) | MetricSummary::Rate(_)) | None => None,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "summaries are reported as fractional milliseconds"
)]
#[must_use]
pub(crate) fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

#[expect(
    clippy::float_arithmetic,
    reason = "threshold percentiles are given as percentages"
)]
#[must_use]
pub(crate) fn pct_to_quantile(pct: f64) -> f64 {
    (pct / 100.0).clamp(0.0, 1.0)
}
