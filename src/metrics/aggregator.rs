use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::MetricsError;

use super::registry::MetricRegistry;
use super::types::{
    CounterSummary, MetricKind, MetricSummary, MetricsSnapshot, RateSummary, Sample,
    TrendSummary, micros_to_ms,
};
use super::LatencyHistogram;

/// Shards per available CPU. Virtual users map onto shards by id, so writers
/// only contend with the few users that share their shard.
const SHARDS_PER_CPU: usize = 4;

#[derive(Debug, Clone)]
struct TrendState {
    count: u64,
    sum_us: u128,
    min_us: u64,
    max_us: u64,
    histogram: LatencyHistogram,
}

impl TrendState {
    fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            count: 0,
            sum_us: 0,
            min_us: u64::MAX,
            max_us: 0,
            histogram: LatencyHistogram::new()?,
        })
    }

    fn record(&mut self, value: Duration) {
        let micros = u64::try_from(value.as_micros()).unwrap_or(u64::MAX);
        self.count = self.count.saturating_add(1);
        self.sum_us = self.sum_us.saturating_add(u128::from(micros));
        self.min_us = self.min_us.min(micros);
        self.max_us = self.max_us.max(micros);
        if let Err(err) = self.histogram.record(micros) {
            debug!("Dropped trend sample from histogram: {}", err);
        }
    }

    fn merge(&mut self, other: &TrendState) -> Result<(), MetricsError> {
        self.count = self.count.saturating_add(other.count);
        self.sum_us = self.sum_us.saturating_add(other.sum_us);
        self.min_us = self.min_us.min(other.min_us);
        self.max_us = self.max_us.max(other.max_us);
        self.histogram.merge(&other.histogram)
    }

    fn summarize(&self) -> Result<TrendSummary, MetricsError> {
        let (avg, min, max) = if self.count == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let avg_us = self
                .sum_us
                .checked_div(u128::from(self.count))
                .unwrap_or(0);
            (
                micros_to_ms(u64::try_from(avg_us).unwrap_or(u64::MAX)),
                micros_to_ms(self.min_us),
                micros_to_ms(self.max_us),
            )
        };
        Ok(TrendSummary {
            count: self.count,
            avg,
            min,
            med: micros_to_ms(self.histogram.value_at_quantile(0.5)),
            max,
            p90: micros_to_ms(self.histogram.value_at_quantile(0.9)),
            p95: micros_to_ms(self.histogram.value_at_quantile(0.95)),
            p99: micros_to_ms(self.histogram.value_at_quantile(0.99)),
            histogram: self.histogram.encode_base64()?,
        })
    }
}

#[derive(Debug, Clone)]
enum MetricState {
    Counter { value: u64, samples: u64 },
    Rate { nonzero: u64, total: u64 },
    Trend(Box<TrendState>),
}

impl MetricState {
    fn new(kind: MetricKind) -> Result<Self, MetricsError> {
        Ok(match kind {
            MetricKind::Counter => MetricState::Counter {
                value: 0,
                samples: 0,
            },
            MetricKind::Rate => MetricState::Rate {
                nonzero: 0,
                total: 0,
            },
            MetricKind::Trend => MetricState::Trend(Box::new(TrendState::new()?)),
        })
    }

    fn merge(&mut self, other: &MetricState) -> Result<(), MetricsError> {
        match (self, other) {
            (
                MetricState::Counter { value, samples },
                MetricState::Counter {
                    value: other_value,
                    samples: other_samples,
                },
            ) => {
                *value = value.saturating_add(*other_value);
                *samples = samples.saturating_add(*other_samples);
            }
            (
                MetricState::Rate { nonzero, total },
                MetricState::Rate {
                    nonzero: other_nonzero,
                    total: other_total,
                },
            ) => {
                *nonzero = nonzero.saturating_add(*other_nonzero);
                *total = total.saturating_add(*other_total);
            }
            (MetricState::Trend(trend), MetricState::Trend(other)) => trend.merge(other)?,
            (
                MetricState::Counter { .. } | MetricState::Rate { .. } | MetricState::Trend(_),
                MetricState::Counter { .. } | MetricState::Rate { .. } | MetricState::Trend(_),
            ) => {}
        }
        Ok(())
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "rates and per-second counts are fractional"
    )]
    fn summarize(&self, elapsed: Duration) -> Result<MetricSummary, MetricsError> {
        Ok(match self {
            MetricState::Counter { value, samples } => {
                let secs = elapsed.as_secs_f64();
                let rate_per_sec = if secs > 0.0 { *value as f64 / secs } else { 0.0 };
                MetricSummary::Counter(CounterSummary {
                    count: *value,
                    samples: *samples,
                    rate_per_sec,
                })
            }
            MetricState::Rate { nonzero, total } => {
                let rate = if *total == 0 {
                    0.0
                } else {
                    *nonzero as f64 / *total as f64
                };
                MetricSummary::Rate(RateSummary {
                    rate,
                    nonzero: *nonzero,
                    total: *total,
                })
            }
            MetricState::Trend(trend) => MetricSummary::Trend(trend.summarize()?),
        })
    }
}

#[derive(Debug)]
struct Shard {
    states: Vec<MetricState>,
}

impl Shard {
    fn new(registry: &MetricRegistry) -> Result<Self, MetricsError> {
        let mut states = Vec::with_capacity(registry.len());
        for entry in registry.entries() {
            states.push(MetricState::new(entry.kind)?);
        }
        Ok(Self { states })
    }

    fn apply(&mut self, sample: Sample) {
        match sample {
            Sample::Count(id, amount) => {
                if let Some(MetricState::Counter { value, samples }) =
                    self.states.get_mut(id.index())
                {
                    *value = value.saturating_add(amount);
                    *samples = samples.saturating_add(1);
                }
            }
            Sample::Rate(id, hit) => {
                if let Some(MetricState::Rate { nonzero, total }) = self.states.get_mut(id.index())
                {
                    *total = total.saturating_add(1);
                    if hit {
                        *nonzero = nonzero.saturating_add(1);
                    }
                }
            }
            Sample::Trend(id, value) => {
                if let Some(MetricState::Trend(trend)) = self.states.get_mut(id.index()) {
                    trend.record(value);
                }
            }
        }
    }
}

/// Concurrent metric accumulator shared by every virtual user.
#[derive(Debug)]
pub struct MetricsAggregator {
    registry: Arc<MetricRegistry>,
    shards: Vec<Mutex<Shard>>,
}

impl MetricsAggregator {
    /// Creates an aggregator with `shard_count` shards (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if a trend histogram cannot be allocated.
    pub fn new(registry: Arc<MetricRegistry>, shard_count: usize) -> Result<Self, MetricsError> {
        let shard_count = shard_count.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(Mutex::new(Shard::new(&registry)?));
        }
        Ok(Self { registry, shards })
    }

    /// Creates an aggregator sized to the machine's parallelism.
    ///
    /// # Errors
    ///
    /// Returns an error if a trend histogram cannot be allocated.
    pub fn with_default_shards(registry: Arc<MetricRegistry>) -> Result<Self, MetricsError> {
        let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self::new(registry, cpus.saturating_mul(SHARDS_PER_CPU))
    }

    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Recorder bound to the shard owned by `worker_id`.
    #[must_use]
    pub fn recorder(self: &Arc<Self>, worker_id: u64) -> ShardRecorder {
        let count = u64::try_from(self.shards.len()).unwrap_or(1).max(1);
        let shard = usize::try_from(worker_id.checked_rem(count).unwrap_or(0)).unwrap_or(0);
        ShardRecorder {
            aggregator: Arc::clone(self),
            shard,
        }
    }

    fn record(&self, shard: usize, samples: &[Sample]) {
        let Some(slot) = self.shards.get(shard) else {
            return;
        };
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        for sample in samples {
            guard.apply(*sample);
        }
    }

    /// Merges every shard into a snapshot. Safe to call repeatedly; shards
    /// are read, not drained.
    ///
    /// # Errors
    ///
    /// Returns an error if histograms cannot be merged or encoded.
    pub fn finalize(&self, elapsed: Duration) -> Result<MetricsSnapshot, MetricsError> {
        let mut merged = Shard::new(&self.registry)?;
        for slot in &self.shards {
            let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            for (total, part) in merged.states.iter_mut().zip(guard.states.iter()) {
                total.merge(part)?;
            }
        }

        let mut metrics = BTreeMap::new();
        for (entry, state) in self.registry.entries().zip(merged.states.iter()) {
            metrics.insert(entry.name.clone(), state.summarize(elapsed)?);
        }
        Ok(MetricsSnapshot { elapsed, metrics })
    }
}

/// Per-worker handle; cheap to clone, locks only its own shard.
#[derive(Debug, Clone)]
pub struct ShardRecorder {
    aggregator: Arc<MetricsAggregator>,
    shard: usize,
}

impl ShardRecorder {
    pub fn record(&self, samples: &[Sample]) {
        self.aggregator.record(self.shard, samples);
    }

    pub fn record_one(&self, sample: Sample) {
        self.aggregator.record(self.shard, &[sample]);
    }
}
