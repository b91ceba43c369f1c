use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppResult, ConfigError};
use crate::metrics::{MetricSummary, MetricsSnapshot};

use super::parse::{Aggregate, Threshold};

/// Outcome of one threshold against the finalized metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdVerdict {
    pub metric: String,
    pub expression: String,
    pub actual: f64,
    pub passed: bool,
}

/// Evaluates every threshold. Pure: the same snapshot always yields the
/// same verdicts.
///
/// # Errors
///
/// Returns a configuration error when a threshold's metric is missing from
/// the snapshot, recorded no samples, or does not support the aggregate.
pub fn evaluate(
    thresholds: &[Threshold],
    snapshot: &MetricsSnapshot,
) -> AppResult<Vec<ThresholdVerdict>> {
    let mut verdicts = Vec::with_capacity(thresholds.len());
    for threshold in thresholds {
        let summary =
            snapshot
                .get(&threshold.metric)
                .ok_or_else(|| ConfigError::ThresholdUnknownMetric {
                    metric: threshold.metric.clone(),
                })?;
        if summary.sample_count() == 0 {
            return Err(ConfigError::ThresholdMetricEmpty {
                metric: threshold.metric.clone(),
            }
            .into());
        }
        let actual = aggregate_value(threshold, summary)?;
        let passed = threshold.op.holds(actual, threshold.value);
        debug!(
            "Threshold {} {} -> {} ({})",
            threshold.metric,
            threshold.expression,
            actual,
            if passed { "pass" } else { "fail" }
        );
        verdicts.push(ThresholdVerdict {
            metric: threshold.metric.clone(),
            expression: threshold.expression.clone(),
            actual,
            passed,
        });
    }
    Ok(verdicts)
}

#[must_use]
pub fn all_passed(verdicts: &[ThresholdVerdict]) -> bool {
    verdicts.iter().all(|verdict| verdict.passed)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "counts are compared against f64 bounds"
)]
fn aggregate_value(threshold: &Threshold, summary: &MetricSummary) -> AppResult<f64> {
    let value = match (threshold.aggregate, summary) {
        (Aggregate::Count, MetricSummary::Counter(counter)) => counter.count as f64,
        (Aggregate::Count, MetricSummary::Rate(rate)) => rate.total as f64,
        (Aggregate::Count, MetricSummary::Trend(trend)) => trend.count as f64,
        (Aggregate::Rate, MetricSummary::Rate(rate)) => rate.rate,
        (Aggregate::Percentile(pct), MetricSummary::Trend(trend)) => trend.percentile(pct)?,
        (Aggregate::Avg, MetricSummary::Trend(trend)) => trend.avg,
        (Aggregate::Min, MetricSummary::Trend(trend)) => trend.min,
        (Aggregate::Max, MetricSummary::Trend(trend)) => trend.max,
        (Aggregate::Med, MetricSummary::Trend(trend)) => trend.med,
        (
            Aggregate::Rate
            | Aggregate::Percentile(_)
            | Aggregate::Avg
            | Aggregate::Min
            | Aggregate::Max
            | Aggregate::Med,
            MetricSummary::Counter(_) | MetricSummary::Rate(_) | MetricSummary::Trend(_),
        ) => {
            return Err(ConfigError::ThresholdAggregateMismatch {
                metric: threshold.metric.clone(),
                expression: threshold.expression.clone(),
                kind: summary.kind().as_str(),
            }
            .into());
        }
    };
    Ok(value)
}
