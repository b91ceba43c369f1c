use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricSummary, MetricsSnapshot, names};
use crate::scheduler::SchedulerReport;
use crate::thresholds::{ThresholdVerdict, all_passed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub requests: u64,
    pub failed_requests: u64,
    pub iterations: u64,
    pub vus_max: u64,
    pub abandoned_vus: u64,
}

/// Machine-readable record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// RFC 3339, UTC.
    pub started_at: String,
    pub duration_ms: u64,
    pub cancelled: bool,
    pub passed: bool,
    pub totals: RunTotals,
    pub metrics: BTreeMap<String, MetricSummary>,
    pub thresholds: Vec<ThresholdVerdict>,
}

impl RunSummary {
    #[must_use]
    pub fn build(
        started_at: DateTime<Utc>,
        report: &SchedulerReport,
        snapshot: MetricsSnapshot,
        thresholds: Vec<ThresholdVerdict>,
    ) -> Self {
        let totals = RunTotals {
            requests: snapshot.counter(names::HTTP_REQS),
            failed_requests: snapshot
                .rate(names::HTTP_REQ_FAILED)
                .map_or(0, |rate| rate.nonzero),
            iterations: snapshot.counter(names::ITERATIONS),
            vus_max: report.vus_max,
            abandoned_vus: report.abandoned,
        };
        Self {
            started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            cancelled: report.cancelled,
            passed: all_passed(&thresholds),
            totals,
            metrics: snapshot.metrics,
            thresholds,
        }
    }
}
