use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::time::Instant;
use tracing::debug;

use crate::error::RequestError;
use crate::metrics::{Builtins, Sample, ShardRecorder};
use crate::scenario::ScenarioStep;

use super::transport::{RequestSpec, Transport};

/// Everything observed about one request; checks run against this.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRecord {
    pub status: Option<u16>,
    pub duration: Duration,
    pub headers: Option<HeaderMap>,
    pub body: Option<Vec<u8>>,
    pub bytes_received: u64,
    pub error: Option<RequestError>,
    pub checks_passed: u32,
    pub checks_failed: u32,
}

impl ExecutionRecord {
    /// Transport error or an HTTP status of 400 and above.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.error.is_some() || self.status.is_none_or(|status| status >= 400)
    }
}

/// Runs a step's request, times it, evaluates its checks and records every
/// sample for it in one batch.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    builtins: Builtins,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, builtins: Builtins) -> Self {
        Self {
            transport,
            builtins,
        }
    }

    /// Exactly one call to the transport; failures become part of the
    /// record, never an error.
    pub async fn execute(&self, step: &ScenarioStep, recorder: &ShardRecorder) -> ExecutionRecord {
        let request = RequestSpec::from_step(step);
        let started = Instant::now();
        let outcome = self.transport.send(&request).await;
        let duration = started.elapsed();

        let mut record = match outcome {
            Ok(response) => ExecutionRecord {
                status: Some(response.status),
                duration,
                headers: Some(response.headers),
                body: response.body,
                bytes_received: response.bytes_received,
                ..ExecutionRecord::default()
            },
            Err(err) => {
                debug!("Step '{}' failed after {:?}: {}", step.name, duration, err);
                ExecutionRecord {
                    duration,
                    error: Some(err),
                    ..ExecutionRecord::default()
                }
            }
        };

        let mut samples = Vec::with_capacity(step.checks.len().saturating_mul(2).saturating_add(4));
        samples.push(Sample::Count(self.builtins.http_reqs, 1));
        samples.push(Sample::Trend(self.builtins.http_req_duration, duration));
        samples.push(Sample::Rate(self.builtins.http_req_failed, record.failed()));
        samples.push(Sample::Count(
            self.builtins.data_received,
            record.bytes_received,
        ));

        for check in &step.checks {
            let passed = check.predicate.evaluate(&record);
            if passed {
                record.checks_passed = record.checks_passed.saturating_add(1);
            } else {
                record.checks_failed = record.checks_failed.saturating_add(1);
                debug!("Check '{}' failed on step '{}'", check.name, step.name);
            }
            samples.push(Sample::Rate(check.metric_id, !passed));
            samples.push(Sample::Rate(self.builtins.checks, passed));
        }

        recorder.record(&samples);
        record
    }
}
