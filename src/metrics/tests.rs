use super::*;
use crate::error::{AppError, AppResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

#[expect(clippy::float_arithmetic, reason = "tolerance comparison on f64 summaries")]
fn approx_eq(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() < 1e-9
}

fn registry_with_errors() -> AppResult<(Arc<MetricRegistry>, MetricId)> {
    let mut registry = MetricRegistry::with_builtins();
    let errors = registry.register(names::ERRORS, MetricKind::Rate)?;
    Ok((Arc::new(registry), errors))
}

#[test]
fn histogram_roundtrip_preserves_percentiles() -> AppResult<()> {
    let mut hist = LatencyHistogram::new()?;
    for micros in [1_000_u64, 2_000, 3_000, 4_000, 100_000] {
        hist.record(micros)?;
    }
    let encoded = hist.encode_base64()?;
    let decoded = LatencyHistogram::decode_base64(&encoded)?;
    if decoded.count() != 5 {
        return Err(AppError::metrics(format!(
            "Unexpected count: {}",
            decoded.count()
        )));
    }
    if decoded.value_at_quantile(0.5) != hist.value_at_quantile(0.5) {
        return Err(AppError::metrics("Median changed after decode"));
    }
    Ok(())
}

#[test]
fn empty_histogram_reports_zero() -> AppResult<()> {
    let hist = LatencyHistogram::new()?;
    if hist.value_at_quantile(0.95) != 0 {
        return Err(AppError::metrics("Expected zero for empty histogram"));
    }
    Ok(())
}

#[test]
fn registry_rejects_kind_conflict() -> AppResult<()> {
    let mut registry = MetricRegistry::with_builtins();
    if registry.register(names::HTTP_REQS, MetricKind::Rate).is_ok() {
        return Err(AppError::metrics("Expected kind conflict on http_reqs"));
    }
    let first = registry.register("login_errors", MetricKind::Rate)?;
    let second = registry.register("login_errors", MetricKind::Rate)?;
    if first != second {
        return Err(AppError::metrics("Expected the same id on re-register"));
    }
    if !MetricRegistry::is_builtin(names::CHECKS) || MetricRegistry::is_builtin(names::ERRORS) {
        return Err(AppError::metrics("Unexpected builtin classification"));
    }
    Ok(())
}

#[test]
fn finalize_summarizes_each_kind() -> AppResult<()> {
    let (registry, errors) = registry_with_errors()?;
    let builtins = *registry.builtins();
    let aggregator = Arc::new(MetricsAggregator::new(registry, 2)?);

    let first = aggregator.recorder(0);
    let second = aggregator.recorder(1);
    first.record(&[
        Sample::Count(builtins.http_reqs, 1),
        Sample::Trend(builtins.http_req_duration, Duration::from_millis(10)),
        Sample::Rate(errors, false),
    ]);
    second.record(&[
        Sample::Count(builtins.http_reqs, 1),
        Sample::Trend(builtins.http_req_duration, Duration::from_millis(30)),
        Sample::Rate(errors, true),
    ]);

    let snapshot = aggregator.finalize(Duration::from_secs(2))?;
    if snapshot.counter(names::HTTP_REQS) != 2 {
        return Err(AppError::metrics("Expected two requests"));
    }
    match snapshot.get(names::HTTP_REQS) {
        Some(MetricSummary::Counter(counter)) if approx_eq(counter.rate_per_sec, 1.0) => {}
        other => {
            return Err(AppError::metrics(format!(
                "Unexpected counter summary: {:?}",
                other
            )));
        }
    }
    let rate = snapshot
        .rate(names::ERRORS)
        .ok_or_else(|| AppError::metrics("Missing errors rate"))?;
    if rate.nonzero != 1 || rate.total != 2 || !approx_eq(rate.rate, 0.5) {
        return Err(AppError::metrics(format!("Unexpected rate: {:?}", rate)));
    }
    let trend = snapshot
        .trend(names::HTTP_REQ_DURATION)
        .ok_or_else(|| AppError::metrics("Missing duration trend"))?;
    if trend.count != 2 || !approx_eq(trend.avg, 20.0) {
        return Err(AppError::metrics(format!("Unexpected trend: {:?}", trend)));
    }
    if !approx_eq(trend.min, 10.0) || !approx_eq(trend.max, 30.0) {
        return Err(AppError::metrics(format!(
            "Unexpected min/max: {} / {}",
            trend.min, trend.max
        )));
    }
    let p95 = trend.percentile(95.0)?;
    if !approx_eq(p95, trend.p95) {
        return Err(AppError::metrics(format!(
            "Recomputed p95 {} differs from {}",
            p95, trend.p95
        )));
    }
    Ok(())
}

#[test]
fn finalize_is_repeatable() -> AppResult<()> {
    let (registry, errors) = registry_with_errors()?;
    let aggregator = Arc::new(MetricsAggregator::new(registry, 1)?);
    aggregator.recorder(7).record_one(Sample::Rate(errors, true));

    let first = aggregator.finalize(Duration::from_secs(1))?;
    let second = aggregator.finalize(Duration::from_secs(1))?;
    if first != second {
        return Err(AppError::metrics("Expected identical snapshots"));
    }
    Ok(())
}

#[test]
fn empty_metrics_have_zero_samples() -> AppResult<()> {
    let (registry, _) = registry_with_errors()?;
    let aggregator = MetricsAggregator::new(registry, 0)?;
    if aggregator.shard_count() != 1 {
        return Err(AppError::metrics("Expected at least one shard"));
    }
    let snapshot = aggregator.finalize(Duration::ZERO)?;
    for (name, summary) in &snapshot.metrics {
        if summary.sample_count() != 0 {
            return Err(AppError::metrics(format!("{} should be empty", name)));
        }
    }
    Ok(())
}

#[test]
fn concurrent_recording_loses_no_samples() -> AppResult<()> {
    const WORKERS: u64 = 32;
    const PER_WORKER: u64 = 500;

    run_async_test(async {
        let (registry, errors) = registry_with_errors()?;
        let builtins = *registry.builtins();
        let aggregator = Arc::new(MetricsAggregator::new(registry, 4)?);

        let mut handles = Vec::new();
        for worker in 0..WORKERS {
            let recorder = aggregator.recorder(worker);
            handles.push(tokio::spawn(async move {
                for round in 0..PER_WORKER {
                    recorder.record(&[
                        Sample::Count(builtins.http_reqs, 1),
                        Sample::Rate(errors, round & 1 == 0),
                        Sample::Trend(builtins.http_req_duration, Duration::from_micros(round)),
                    ]);
                    if round & 63 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await?;
        }

        let snapshot = aggregator.finalize(Duration::from_secs(1))?;
        let expected = WORKERS.saturating_mul(PER_WORKER);
        if snapshot.counter(names::HTTP_REQS) != expected {
            return Err(AppError::metrics(format!(
                "Lost counter samples: {}",
                snapshot.counter(names::HTTP_REQS)
            )));
        }
        let rate_total = snapshot.rate(names::ERRORS).map_or(0, |rate| rate.total);
        let trend_count = snapshot
            .trend(names::HTTP_REQ_DURATION)
            .map_or(0, |trend| trend.count);
        if rate_total != expected || trend_count != expected {
            return Err(AppError::metrics(format!(
                "Lost samples: rate {} trend {}",
                rate_total, trend_count
            )));
        }
        Ok(())
    })
}
