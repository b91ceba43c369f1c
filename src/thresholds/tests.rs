use super::*;
use crate::error::{AppError, ConfigError};
use crate::metrics::{MetricKind, MetricRegistry, MetricsAggregator, MetricsSnapshot, Sample, names};
use crate::scenario::CompareOp;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn registry() -> Result<MetricRegistry, String> {
    let mut registry = MetricRegistry::with_builtins();
    registry
        .register(names::ERRORS, MetricKind::Rate)
        .map_err(|err| err.to_string())?;
    Ok(registry)
}

fn definitions(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(metric, expressions)| {
            (
                (*metric).to_owned(),
                expressions.iter().map(|expr| (*expr).to_owned()).collect(),
            )
        })
        .collect()
}

/// Snapshot with request durations `millis` and `errors` outcomes `failures`.
fn snapshot(millis: &[u64], failures: &[bool]) -> Result<MetricsSnapshot, String> {
    let registry = Arc::new(registry()?);
    let (errors, _) = registry.lookup(names::ERRORS).ok_or("errors missing")?;
    let builtins = *registry.builtins();
    let aggregator =
        Arc::new(MetricsAggregator::new(registry, 1).map_err(|err| err.to_string())?);
    let recorder = aggregator.recorder(0);
    for value in millis {
        recorder.record(&[
            Sample::Count(builtins.http_reqs, 1),
            Sample::Trend(builtins.http_req_duration, Duration::from_millis(*value)),
        ]);
    }
    for failed in failures {
        recorder.record_one(Sample::Rate(errors, *failed));
    }
    aggregator
        .finalize(Duration::from_secs(1))
        .map_err(|err| err.to_string())
}

#[test]
fn parse_supported_expressions() -> Result<(), String> {
    let cases = [
        ("p(95)<500", Aggregate::Percentile(95.0), CompareOp::Lt),
        ("p(99.9) <= 800", Aggregate::Percentile(99.9), CompareOp::Le),
        ("avg<200", Aggregate::Avg, CompareOp::Lt),
        ("med>=1", Aggregate::Med, CompareOp::Ge),
        ("min > 0", Aggregate::Min, CompareOp::Gt),
        ("max<1000", Aggregate::Max, CompareOp::Lt),
        ("rate<0.1", Aggregate::Rate, CompareOp::Lt),
        ("count>=10", Aggregate::Count, CompareOp::Ge),
    ];
    for (input, aggregate, op) in cases {
        let (parsed_aggregate, parsed_op, _) = parse_expression(input)?;
        if parsed_aggregate != aggregate || parsed_op != op {
            return Err(format!(
                "{} parsed as {:?} {:?}",
                input, parsed_aggregate, parsed_op
            ));
        }
    }
    Ok(())
}

#[test]
fn parse_rejects_malformed_expressions() -> Result<(), String> {
    for input in [
        "p95<500",
        "p(0)<5",
        "p(101)<5",
        "avg",
        "avg<",
        "avg<abc",
        "avg==5",
        "median<5",
        "<5",
    ] {
        if parse_expression(input).is_ok() {
            return Err(format!("Expected '{}' to be rejected", input));
        }
    }
    Ok(())
}

#[test]
fn build_rejects_unknown_metric_and_kind_mismatch() -> Result<(), String> {
    let registry = registry()?;

    match build_thresholds(&definitions(&[("latency", &["p(95)<500"])]), &registry) {
        Err(ConfigError::ThresholdUnknownMetric { metric }) if metric == "latency" => {}
        other => return Err(format!("Expected unknown metric, got {:?}", other)),
    }
    match build_thresholds(&definitions(&[(names::ERRORS, &["p(95)<500"])]), &registry) {
        Err(ConfigError::ThresholdAggregateMismatch { kind: "rate", .. }) => {}
        other => return Err(format!("Expected kind mismatch, got {:?}", other)),
    }
    match build_thresholds(&definitions(&[(names::HTTP_REQS, &["rate<5"])]), &registry) {
        Err(ConfigError::ThresholdAggregateMismatch { kind: "counter", .. }) => {}
        other => return Err(format!("Expected kind mismatch, got {:?}", other)),
    }
    match build_thresholds(&definitions(&[(names::ERRORS, &["rate<<0.1"])]), &registry) {
        Err(ConfigError::InvalidThreshold { .. }) => {}
        other => return Err(format!("Expected invalid threshold, got {:?}", other)),
    }

    let built = build_thresholds(
        &definitions(&[
            (names::HTTP_REQ_DURATION, &["p(95)<500", "avg<200"]),
            (names::ERRORS, &["rate<0.1"]),
            (names::HTTP_REQS, &["count>0"]),
        ]),
        &registry,
    )
    .map_err(|err| err.to_string())?;
    if built.len() != 4 {
        return Err(format!("Expected four thresholds, got {}", built.len()));
    }
    Ok(())
}

#[test]
fn evaluate_reports_pass_and_fail() -> Result<(), String> {
    let registry = registry()?;
    let thresholds = build_thresholds(
        &definitions(&[
            (names::HTTP_REQ_DURATION, &["p(95)<500", "max<100"]),
            (names::ERRORS, &["rate<0.1"]),
        ]),
        &registry,
    )
    .map_err(|err| err.to_string())?;
    let snapshot = snapshot(&[50, 60, 250], &[false, false, false, true])?;

    let verdicts = evaluate(&thresholds, &snapshot).map_err(|err| err.to_string())?;
    let outcome: Vec<(&str, bool)> = verdicts
        .iter()
        .map(|verdict| (verdict.expression.as_str(), verdict.passed))
        .collect();
    if outcome != vec![("rate<0.1", false), ("p(95)<500", true), ("max<100", false)] {
        return Err(format!("Unexpected verdicts: {:?}", outcome));
    }
    if all_passed(&verdicts) {
        return Err("Expected overall failure".to_owned());
    }
    Ok(())
}

#[test]
fn evaluate_is_idempotent() -> Result<(), String> {
    let registry = registry()?;
    let thresholds = build_thresholds(
        &definitions(&[(names::HTTP_REQ_DURATION, &["p(95)<500", "med<100"])]),
        &registry,
    )
    .map_err(|err| err.to_string())?;
    let snapshot = snapshot(&[10, 20, 30, 40], &[])?;

    let first = evaluate(&thresholds, &snapshot).map_err(|err| err.to_string())?;
    let second = evaluate(&thresholds, &snapshot).map_err(|err| err.to_string())?;
    if first != second {
        return Err("Repeated evaluation changed the verdicts".to_owned());
    }
    if !all_passed(&first) {
        return Err(format!("Expected passing verdicts: {:?}", first));
    }
    Ok(())
}

#[test]
fn empty_metric_is_a_config_error() -> Result<(), String> {
    let registry = registry()?;
    let thresholds = build_thresholds(&definitions(&[(names::ERRORS, &["rate<0.1"])]), &registry)
        .map_err(|err| err.to_string())?;
    let snapshot = snapshot(&[10], &[])?;

    match evaluate(&thresholds, &snapshot) {
        Err(AppError::Config(ConfigError::ThresholdMetricEmpty { metric })) if metric == "errors" => {
            Ok(())
        }
        other => Err(format!("Expected empty-metric error, got {:?}", other)),
    }
}

#[test]
fn zero_valued_counter_samples_still_count_as_recorded() -> Result<(), String> {
    let registry = Arc::new(registry()?);
    let thresholds = build_thresholds(
        &definitions(&[(names::DATA_RECEIVED, &["count<1"])]),
        &registry,
    )
    .map_err(|err| err.to_string())?;
    let data_received = registry.builtins().data_received;
    let aggregator =
        Arc::new(MetricsAggregator::new(registry, 2).map_err(|err| err.to_string())?);
    for worker in 0..5 {
        aggregator
            .recorder(worker)
            .record_one(Sample::Count(data_received, 0));
    }
    let snapshot = aggregator
        .finalize(Duration::from_secs(1))
        .map_err(|err| err.to_string())?;

    let verdicts = evaluate(&thresholds, &snapshot).map_err(|err| err.to_string())?;
    match verdicts.as_slice() {
        [verdict] if verdict.passed => Ok(()),
        other => Err(format!("Expected a passing count<1 verdict, got {:?}", other)),
    }
}

#[test]
fn unsupported_aggregate_is_a_config_error() -> Result<(), String> {
    let threshold = Threshold {
        metric: names::HTTP_REQ_DURATION.to_owned(),
        expression: "rate<0.1".to_owned(),
        aggregate: Aggregate::Rate,
        op: CompareOp::Lt,
        value: 0.1,
    };
    let snapshot = snapshot(&[10, 20], &[])?;

    match evaluate(&[threshold], &snapshot) {
        Err(AppError::Config(ConfigError::ThresholdAggregateMismatch { kind: "trend", metric, .. }))
            if metric == names::HTTP_REQ_DURATION =>
        {
            Ok(())
        }
        other => Err(format!("Expected aggregate mismatch, got {:?}", other)),
    }
}
