use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::metrics::{MetricKind, MetricRegistry};
use crate::scenario::CompareOp;

/// Aggregate a threshold reads from a finalized metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    /// Percentile in `(0, 100]`.
    Percentile(f64),
    Avg,
    Min,
    Max,
    Med,
    Rate,
    Count,
}

impl Aggregate {
    #[must_use]
    pub const fn applies_to(self, kind: MetricKind) -> bool {
        match self {
            Aggregate::Percentile(_)
            | Aggregate::Avg
            | Aggregate::Min
            | Aggregate::Max
            | Aggregate::Med => matches!(kind, MetricKind::Trend),
            Aggregate::Rate => matches!(kind, MetricKind::Rate),
            Aggregate::Count => true,
        }
    }
}

/// A parsed `<aggregate><op><value>` bound on one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: String,
    pub expression: String,
    pub aggregate: Aggregate,
    pub op: CompareOp,
    pub value: f64,
}

/// Parses expressions such as `p(95)<500`, `avg<=200` or `rate<0.1`.
///
/// # Errors
///
/// Returns a human-readable reason when the expression is malformed.
pub fn parse_expression(expression: &str) -> Result<(Aggregate, CompareOp, f64), String> {
    let expression = expression.trim();
    let split_at = expression
        .find(['<', '>', '=', '!'])
        .ok_or_else(|| "missing comparison operator".to_owned())?;
    let (aggregate_part, rest) = expression.split_at(split_at);
    let aggregate = parse_aggregate(aggregate_part.trim())?;

    let (op, value_part) =
        CompareOp::split_prefix(rest).ok_or_else(|| format!("invalid operator in '{}'", rest))?;
    if matches!(op, CompareOp::Eq | CompareOp::Ne) {
        return Err(format!(
            "operator '{}' is not supported (use <, <=, > or >=)",
            op.as_str()
        ));
    }
    let value: f64 = value_part
        .parse()
        .map_err(|err| format!("invalid value '{}': {}", value_part, err))?;
    if !value.is_finite() {
        return Err(format!("value '{}' must be finite", value_part));
    }
    Ok((aggregate, op, value))
}

fn parse_aggregate(input: &str) -> Result<Aggregate, String> {
    if let Some(args) = input
        .strip_prefix("p(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let pct: f64 = args
            .trim()
            .parse()
            .map_err(|err| format!("invalid percentile '{}': {}", args, err))?;
        if !(pct > 0.0 && pct <= 100.0) {
            return Err(format!("percentile {} must be in (0, 100]", args.trim()));
        }
        return Ok(Aggregate::Percentile(pct));
    }
    match input {
        "avg" => Ok(Aggregate::Avg),
        "min" => Ok(Aggregate::Min),
        "max" => Ok(Aggregate::Max),
        "med" => Ok(Aggregate::Med),
        "rate" => Ok(Aggregate::Rate),
        "count" => Ok(Aggregate::Count),
        "" => Err("missing aggregate".to_owned()),
        other => Err(format!("unknown aggregate '{}'", other)),
    }
}

/// Resolves the `thresholds` table against the registry.
///
/// # Errors
///
/// Returns an error for unknown metrics, malformed expressions, or
/// aggregates that do not apply to the metric's kind.
pub fn build_thresholds(
    definitions: &BTreeMap<String, Vec<String>>,
    registry: &MetricRegistry,
) -> Result<Vec<Threshold>, ConfigError> {
    let mut thresholds = Vec::new();
    for (metric, expressions) in definitions {
        let (_, kind) =
            registry
                .lookup(metric)
                .ok_or_else(|| ConfigError::ThresholdUnknownMetric {
                    metric: metric.clone(),
                })?;
        for expression in expressions {
            let (aggregate, op, value) =
                parse_expression(expression).map_err(|reason| ConfigError::InvalidThreshold {
                    metric: metric.clone(),
                    expression: expression.clone(),
                    reason,
                })?;
            if !aggregate.applies_to(kind) {
                return Err(ConfigError::ThresholdAggregateMismatch {
                    metric: metric.clone(),
                    expression: expression.clone(),
                    kind: kind.as_str(),
                });
            }
            thresholds.push(Threshold {
                metric: metric.clone(),
                expression: expression.trim().to_owned(),
                aggregate,
                op,
                value,
            });
        }
    }
    Ok(thresholds)
}
