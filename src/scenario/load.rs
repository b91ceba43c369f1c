use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use crate::args::parse_header;
use crate::config::types::{
    CheckConfig, DurationValue, OptionsConfig, ScenarioConfig, StepConfig, ThinkTimeConfig,
};
use crate::config::{DurationIssue, resolve_duration};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::metrics::{MetricKind, MetricRegistry, names};
use crate::scheduler::RampPlan;
use crate::thresholds::build_thresholds;

use super::check::{Check, Predicate};
use super::types::{RunOptions, RunOverrides, Scenario, ScenarioStep, Stage, ThinkTime};

/// Validates a scenario definition and resolves it into an immutable
/// [`Scenario`]. CLI overrides win over file options.
///
/// # Errors
///
/// Returns a configuration error for any invalid stage, step, check,
/// threshold, or option.
pub fn load(config: &ScenarioConfig, overrides: &RunOverrides) -> AppResult<Scenario> {
    let plan = resolve_plan(config)?;

    if config.steps.is_empty() {
        return Err(AppError::config(ConfigError::ScenarioMissingSteps));
    }
    let base_url = resolve_base_url(
        overrides
            .base_url
            .as_deref()
            .or(config.base_url.as_deref()),
    )?;

    let mut registry = MetricRegistry::with_builtins();
    registry.register(names::ERRORS, MetricKind::Rate)?;

    let mut steps = Vec::with_capacity(config.steps.len());
    for (index, step) in config.steps.iter().enumerate() {
        steps.push(resolve_step(index, step, base_url.as_ref(), &mut registry)?);
    }

    let thresholds = match config.thresholds.as_ref() {
        Some(definitions) => build_thresholds(definitions, &registry)?,
        None => Vec::new(),
    };
    let options = resolve_options(config.options.as_ref(), overrides)?;

    debug!(
        "Loaded scenario: {} stage(s), {} step(s), {} threshold(s), {} metric(s)",
        plan.stages().len(),
        steps.len(),
        thresholds.len(),
        registry.len()
    );

    Ok(Scenario {
        plan,
        steps,
        thresholds,
        options,
        registry: Arc::new(registry),
    })
}

fn resolve_plan(config: &ScenarioConfig) -> AppResult<RampPlan> {
    let shorthand = config.vus.is_some() || config.duration.is_some();
    if let Some(stages) = config.stages.as_ref() {
        if shorthand {
            return Err(AppError::config(ConfigError::StagesConflictWithShorthand));
        }
        if stages.is_empty() {
            return Err(AppError::config(ConfigError::MissingStages));
        }
        let start_vus = match config.start_vus {
            Some(value) => non_negative("start_vus", value)?,
            None => 0,
        };
        let mut resolved = Vec::with_capacity(stages.len());
        for (index, stage) in stages.iter().enumerate() {
            let duration = resolve_duration(&stage.duration, true).map_err(|issue| match issue {
                DurationIssue::Negative => ConfigError::StageNegativeDuration { index },
                DurationIssue::Invalid(source) => {
                    ConfigError::StageInvalidDuration { index, source }
                }
            })?;
            let target =
                u64::try_from(stage.target).map_err(|_err| ConfigError::StageNegativeTarget {
                    index,
                    target: stage.target,
                })?;
            resolved.push(Stage { duration, target });
        }
        return Ok(RampPlan::new(start_vus, resolved));
    }

    match (config.vus, config.duration.as_ref()) {
        (Some(vus), Some(duration)) => {
            let vus = non_negative("vus", vus)?;
            let duration = resolve_field_duration("duration", duration, false)?;
            Ok(RampPlan::new(
                vus,
                vec![Stage {
                    duration,
                    target: vus,
                }],
            ))
        }
        (Some(_), None) | (None, Some(_)) | (None, None) => {
            Err(AppError::config(ConfigError::MissingStages))
        }
    }
}

fn resolve_base_url(base_url: Option<&str>) -> AppResult<Option<Url>> {
    let Some(raw) = base_url else {
        return Ok(None);
    };
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    Ok(Some(url))
}

fn resolve_step(
    index: usize,
    step: &StepConfig,
    base_url: Option<&Url>,
    registry: &mut MetricRegistry,
) -> AppResult<ScenarioStep> {
    let url = match (step.url.as_deref(), step.path.as_deref()) {
        (Some(_), Some(_)) => return Err(AppError::config(ConfigError::StepUrlAndPath { index })),
        (None, None) => {
            return Err(AppError::config(ConfigError::StepMissingUrlOrPath { index }));
        }
        (Some(raw), None) => Url::parse(raw).map_err(|err| ConfigError::InvalidStepUrl {
            index,
            url: raw.to_owned(),
            source: err,
        })?,
        (None, Some(path)) => {
            let base = base_url.ok_or(ConfigError::StepMissingBaseUrl { index })?;
            base.join(path).map_err(|err| ConfigError::InvalidStepUrl {
                index,
                url: path.to_owned(),
                source: err,
            })?
        }
    };

    let mut headers = Vec::new();
    for raw in step.headers.iter().flatten() {
        let (name, value) =
            parse_header(raw).map_err(|source| ConfigError::InvalidHeader { index, source })?;
        if HeaderName::from_bytes(name.as_bytes()).is_err()
            || HeaderValue::from_str(&value).is_err()
        {
            return Err(AppError::config(ConfigError::InvalidHeader {
                index,
                source: ValidationError::InvalidHeaderName { value: raw.clone() },
            }));
        }
        headers.push((name, value));
    }

    let mut checks = Vec::with_capacity(step.checks.len());
    for check in &step.checks {
        checks.push(resolve_check(index, check, registry)?);
    }

    let think_time = match step.think_time_ms.as_ref() {
        Some(ThinkTimeConfig::Fixed(ms)) => Some(ThinkTime::Fixed(Duration::from_millis(*ms))),
        Some(ThinkTimeConfig::Range { min, max }) => {
            if min > max {
                return Err(AppError::config(ConfigError::ThinkTimeRange {
                    index,
                    min: *min,
                    max: *max,
                }));
            }
            Some(ThinkTime::Uniform {
                min: Duration::from_millis(*min),
                max: Duration::from_millis(*max),
            })
        }
        None => None,
    };

    let name = step
        .name
        .clone()
        .unwrap_or_else(|| format!("{} {}", step.method.unwrap_or_default().as_str(), url.path()));

    Ok(ScenarioStep {
        name,
        method: step.method.unwrap_or_default(),
        url,
        headers,
        body: step.body.clone(),
        checks,
        think_time,
    })
}

fn resolve_check(
    index: usize,
    check: &CheckConfig,
    registry: &mut MetricRegistry,
) -> AppResult<Check> {
    let predicate = Predicate::parse(&check.predicate).map_err(|reason| {
        ConfigError::InvalidCheck {
            index,
            name: check.name.clone(),
            reason,
        }
    })?;
    let metric = check
        .metric
        .clone()
        .unwrap_or_else(|| names::ERRORS.to_owned());
    if MetricRegistry::is_builtin(&metric) {
        return Err(AppError::config(ConfigError::CheckBoundToBuiltin {
            name: check.name.clone(),
            metric,
        }));
    }
    let metric_id = registry.register(&metric, MetricKind::Rate)?;
    Ok(Check {
        name: check.name.clone(),
        predicate,
        metric,
        metric_id,
    })
}

fn resolve_options(
    options: Option<&OptionsConfig>,
    overrides: &RunOverrides,
) -> AppResult<RunOptions> {
    let mut resolved = RunOptions::default();
    if let Some(options) = options {
        if let Some(value) = options.timeout.as_ref() {
            resolved.timeout = resolve_field_duration("timeout", value, false)?;
        }
        if let Some(value) = options.connect_timeout.as_ref() {
            resolved.connect_timeout = resolve_field_duration("connect_timeout", value, false)?;
        }
        if let Some(value) = options.grace_period.as_ref() {
            resolved.grace_period = resolve_field_duration("grace_period", value, true)?;
        }
        if let Some(value) = options.tick.as_ref() {
            resolved.tick = resolve_field_duration("tick", value, false)?;
        }
        if let Some(user_agent) = options.user_agent.as_ref() {
            resolved.user_agent.clone_from(user_agent);
        }
        if let Some(insecure) = options.insecure {
            resolved.insecure = insecure;
        }
        if let Some(max_redirects) = options.max_redirects {
            resolved.max_redirects = max_redirects;
        }
        if let Some(path) = options.summary_path.as_ref() {
            resolved.summary_path = Some(PathBuf::from(path));
        }
    }

    if let Some(timeout) = overrides.timeout {
        resolved.timeout = timeout;
    }
    if let Some(grace_period) = overrides.grace_period {
        resolved.grace_period = grace_period;
    }
    if let Some(path) = overrides.summary_path.as_ref() {
        resolved.summary_path = Some(path.clone());
    }
    if overrides.no_summary {
        resolved.summary_path = None;
    }
    Ok(resolved)
}

fn resolve_field_duration(
    field: &'static str,
    value: &DurationValue,
    allow_zero: bool,
) -> AppResult<Duration> {
    resolve_duration(value, allow_zero).map_err(|issue| {
        AppError::config(match issue {
            DurationIssue::Negative => ConfigError::NegativeValue {
                field,
                value: match value {
                    DurationValue::Seconds(secs) => secs.to_string(),
                    DurationValue::Text(text) => text.clone(),
                },
            },
            DurationIssue::Invalid(source) => ConfigError::InvalidDuration { field, source },
        })
    })
}

fn non_negative(field: &'static str, value: i64) -> AppResult<u64> {
    u64::try_from(value).map_err(|_err| {
        AppError::config(ConfigError::NegativeValue {
            field,
            value: value.to_string(),
        })
    })
}
