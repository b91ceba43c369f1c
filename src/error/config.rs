use super::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read scenario '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML scenario '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON scenario '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported scenario extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Scenario file must have .toml or .json extension.")]
    MissingExtension,
    #[error("No scenario file given and none of {candidates} exist.")]
    ScenarioFileNotFound { candidates: String },
    #[error("Invalid header in step {index}: {source}")]
    InvalidHeader {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("Scenario must define at least one stage (or both 'vus' and 'duration').")]
    MissingStages,
    #[error("Scenario cannot combine 'stages' with the 'vus'/'duration' shorthand.")]
    StagesConflictWithShorthand,
    #[error("Stage {index} has a negative duration.")]
    StageNegativeDuration { index: usize },
    #[error("Stage {index} has a negative target ({target}).")]
    StageNegativeTarget { index: usize, target: i64 },
    #[error("Stage {index} has an invalid duration: {source}")]
    StageInvalidDuration {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("'{field}' must not be negative (got {value}).")]
    NegativeValue { field: &'static str, value: String },
    #[error("Invalid '{field}' duration: {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Scenario must include at least one step.")]
    ScenarioMissingSteps,
    #[error("Step {index} must define url or path.")]
    StepMissingUrlOrPath { index: usize },
    #[error("Step {index} cannot define both url and path.")]
    StepUrlAndPath { index: usize },
    #[error("Step {index} uses a relative path but the scenario has no base_url.")]
    StepMissingBaseUrl { index: usize },
    #[error("Invalid base_url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid URL '{url}' in step {index}: {source}")]
    InvalidStepUrl {
        index: usize,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Step {index} think time min ({min}ms) is greater than max ({max}ms).")]
    ThinkTimeRange { index: usize, min: u64, max: u64 },
    #[error("Invalid check '{name}' in step {index}: {reason}")]
    InvalidCheck {
        index: usize,
        name: String,
        reason: String,
    },
    #[error("Check '{name}' cannot report to built-in metric '{metric}'.")]
    CheckBoundToBuiltin { name: String, metric: String },
    #[error("Threshold references unknown metric '{metric}'.")]
    ThresholdUnknownMetric { metric: String },
    #[error("Invalid threshold '{expression}' on '{metric}': {reason}")]
    InvalidThreshold {
        metric: String,
        expression: String,
        reason: String,
    },
    #[error("Threshold '{expression}' cannot apply to {kind} metric '{metric}'.")]
    ThresholdAggregateMismatch {
        metric: String,
        expression: String,
        kind: &'static str,
    },
    #[error("Threshold metric '{metric}' received no samples during the run.")]
    ThresholdMetricEmpty { metric: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
