use std::collections::BTreeMap;

use serde::Deserialize;

use crate::args::HttpMethod;

/// Scenario file as written by the operator (TOML or JSON).
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ScenarioConfig {
    pub base_url: Option<String>,
    pub vus: Option<i64>,
    pub duration: Option<DurationValue>,
    pub start_vus: Option<i64>,
    pub stages: Option<Vec<StageConfig>>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
    pub thresholds: Option<BTreeMap<String, Vec<String>>>,
    pub options: Option<OptionsConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct StageConfig {
    pub duration: DurationValue,
    pub target: i64,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct StepConfig {
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub headers: Option<Vec<String>>,
    pub body: Option<String>,
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
    #[serde(alias = "thinkTimeMs")]
    pub think_time_ms: Option<ThinkTimeConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CheckConfig {
    pub name: String,
    pub predicate: String,
    pub metric: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ThinkTimeConfig {
    Fixed(u64),
    Range { min: u64, max: u64 },
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct OptionsConfig {
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub grace_period: Option<DurationValue>,
    pub tick: Option<DurationValue>,
    pub user_agent: Option<String>,
    pub insecure: Option<bool>,
    pub max_redirects: Option<u32>,
    pub summary_path: Option<String>,
}

/// Durations are either whole seconds or strings with a unit (`500ms`, `2m`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(i64),
    Text(String),
}

impl Default for DurationValue {
    fn default() -> Self {
        DurationValue::Seconds(0)
    }
}
