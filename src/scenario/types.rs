use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::Url;

use crate::args::{HttpMethod, RunArgs};
use crate::metrics::MetricRegistry;
use crate::scheduler::RampPlan;
use crate::thresholds::Threshold;

use super::check::Check;

pub const DEFAULT_USER_AGENT: &str = concat!("surge/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;
pub const DEFAULT_SUMMARY_PATH: &str = "summary.json";

/// One ramp segment: move to `target` VUs over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkTime {
    Fixed(Duration),
    Uniform { min: Duration, max: Duration },
}

impl ThinkTime {
    /// Pause to apply after a step; uniform ranges are sampled per call.
    #[must_use]
    pub fn sample(&self) -> Duration {
        match *self {
            ThinkTime::Fixed(pause) => pause,
            ThinkTime::Uniform { min, max } => {
                let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
                let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                if max_ms <= min_ms {
                    return min;
                }
                Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioStep {
    pub name: String,
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub checks: Vec<Check>,
    pub think_time: Option<ThinkTime>,
}

impl ScenarioStep {
    /// Whether any check needs the response body kept in memory.
    #[must_use]
    pub fn needs_body(&self) -> bool {
        self.checks.iter().any(|check| check.predicate.needs_body())
    }
}

/// Runtime knobs resolved from the scenario file and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub grace_period: Duration,
    pub tick: Duration,
    pub user_agent: String,
    pub insecure: bool,
    pub max_redirects: u32,
    /// `None` when the summary file is disabled.
    pub summary_path: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            tick: DEFAULT_TICK,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            insecure: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            summary_path: Some(PathBuf::from(DEFAULT_SUMMARY_PATH)),
        }
    }
}

/// CLI values that take precedence over the scenario file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub grace_period: Option<Duration>,
    pub summary_path: Option<PathBuf>,
    pub no_summary: bool,
}

impl From<&RunArgs> for RunOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            base_url: args.base_url.clone(),
            timeout: args.timeout,
            grace_period: args.grace_period,
            summary_path: args.summary_export.as_ref().map(PathBuf::from),
            no_summary: args.no_summary_export,
        }
    }
}

/// Validated, immutable scenario shared by every virtual user.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub plan: RampPlan,
    pub steps: Vec<ScenarioStep>,
    pub thresholds: Vec<Threshold>,
    pub options: RunOptions,
    pub registry: Arc<MetricRegistry>,
}
