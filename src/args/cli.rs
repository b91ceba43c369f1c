use clap::Parser;
use std::time::Duration;

use super::parsers::parse_duration_arg;

#[derive(Debug, Parser, Clone, Default)]
#[clap(
    version,
    about = "Async HTTP load generator: ramps virtual users through scenario stages, checks every response, and exits non-zero when thresholds fail."
)]
pub struct RunArgs {
    /// Scenario file (.toml or .json). Defaults to ./surge.toml or ./surge.json
    #[arg(short = 'c', long = "config", env = "SURGE_CONFIG")]
    pub config: Option<String>,

    /// Override the scenario base_url
    #[arg(long = "base-url", env = "SURGE_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// How long to wait for in-flight steps when the run ends or is aborted (supports ms/s/m/h)
    #[arg(long = "grace-period", value_parser = parse_duration_arg)]
    pub grace_period: Option<Duration>,

    /// Where to write the JSON run summary
    #[arg(long = "summary-export", env = "SURGE_SUMMARY_EXPORT")]
    pub summary_export: Option<String>,

    /// Do not write a summary file
    #[arg(long = "no-summary-export", conflicts_with = "summary_export")]
    pub no_summary_export: bool,

    /// Do not print the summary table
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Enable debug logging (set SURGE_LOG or RUST_LOG for finer control)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
