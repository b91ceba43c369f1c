//! Scenario file loading and duration parsing.
mod loader;
mod parse;
pub mod types;


pub use loader::load_config;

pub(crate) use loader::{DEFAULT_SCENARIO_FILES, load_config_file};
pub(crate) use parse::{DurationIssue, parse_duration_value, resolve_duration};
