//! Validated scenario model: stages, steps, checks, thresholds, options.
mod check;
mod load;
mod types;


pub use check::{Check, CompareOp, Predicate};
pub use load::load;
pub use types::{
    DEFAULT_GRACE_PERIOD, DEFAULT_SUMMARY_PATH, DEFAULT_TICK, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT, RunOptions, RunOverrides, Scenario, ScenarioStep, Stage, ThinkTime,
};
