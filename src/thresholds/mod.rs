//! Threshold grammar and evaluation over finalized metrics.
mod evaluate;
mod parse;

#[cfg(test)]
mod tests;

pub use evaluate::{ThresholdVerdict, all_passed, evaluate};
pub use parse::{Aggregate, Threshold, build_thresholds, parse_expression};
