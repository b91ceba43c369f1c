//! Run orchestration: scenario → scheduler → metrics → thresholds → report.
mod runner;


pub(crate) use runner::{RunOutcome, run_local};
