//! Core library for the `surge` CLI.
//!
//! `surge` drives HTTP load against a target service: a scenario file
//! describes ramp stages, request steps with response checks, and
//! thresholds over the collected metrics. Virtual users are tokio tasks
//! scheduled along the ramp; every response is timed, checked, and folded
//! into a sharded aggregator whose final snapshot decides the verdict and
//! the process exit code.
//!
//! The binary is the primary interface; library APIs may evolve with it.
mod app;
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
mod logger;
pub mod metrics;
pub mod report;
pub mod scenario;
pub mod scheduler;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod thresholds;
