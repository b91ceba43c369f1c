mod app;
mod config;
mod metrics;
mod report;
mod request;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use metrics::MetricsError;
pub use report::ReportError;
pub use request::RequestError;
pub use validation::ValidationError;
