use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to decode histogram payload: {source}")]
    DecodeBase64 {
        #[source]
        source: base64::DecodeError,
    },
    #[error("Metric '{name}' is registered twice with different kinds.")]
    KindConflict { name: String },
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
