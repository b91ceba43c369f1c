use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize summary: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write summary '{path}': {source}")]
    WriteSummary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read summary '{path}': {source}")]
    ReadSummary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse summary '{path}': {source}")]
    ParseSummary {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
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
