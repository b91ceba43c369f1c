use thiserror::Error;

/// Per-request failure. Never fatal: the executor turns it into metric
/// samples and the run continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {message}")]
    Network { message: String },
}

impl RequestError {
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else {
            RequestError::Network {
                message: err.to_string(),
            }
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout)
    }
}
