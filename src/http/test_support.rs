use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::RequestError;

use super::transport::{RequestSpec, Transport, TransportResponse};

/// Canned transport: waits `delay`, then answers with a fixed response or
/// a fixed failure.
pub(crate) struct MockTransport {
    status: u16,
    delay: Duration,
    headers: HeaderMap,
    body: Vec<u8>,
    failure: Option<RequestError>,
    calls: AtomicU64,
}

impl MockTransport {
    pub(crate) fn responding(status: u16, delay: Duration) -> Self {
        Self {
            status,
            delay,
            headers: HeaderMap::new(),
            body: Vec::new(),
            failure: None,
            calls: AtomicU64::new(0),
        }
    }

    pub(crate) fn failing(failure: RequestError, delay: Duration) -> Self {
        Self {
            failure: Some(failure),
            ..Self::responding(0, delay)
        }
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
        self
    }

    pub(crate) fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &RequestSpec<'_>) -> Result<TransportResponse, RequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if let Some(failure) = self.failure.as_ref() {
            return Err(failure.clone());
        }
        Ok(TransportResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: request.keep_body.then(|| self.body.clone()),
            bytes_received: u64::try_from(self.body.len()).unwrap_or(u64::MAX),
        })
    }
}
