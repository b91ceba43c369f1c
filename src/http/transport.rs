use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Url, header::HeaderMap, redirect};
use tracing::debug;

use crate::args::HttpMethod;
use crate::error::{AppResult, RequestError};
use crate::scenario::{RunOptions, ScenarioStep};

/// One outgoing request, borrowed from a scenario step.
#[derive(Debug, Clone, Copy)]
pub struct RequestSpec<'step> {
    pub method: HttpMethod,
    pub url: &'step Url,
    pub headers: &'step [(String, String)],
    pub body: Option<&'step str>,
    /// Keep the response body in memory (a check inspects it).
    pub keep_body: bool,
}

impl<'step> RequestSpec<'step> {
    #[must_use]
    pub fn from_step(step: &'step ScenarioStep) -> Self {
        Self {
            method: step.method,
            url: &step.url,
            headers: &step.headers,
            body: step.body.as_deref(),
            keep_body: step.needs_body(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub bytes_received: u64,
}

/// Sends a single request. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestSpec<'_>) -> Result<TransportResponse, RequestError>;
}

/// Production transport over one pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the shared client from run options.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(options: &RunOptions) -> AppResult<Self> {
        let mut client_builder = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.as_str());

        if options.max_redirects == 0 {
            client_builder = client_builder.redirect(redirect::Policy::none());
        } else {
            client_builder = client_builder.redirect(redirect::Policy::limited(
                usize::try_from(options.max_redirects).unwrap_or(10),
            ));
        }

        if options.insecure {
            client_builder = client_builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        Ok(Self {
            client: client_builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestSpec<'_>) -> Result<TransportResponse, RequestError> {
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), request.url.clone());
        for (name, value) in request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body.to_owned());
        }

        let response = builder.send().await.map_err(|err| {
            debug!("Request to {} failed: {}", request.url, err);
            RequestError::from_reqwest(&err)
        })?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let (body, bytes_received) = drain_response_body(response, request.keep_body)
            .await
            .map_err(|err| {
                debug!("Failed to read response body from {}: {}", request.url, err);
                RequestError::from_reqwest(&err)
            })?;

        Ok(TransportResponse {
            status,
            headers,
            body,
            bytes_received,
        })
    }
}

async fn drain_response_body(
    response: reqwest::Response,
    keep_body: bool,
) -> Result<(Option<Vec<u8>>, u64), reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    let mut body = keep_body.then(Vec::new);
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
        if let Some(buffer) = body.as_mut() {
            buffer.extend_from_slice(&bytes);
        }
    }
    Ok((body, total_bytes))
}
