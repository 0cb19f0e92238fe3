//! HTTP transport towards push services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use dealerhub_core::error::AppError;

use super::error::PushFailure;

/// One encrypted message ready to be posted to a push service.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub endpoint: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl PushRequest {
    /// Value of a header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the push service answered.
#[derive(Debug, Clone)]
pub struct PushResponse {
    pub status: u16,
    /// `Retry-After` in seconds, when given as a number.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl PushResponse {
    /// Whether the push service accepted the message.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends push requests. Network-level failures are `Transport` failures;
/// HTTP error statuses are returned as responses for the caller to classify.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, request: PushRequest) -> Result<PushResponse, PushFailure>;
}

/// [`PushTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    client: Client,
}

impl HttpPushTransport {
    /// Build a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build push HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(&self, request: PushRequest) -> Result<PushResponse, PushFailure> {
        let mut builder = self.client.post(&request.endpoint);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| PushFailure::Transport {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        Ok(PushResponse {
            status,
            retry_after,
            body,
        })
    }
}
