use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};
use trigger::{ApiRequest, BuildDescriptor, BuildTransport, HttpMethod, TransportError};

use crate::BuildkiteError;

/// Per-call network timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("buildkite-trigger/", env!("CARGO_PKG_VERSION"));

/// [`BuildTransport`] over HTTPS.
///
/// Each call is bounded by the client-wide timeout. Nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the standard [`REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, BuildkiteError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Creates a transport with a custom per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, BuildkiteError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            TransportError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl BuildTransport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<BuildDescriptor, TransportError> {
        let url = request.url.as_str();
        debug!(method = %request.method, url, "sending Buildkite request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        }
        .header(AUTHORIZATION, request.token.bearer());

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(url, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(url, e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), url, "Buildkite request rejected");
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
