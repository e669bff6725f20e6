//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Production implementation | Test implementation |
//! |-------|---------------------------|---------------------|
//! | [`BuildTransport`] | `buildkite::HttpTransport`, `buildkite::FixtureTransport` | [`crate::fakes::ScriptedTransport`] |
//! | [`Clock`] | `cli`'s tokio-backed clock | [`crate::fakes::ManualClock`] |
//! | [`ActionHost`] | `github::GithubActionsHost` | [`crate::fakes::RecordingHost`] |

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::{AccessToken, BuildDescriptor, HostError, TransportError};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request is being made.
///
/// Transports that serve canned responses key them on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    /// The initial create-build call.
    CreateBuild,
    /// A status poll while waiting for the build to finish.
    PollBuild,
}

impl RequestPurpose {
    /// Name of the canned response used in offline mode.
    pub fn fixture_name(self) -> &'static str {
        match self {
            Self::CreateBuild => "create_build",
            Self::PollBuild => "build_passed",
        }
    }
}

/// One authenticated call to the Buildkite REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub token: AccessToken,
    /// JSON body; `None` for bodiless requests.
    pub body: Option<Value>,
    pub purpose: RequestPurpose,
}

/// Sends an [`ApiRequest`] and decodes the response as a build descriptor.
///
/// Implementations must treat a non-2xx status, a timeout, and an undecodable
/// body as errors. They must not retry.
#[async_trait]
pub trait BuildTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<BuildDescriptor, TransportError>;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source and sleep for the wait loop.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspends for `duration`.
    async fn sleep(&self, duration: Duration);
}

// ---------------------------------------------------------------------------
// Automation host
// ---------------------------------------------------------------------------

/// The automation environment the run reports back to.
pub trait ActionHost: Send + Sync {
    /// Writes one human-readable progress line.
    fn notice(&self, line: &str);

    /// Publishes a named output value.
    fn set_output(&self, name: &str, value: &str) -> Result<(), HostError>;
}
