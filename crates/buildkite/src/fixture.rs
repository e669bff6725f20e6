use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;
use trigger::{ApiRequest, BuildDescriptor, BuildTransport, TransportError};

/// Directory canned responses are read from when none is configured.
pub const DEFAULT_FIXTURE_DIR: &str = "./test_responses";

/// Offline [`BuildTransport`] that answers every request with
/// `<dir>/<purpose>.json` (`create_build.json`, `build_passed.json`).
///
/// The outgoing request is echoed to stdout so a dry run shows exactly what
/// would have been sent.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    dir: PathBuf,
}

impl FixtureTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the canned response for `request`.
    pub fn fixture_path(&self, request: &ApiRequest) -> PathBuf {
        self.dir
            .join(format!("{}.json", request.purpose.fixture_name()))
    }
}

impl Default for FixtureTransport {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_DIR)
    }
}

/// Renders the method, URL and body of `request` for inspection.
///
/// The token is never included.
pub fn echo_request(request: &ApiRequest) -> String {
    let mut out = format!("{} {}", request.method, request.url);
    if let Some(body) = &request.body {
        out.push('\n');
        out.push_str(&body.to_string());
    }
    out
}

#[async_trait]
impl BuildTransport for FixtureTransport {
    async fn send(&self, request: &ApiRequest) -> Result<BuildDescriptor, TransportError> {
        println!("{}", echo_request(request));

        let path = self.fixture_path(request);
        info!(path = %path.display(), "serving canned Buildkite response");

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| TransportError::Fixture {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            url: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
