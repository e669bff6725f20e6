//! In-memory fakes for the port traits (testing only).
//!
//! Provides [`ScriptedTransport`], [`ManualClock`] and [`RecordingHost`] so
//! the trigger flow can be exercised without network access or real delays.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::ports::*;
use crate::{BuildDescriptor, BuildId, BuildNumber, HostError, Timestamp, TransportError};

// ---------------------------------------------------------------------------
// Sample descriptors
// ---------------------------------------------------------------------------

/// A descriptor for build #1 of `acme/web` in `state`, finished or not.
pub fn sample_build(state: &str, finished: bool) -> BuildDescriptor {
    BuildDescriptor {
        id: BuildId::new("f62a1b4d-10f9-4790-bc1c-e2c3a0c80983").expect("non-empty id"),
        number: BuildNumber::new(1),
        url: "https://api.buildkite.com/v2/organizations/acme/pipelines/web/builds/1".to_string(),
        web_url: "https://buildkite.com/acme/web/builds/1".to_string(),
        state: state.into(),
        finished_at: finished.then(|| Value::String(Timestamp::now().to_string())),
        extra: Map::new(),
    }
}

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// Clock whose time only moves when [`Clock::sleep`] is called.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated time since construction.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// A request as the transport saw it, with the simulated time it arrived.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: ApiRequest,
    /// [`ManualClock::elapsed`] at send time, when a clock is attached.
    pub at: Option<Duration>,
}

/// Transport that replays a fixed script of responses in order.
///
/// Once the script is exhausted every call fails with a
/// [`TransportError::Network`].
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<BuildDescriptor, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    clock: Option<Arc<ManualClock>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Result<BuildDescriptor, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Like [`ScriptedTransport::new`], stamping each request with `clock`'s
    /// elapsed time.
    pub fn observing(
        clock: Arc<ManualClock>,
        script: impl IntoIterator<Item = Result<BuildDescriptor, TransportError>>,
    ) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new(script)
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made for `purpose`.
    pub fn count(&self, purpose: RequestPurpose) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.request.purpose == purpose)
            .count()
    }
}

#[async_trait]
impl BuildTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<BuildDescriptor, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            request: request.clone(),
            at: self.clock.as_ref().map(|c| c.elapsed()),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Network {
                    url: request.url.clone(),
                    message: "script exhausted".to_string(),
                })
            })
    }
}

// ---------------------------------------------------------------------------
// RecordingHost
// ---------------------------------------------------------------------------

/// Host that keeps every notice and output in memory.
#[derive(Debug, Default)]
pub struct RecordingHost {
    notices: Mutex<Vec<String>>,
    outputs: Mutex<Vec<(String, String)>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    /// Outputs in the order they were written.
    pub fn outputs(&self) -> Vec<(String, String)> {
        self.outputs.lock().unwrap().clone()
    }

    /// The last value written for `name`.
    pub fn output(&self, name: &str) -> Option<String> {
        self.outputs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

impl ActionHost for RecordingHost {
    fn notice(&self, line: &str) {
        self.notices.lock().unwrap().push(line.to_string());
    }

    fn set_output(&self, name: &str, value: &str) -> Result<(), HostError> {
        self.outputs
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }
}
