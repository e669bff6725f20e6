//! The trigger flow: create a build, optionally wait for it, report the result.
//!
//! [`TriggerRunner`] owns the three ports it needs and runs strictly in
//! sequence: one create call, then (unless the run is asynchronous) a poll
//! loop paced by the injected [`Clock`], then outputs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    ActionHost, ApiRequest, BuildDescriptor, BuildState, BuildTransport, Clock, HttpMethod,
    InvocationContext, RequestPurpose, TriggerError,
};

// ---------------------------------------------------------------------------
// Wait policy
// ---------------------------------------------------------------------------

/// Pacing of the completion wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Sleep before every poll.
    pub poll_interval: Duration,
    /// A "still waiting" notice is emitted once more than this has passed
    /// since the previous one.
    pub notice_interval: Duration,
    /// Give up after this long. `None` waits until the build finishes or the
    /// process is killed.
    pub max_wait: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            notice_interval: Duration::from_secs(60),
            max_wait: None,
        }
    }
}

impl WaitPolicy {
    /// Default pacing with the context's optional ceiling applied.
    pub fn for_context(ctx: &InvocationContext) -> Self {
        Self {
            max_wait: ctx.max_wait,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Drives one trigger run against injected infrastructure.
pub struct TriggerRunner {
    transport: Arc<dyn BuildTransport>,
    clock: Arc<dyn Clock>,
    host: Arc<dyn ActionHost>,
}

impl TriggerRunner {
    pub fn new(
        transport: Arc<dyn BuildTransport>,
        clock: Arc<dyn Clock>,
        host: Arc<dyn ActionHost>,
    ) -> Self {
        Self {
            transport,
            clock,
            host,
        }
    }

    /// Runs the whole flow for `ctx`.
    ///
    /// Outputs are written before a failing state is turned into
    /// [`TriggerError::PipelineFailed`], so the caller always sees the final
    /// descriptor.
    pub async fn run(&self, ctx: &InvocationContext) -> Result<BuildDescriptor, TriggerError> {
        let mut build = self.trigger_build(ctx).await?;
        let mut state = self.report_build_state(&build);

        if !ctx.is_async {
            build = self
                .wait_for_build(&build.url, ctx, WaitPolicy::for_context(ctx))
                .await?;
            state = self.report_build_state(&build);
        }

        self.output_build_info(&build)?;

        if !state.is_accepted() {
            warn!(state = %state, build = %build.web_url, "build ended in a failing state");
            return Err(TriggerError::PipelineFailed {
                state: state.to_string(),
            });
        }

        info!(state = %state, "trigger run succeeded");
        Ok(build)
    }

    /// Creates a build for `ctx`'s pipeline.
    pub async fn trigger_build(
        &self,
        ctx: &InvocationContext,
    ) -> Result<BuildDescriptor, TriggerError> {
        self.host.notice(&format!(
            "🪁 Triggering {} for {}@{}",
            ctx.pipeline, ctx.branch, ctx.commit
        ));

        let body = serde_json::to_value(ctx.create_build_request()).map_err(|e| {
            TriggerError::configuration(format!("could not encode build request: {e}"))
        })?;

        let request = ApiRequest {
            method: HttpMethod::Post,
            url: ctx.pipeline.builds_url(),
            token: ctx.access_token.clone(),
            body: Some(body),
            purpose: RequestPurpose::CreateBuild,
        };

        let build = self.transport.send(&request).await?;
        info!(build.id = %build.id, build.number = %build.number, state = %build.state, "build created");
        Ok(build)
    }

    /// Polls `url` until the build reports a finish time.
    ///
    /// Always sleeps and polls at least once; the state carried by the create
    /// response is never used to decide completion.
    pub async fn wait_for_build(
        &self,
        url: &str,
        ctx: &InvocationContext,
        policy: WaitPolicy,
    ) -> Result<BuildDescriptor, TriggerError> {
        let request = ApiRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            token: ctx.access_token.clone(),
            body: None,
            purpose: RequestPurpose::PollBuild,
        };

        let started = self.clock.now();
        let mut last_notice = started;
        self.host.notice("⌛ Waiting for build to finish");

        loop {
            self.clock.sleep(policy.poll_interval).await;

            let now = self.clock.now();
            if now.duration_since(last_notice) > policy.notice_interval {
                self.host.notice("⌛ Still waiting for build to finish");
                last_notice = now;
            }

            let build = self.transport.send(&request).await?;
            debug!(state = %build.state, finished = build.is_finished(), "polled build");
            if build.is_finished() {
                return Ok(build);
            }

            if let Some(limit) = policy.max_wait {
                if self.clock.now().duration_since(started) >= limit {
                    return Err(TriggerError::WaitTimedOut { limit });
                }
            }
        }
    }

    /// Prints the state line for `build` and returns its state.
    pub fn report_build_state(&self, build: &BuildDescriptor) -> BuildState {
        let state = build.state.clone();
        self.host.notice(&format!(
            "{} Build {} → {}",
            state.icon(),
            state,
            build.web_url
        ));
        state
    }

    /// Publishes the descriptor's fields as named outputs.
    pub fn output_build_info(&self, build: &BuildDescriptor) -> Result<(), TriggerError> {
        let data = serde_json::to_string(build).map_err(|e| crate::HostError {
            name: "data".to_string(),
            message: e.to_string(),
        })?;

        let outputs = [
            ("id", build.id.to_string()),
            ("number", build.number.to_string()),
            ("url", build.url.clone()),
            ("web_url", build.web_url.clone()),
            ("state", build.state.to_string()),
            ("data", data),
        ];
        for (name, value) in &outputs {
            self.host.set_output(name, value)?;
        }
        Ok(())
    }
}
