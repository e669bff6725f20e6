//! `buildkite-trigger` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse flags**: process-level knobs (log format and level, OTLP
//!    endpoint, fixture directory) via `clap`.
//! 2. **Wire observability**: `tracing-subscriber` plus an optional
//!    OpenTelemetry OTLP exporter.
//! 3. **Resolve the invocation**: snapshot the GitHub Actions environment,
//!    read the event file, and validate both into an
//!    [`trigger::InvocationContext`].
//! 4. **Construct infrastructure**: the HTTP transport, or the fixture
//!    transport in test mode, plus the GitHub Actions host and a tokio clock,
//!    injected into [`trigger::TriggerRunner`].
//! 5. **Map the outcome** to the process exit status.

mod clock;
mod observability;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use buildkite::{FixtureTransport, HttpTransport, DEFAULT_FIXTURE_DIR};
use clap::Parser;
use github::{
    escape_command_data, read_event, ActionEnvironment, GithubActionsHost, GithubError,
};
use tracing::{error, info, info_span, Instrument, Level};
use trigger::{BuildTransport, InvocationContext, RunId, TriggerError, TriggerRunner};

use crate::clock::TokioClock;

/// Trigger a Buildkite pipeline from a GitHub Actions step.
///
/// Action inputs are read from `INPUT_*` variables and the ambient
/// `GITHUB_*` context; the flags below only tune the process itself.
#[derive(Debug, Parser)]
#[command(name = "buildkite-trigger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Emit JSON-formatted log lines
    #[arg(long, env = "TRIGGER_JSON_LOGS")]
    json_logs: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "TRIGGER_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Export spans to this OTLP/gRPC endpoint
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Directory of canned responses used when TEST_MODE is true
    #[arg(long, env = "TEST_RESPONSES_DIR", default_value = DEFAULT_FIXTURE_DIR)]
    fixtures_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match observability::init(
        cli.json_logs,
        cli.log_level,
        cli.otlp_endpoint.as_deref(),
    ) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let run_id = RunId::new_random();
    let outcome = run(&cli)
        .instrument(info_span!("trigger_run", run.id = %run_id))
        .await;

    if let Err(err) = &outcome {
        error!(error = %format!("{err:#}"), "trigger run failed");
        // Surfaces as an annotation on the workflow run.
        println!("{}", error_annotation(err));
    }

    telemetry.shutdown();
    ExitCode::from(exit_status(&outcome))
}

/// Any error, including a failing pipeline state, is a failed step.
fn exit_status(outcome: &Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn error_annotation(err: &anyhow::Error) -> String {
    format!("::error::{}", escape_command_data(&format!("{err:#}")))
}

async fn run(cli: &Cli) -> Result<()> {
    let env = ActionEnvironment::from_process();

    let event_path = env
        .event_path()
        .ok_or(GithubError::EventPathMissing)
        .map_err(TriggerError::from)?;
    let event = read_event(&event_path).map_err(TriggerError::from)?;
    let ctx = InvocationContext::resolve(&env.inputs(), event)?;

    info!(
        pipeline = %ctx.pipeline,
        branch = %ctx.branch,
        commit = %ctx.commit,
        is_async = ctx.is_async,
        test_mode = ctx.is_test_mode,
        "resolved invocation context"
    );

    let transport: Arc<dyn BuildTransport> = if ctx.is_test_mode {
        Arc::new(FixtureTransport::new(&cli.fixtures_dir))
    } else {
        Arc::new(HttpTransport::new().context("could not set up the Buildkite client")?)
    };
    let host = Arc::new(GithubActionsHost::from_output_path(env.output_path()));

    TriggerRunner::new(transport, Arc::new(TokioClock), host)
        .run(&ctx)
        .await?;
    Ok(())
}
