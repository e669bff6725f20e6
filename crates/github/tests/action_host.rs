//! End-to-end checks of the GitHub Actions adapter: environment snapshot,
//! event file, and the `GITHUB_OUTPUT` file written by a full trigger run.

use std::collections::HashMap;
use std::sync::Arc;

use github::{read_event, ActionEnvironment, GithubActionsHost, GithubError};
use serde_json::{json, Value};
use trigger::fakes::{sample_build, ManualClock, ScriptedTransport};
use trigger::{ActionHost, InvocationContext, TriggerError, TriggerRunner};

fn write_event(dir: &tempfile::TempDir, payload: Value) -> std::path::PathBuf {
    let path = dir.path().join("event.json");
    std::fs::write(&path, payload.to_string()).unwrap();
    path
}

fn read_outputs(path: &std::path::Path) -> HashMap<String, String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn pull_request_environment_resolves_head_branch_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let event_path = write_event(
        &dir,
        json!({
            "pull_request": {
                "number": 7,
                "base": {"ref": "main"},
                "head": {"ref": "feature/x", "repo": {"clone_url": "https://github.com/fork/web.git"}}
            }
        }),
    );
    let env = ActionEnvironment::from_vars([
        ("INPUT_ACCESS_TOKEN", "bk".to_string()),
        ("INPUT_PIPELINE", "acme/web".to_string()),
        ("INPUT_MESSAGE", "PR build".to_string()),
        ("INPUT_BRANCH", String::new()),
        ("GITHUB_REF", "refs/pull/7/merge".to_string()),
        ("GITHUB_HEAD_REF", "feature/x".to_string()),
        ("GITHUB_SHA", "abc123".to_string()),
        ("GITHUB_EVENT_PATH", event_path.display().to_string()),
    ]);

    let event = read_event(&env.event_path().unwrap()).unwrap();
    let ctx = InvocationContext::resolve(&env.inputs(), event).unwrap();

    assert_eq!(ctx.branch.as_str(), "feature/x");
    let pr = ctx.pull_request.unwrap();
    assert_eq!(pr.number.as_u64(), 7);
    assert_eq!(pr.base_branch.as_str(), "main");
}

#[test]
fn missing_event_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = read_event(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GithubError::EventRead { .. }));

    let err: TriggerError = err.into();
    assert!(matches!(err, TriggerError::Configuration { .. }));
}

#[test]
fn outputs_append_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output");
    std::fs::write(&out, "earlier=step\n").unwrap();

    let host = GithubActionsHost::from_output_path(Some(out.clone()));
    host.set_output("state", "passed").unwrap();

    let outputs = read_outputs(&out);
    assert_eq!(outputs["earlier"], "step");
    assert_eq!(outputs["state"], "passed");
}

#[tokio::test]
async fn failed_run_still_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let event_path = write_event(&dir, json!({"pusher": {"name": "octocat"}}));
    let out = dir.path().join("output");
    let env = ActionEnvironment::from_vars([
        ("INPUT_ACCESS_TOKEN", "bk".to_string()),
        ("INPUT_PIPELINE", "acme/web".to_string()),
        ("INPUT_MESSAGE", "Deploy".to_string()),
        ("GITHUB_REF", "refs/heads/main".to_string()),
        ("GITHUB_SHA", "abc123".to_string()),
        ("GITHUB_EVENT_PATH", event_path.display().to_string()),
        ("GITHUB_OUTPUT", out.display().to_string()),
    ]);
    let ctx = InvocationContext::resolve(
        &env.inputs(),
        read_event(&env.event_path().unwrap()).unwrap(),
    )
    .unwrap();

    let clock = Arc::new(ManualClock::new());
    let transport = Arc::new(ScriptedTransport::new([
        Ok(sample_build("running", false)),
        Ok(sample_build("failed", true)),
    ]));
    let host = Arc::new(GithubActionsHost::from_output_path(env.output_path()));
    let runner = TriggerRunner::new(transport.clone(), clock, host);

    let err = runner.run(&ctx).await.unwrap_err();
    assert!(matches!(err, TriggerError::PipelineFailed { ref state } if state == "failed"));

    let body = transport.requests()[0].request.body.clone().unwrap();
    assert_eq!(body["author"]["name"], "octocat");

    let outputs = read_outputs(&out);
    for name in ["id", "number", "url", "web_url", "state", "data"] {
        assert!(outputs.contains_key(name), "missing output {name}");
    }
    assert_eq!(outputs["state"], "failed");

    let data: Value = serde_json::from_str(&outputs["data"]).unwrap();
    assert_eq!(data["id"], outputs["id"].as_str());
    assert_eq!(data["web_url"], outputs["web_url"].as_str());
    assert_eq!(data["number"].to_string(), outputs["number"]);
}
