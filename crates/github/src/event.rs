use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use trigger::{Author, BranchName, EventDetails, PullRequestInfo, PullRequestNumber};

use crate::GithubError;

// Only the fields the trigger forwards; everything else in the payload is
// ignored.
#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pusher: Option<Map<String, Value>>,
    #[serde(default)]
    pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    base: BasePayload,
    head: HeadPayload,
}

#[derive(Debug, Deserialize)]
struct BasePayload {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    // Null when the fork behind the pull request has been deleted.
    repo: Option<RepoPayload>,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    clone_url: String,
}

/// Reads and parses the webhook payload at `path`.
pub fn read_event(path: &Path) -> Result<EventDetails, GithubError> {
    let text = std::fs::read_to_string(path).map_err(|source| GithubError::EventRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "read event payload");
    parse_event(&text)
}

/// Extracts the pusher identity and pull-request metadata from a webhook
/// payload.
pub fn parse_event(text: &str) -> Result<EventDetails, GithubError> {
    let payload: EventPayload = serde_json::from_str(text)?;

    let author = payload
        .pusher
        .map(|fields| {
            fields
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect::<BTreeMap<_, _>>()
        })
        .map(Author::new)
        .unwrap_or_default();

    let pull_request = payload.pull_request.map(pull_request_info).transpose()?;

    Ok(EventDetails {
        author,
        pull_request,
    })
}

fn pull_request_info(pr: PullRequestPayload) -> Result<PullRequestInfo, GithubError> {
    let base_branch = BranchName::new(pr.base.ref_name)
        .ok_or_else(|| GithubError::PullRequest("base ref is empty".to_string()))?;
    let repository = pr
        .head
        .repo
        .map(|r| r.clone_url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| GithubError::PullRequest("head repository is missing".to_string()))?;

    Ok(PullRequestInfo {
        number: PullRequestNumber::new(pr.number),
        base_branch,
        repository,
    })
}
