use std::path::PathBuf;

use thiserror::Error;
use trigger::TriggerError;

/// Failures reading what the workflow runner provides.
#[derive(Debug, Error)]
pub enum GithubError {
    /// `GITHUB_EVENT_PATH` was not set.
    #[error("GITHUB_EVENT_PATH is not set")]
    EventPathMissing,

    /// The event file could not be read.
    #[error("Could not read event file {path}: {source}")]
    EventRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event file is not valid JSON or lacks a required field.
    #[error("Invalid event payload: {0}")]
    EventParse(#[from] serde_json::Error),

    /// A pull-request event carried an unusable value.
    #[error("Invalid pull request in event payload: {0}")]
    PullRequest(String),
}

impl From<GithubError> for TriggerError {
    fn from(err: GithubError) -> Self {
        TriggerError::configuration(err.to_string())
    }
}
