//! Shared value types for the trigger domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structure: the identity of the triggering actor, the pull-request metadata
//! forwarded to Buildkite, the remote build descriptor, and the wire body of a
//! create-build request.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{BranchName, BuildId, BuildNumber, CommitSha, PullRequestNumber};

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

/// Key/value identity of whoever pushed the triggering change
/// (typically `name` and `email`).
///
/// Forwarded verbatim as the `author` field of the create-build request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Author(BTreeMap<String, String>);

impl Author {
    /// Creates an author record from key/value pairs.
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }

    /// Returns `true` when the event carried no identity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up one identity field (e.g. `"email"`).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Pull request
// ---------------------------------------------------------------------------

/// Pull-request metadata forwarded to Buildkite when the run was triggered by
/// a pull-request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// Pull request number.
    pub number: PullRequestNumber,
    /// Branch the pull request targets.
    pub base_branch: BranchName,
    /// Clone URL of the repository the pull request comes from.
    pub repository: String,
}

// ---------------------------------------------------------------------------
// Build state
// ---------------------------------------------------------------------------

/// Remote build state as reported by Buildkite.
///
/// Only the states this tool reasons about get their own variant; every other
/// string is preserved in [`BuildState::Other`] so it can be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildState {
    Scheduled,
    Running,
    Passed,
    Failed,
    Canceled,
    Blocked,
    Other(String),
}

impl BuildState {
    /// Returns the wire representation of the state.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Blocked => "blocked",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for the states that do not fail the run:
    /// `scheduled`, `running` and `passed`.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Running | Self::Passed)
    }

    /// Console icon for the state.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Scheduled => "🔗️",
            Self::Running => "🏃",
            Self::Passed => "💚",
            _ => "💔",
        }
    }
}

impl From<String> for BuildState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "scheduled" => Self::Scheduled,
            "running" => Self::Running,
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            "blocked" => Self::Blocked,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for BuildState {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<BuildState> for String {
    fn from(state: BuildState) -> Self {
        match state {
            BuildState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Build descriptor
// ---------------------------------------------------------------------------

/// Buildkite's representation of a triggered build.
///
/// Fields this tool does not interpret are kept in `extra` so the `data`
/// output reproduces the whole remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    pub id: BuildId,
    pub number: BuildNumber,
    /// REST endpoint to poll for this build.
    pub url: String,
    /// Human-facing link to the build page.
    pub web_url: String,
    pub state: BuildState,
    /// Finish time as sent by Buildkite. Only its presence is interpreted;
    /// the raw value is kept so `data` echoes it unchanged.
    #[serde(default)]
    pub finished_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildDescriptor {
    /// Returns `true` once the remote system has stamped a finish time.
    ///
    /// `null` and blank strings count as not finished yet.
    pub fn is_finished(&self) -> bool {
        match &self.finished_at {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire request
// ---------------------------------------------------------------------------

/// JSON body of `POST /organizations/{org}/pipelines/{pipeline}/builds`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBuildRequest {
    pub commit: CommitSha,
    pub branch: BranchName,
    pub message: String,
    pub author: Author,
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_base_branch: Option<BranchName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_id: Option<PullRequestNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_repository: Option<String>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
