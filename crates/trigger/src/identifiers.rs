//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example, a
//! [`BuildNumber`] with a [`PullRequestNumber`] even though both are `u64` under
//! the hood.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TriggerError;

/// Root of the Buildkite REST API used to build pipeline URLs.
pub const BUILDKITE_API_BASE: &str = "https://api.buildkite.com/v2";

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (remote-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: remote-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// The per-pipeline sequence number Buildkite assigns to a build.
    BuildNumber
}

u64_id! {
    /// Number of the GitHub pull request that triggered the run.
    PullRequestNumber
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// A Git branch name (e.g. `"main"`, `"feature/login"`).
    ///
    /// When the triggering ref is not a branch (a tag, say) this carries the
    /// raw ref string unchanged.
    BranchName
}

string_id! {
    /// A Git revision, usually a 40-character SHA.
    CommitSha
}

string_id! {
    /// Buildkite's opaque build identifier (a UUID rendered as text).
    BuildId
}

// ---------------------------------------------------------------------------
// Run identifier (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single invocation of the trigger.
///
/// Generated fresh for every process; attached to the top-level tracing span
/// so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A Buildkite API access token.
///
/// `Debug` is redacted so the token never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token, returning `None` if it is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Renders the `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

// ---------------------------------------------------------------------------
// Pipeline slug
// ---------------------------------------------------------------------------

/// A pipeline reference in `organization/pipeline` form.
///
/// Parsing splits once on `/`. Both halves must be non-empty and the pipeline
/// half must not contain another `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineSlug {
    organization: String,
    pipeline: String,
}

impl PipelineSlug {
    /// Returns the organization half of the slug.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Returns the pipeline half of the slug.
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// The endpoint that creates builds for this pipeline.
    pub fn builds_url(&self) -> String {
        format!(
            "{BUILDKITE_API_BASE}/organizations/{}/pipelines/{}/builds",
            self.organization, self.pipeline
        )
    }
}

impl FromStr for PipelineSlug {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TriggerError::Configuration {
            message: format!("pipeline must be in the form 'organization/pipeline', got '{s}'"),
        };

        let (organization, pipeline) = s.split_once('/').ok_or_else(invalid)?;
        if organization.is_empty() || pipeline.is_empty() || pipeline.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            organization: organization.to_string(),
            pipeline: pipeline.to_string(),
        })
    }
}

impl std::fmt::Display for PipelineSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.organization, self.pipeline)
    }
}
