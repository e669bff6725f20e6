//! Context resolution: turning raw action inputs and the triggering event into
//! a validated [`InvocationContext`].
//!
//! The raw values are gathered by an infrastructure adapter (see the `github`
//! crate) into [`TriggerInputs`] and [`EventDetails`]; nothing in this module
//! reads the process environment or the file system.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::{
    AccessToken, Author, BranchName, CommitSha, CreateBuildRequest, PipelineSlug, PullRequestInfo,
    TriggerError,
};

/// Prefix GitHub puts in front of branch refs.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

// ---------------------------------------------------------------------------
// Raw inputs
// ---------------------------------------------------------------------------

/// Unvalidated string inputs for one run, as the automation host supplied them.
///
/// Empty strings are treated exactly like absent values: GitHub Actions exports
/// unset `with:` inputs as empty environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerInputs {
    /// Buildkite API token.
    pub access_token: Option<String>,
    /// Pipeline in `organization/pipeline` form.
    pub pipeline: Option<String>,
    /// Explicit branch override.
    pub branch: Option<String>,
    /// Explicit commit override.
    pub commit: Option<String>,
    /// Build message.
    pub message: Option<String>,
    /// JSON object of extra environment variables for the build.
    pub env: Option<String>,
    /// `"true"` to return right after triggering.
    pub is_async: Option<String>,
    /// `"true"` to replace network calls with canned fixtures.
    pub test_mode: Option<String>,
    /// Optional ceiling on the wait loop, in whole seconds.
    pub max_wait: Option<String>,
    /// The ref that triggered the workflow (`GITHUB_REF`).
    pub git_ref: Option<String>,
    /// Head branch of a pull request (`GITHUB_HEAD_REF`).
    pub head_ref: Option<String>,
    /// Revision that triggered the workflow (`GITHUB_SHA`).
    pub sha: Option<String>,
}

/// The parts of the triggering event document the run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDetails {
    /// Identity of the pusher; empty when the event has none.
    pub author: Author,
    /// Present only for pull-request events.
    pub pull_request: Option<PullRequestInfo>,
}

// ---------------------------------------------------------------------------
// Invocation context
// ---------------------------------------------------------------------------

/// Immutable configuration for one trigger run.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationContext {
    pub author: Author,
    pub access_token: AccessToken,
    pub pipeline: PipelineSlug,
    pub branch: BranchName,
    pub commit: CommitSha,
    pub message: String,
    /// Extra environment passed through to the build.
    pub env: BTreeMap<String, String>,
    pub pull_request: Option<PullRequestInfo>,
    pub is_async: bool,
    pub is_test_mode: bool,
    /// Optional ceiling on the wait loop. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
}

impl InvocationContext {
    /// Validates `inputs` and `event` into a context.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Configuration`] naming the first missing or
    /// malformed input.
    pub fn resolve(inputs: &TriggerInputs, event: EventDetails) -> Result<Self, TriggerError> {
        let access_token = non_empty(&inputs.access_token)
            .and_then(AccessToken::new)
            .ok_or_else(|| missing("access token"))?;

        let pipeline = non_empty(&inputs.pipeline)
            .ok_or_else(|| missing("pipeline"))?
            .parse::<PipelineSlug>()?;

        let branch = resolve_branch(
            non_empty(&inputs.branch),
            non_empty(&inputs.head_ref),
            non_empty(&inputs.git_ref),
        )
        .ok_or_else(|| missing("branch (no override, head ref, or ref available)"))?;

        let commit = non_empty(&inputs.commit)
            .or_else(|| non_empty(&inputs.sha))
            .and_then(CommitSha::new)
            .ok_or_else(|| missing("commit (no override or revision SHA available)"))?;

        // Required but may be empty: a message templated from the head commit
        // is blank on pull-request events.
        let message = inputs.message.clone().ok_or_else(|| missing("message"))?;

        Ok(Self {
            author: event.author,
            access_token,
            pipeline,
            branch,
            commit,
            message,
            env: parse_extra_env(inputs.env.as_deref())?,
            pull_request: event.pull_request,
            is_async: parse_flag(inputs.is_async.as_deref()),
            is_test_mode: parse_flag(inputs.test_mode.as_deref()),
            max_wait: parse_max_wait(inputs.max_wait.as_deref())?,
        })
    }

    /// Builds the create-build request body for this context.
    pub fn create_build_request(&self) -> CreateBuildRequest {
        let pr = self.pull_request.as_ref();
        CreateBuildRequest {
            commit: self.commit.clone(),
            branch: self.branch.clone(),
            message: self.message.clone(),
            author: self.author.clone(),
            env: self.env.clone(),
            pull_request_base_branch: pr.map(|p| p.base_branch.clone()),
            pull_request_id: pr.map(|p| p.number),
            pull_request_repository: pr.map(|p| p.repository.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution rules
// ---------------------------------------------------------------------------

/// Picks the branch to build.
///
/// Precedence: explicit override, then the pull-request head branch, then the
/// ref with `refs/heads/` stripped. A ref without that prefix (a tag, say) is
/// returned unchanged.
pub fn resolve_branch(
    explicit: Option<&str>,
    head_ref: Option<&str>,
    git_ref: Option<&str>,
) -> Option<BranchName> {
    let present = |s: &&str| !s.is_empty();

    if let Some(branch) = explicit.filter(present).or(head_ref.filter(present)) {
        return BranchName::new(branch);
    }

    let git_ref = git_ref.filter(present)?;
    BranchName::new(git_ref.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(git_ref))
}

/// Parses the extra-environment input.
///
/// Absent or empty input yields an empty map. Anything other than a JSON
/// object is rejected. Non-string values are rendered as their JSON text.
pub fn parse_extra_env(raw: Option<&str>) -> Result<BTreeMap<String, String>, TriggerError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(BTreeMap::new());
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| TriggerError::configuration(format!("env is not valid JSON: {e}")))?;

    let Value::Object(map) = value else {
        return Err(TriggerError::configuration("env must be a JSON object"));
    };

    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}

/// `"true"` in any letter case is `true`; everything else is `false`.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| s.eq_ignore_ascii_case("true"))
}

fn parse_max_wait(raw: Option<&str>) -> Result<Option<Duration>, TriggerError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let seconds: u64 = raw.parse().map_err(|_| {
        TriggerError::configuration(format!("max wait must be a whole number of seconds, got '{raw}'"))
    })?;
    Ok(Some(Duration::from_secs(seconds)))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn missing(what: &str) -> TriggerError {
    TriggerError::configuration(format!("missing required input: {what}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PullRequestNumber;

    fn inputs() -> TriggerInputs {
        TriggerInputs {
            access_token: Some("token".to_string()),
            pipeline: Some("acme/web".to_string()),
            message: Some("Deploy".to_string()),
            git_ref: Some("refs/heads/main".to_string()),
            sha: Some("abc123".to_string()),
            ..TriggerInputs::default()
        }
    }

    // -- branch ---------------------------------------------------------------

    #[test]
    fn branch_strips_heads_prefix() {
        let branch = resolve_branch(None, None, Some("refs/heads/main")).unwrap();
        assert_eq!(branch.as_str(), "main");
    }

    #[test]
    fn branch_keeps_non_branch_refs() {
        let branch = resolve_branch(None, None, Some("refs/tags/v1")).unwrap();
        assert_eq!(branch.as_str(), "refs/tags/v1");
    }

    #[test]
    fn branch_prefers_head_ref_over_ref() {
        let branch = resolve_branch(None, Some("feature/x"), Some("refs/pull/7/merge")).unwrap();
        assert_eq!(branch.as_str(), "feature/x");
    }

    #[test]
    fn branch_prefers_override_over_everything() {
        let branch =
            resolve_branch(Some("release"), Some("feature/x"), Some("refs/heads/main")).unwrap();
        assert_eq!(branch.as_str(), "release");
    }

    #[test]
    fn branch_is_none_without_any_source() {
        assert!(resolve_branch(None, None, None).is_none());
    }

    // -- extra env ------------------------------------------------------------

    #[test]
    fn extra_env_parses_object() {
        let env = parse_extra_env(Some(r#"{"A":"1"}"#)).unwrap();
        assert_eq!(env, BTreeMap::from([("A".to_string(), "1".to_string())]));
    }

    #[test]
    fn extra_env_defaults_to_empty() {
        assert!(parse_extra_env(None).unwrap().is_empty());
        assert!(parse_extra_env(Some("")).unwrap().is_empty());
    }

    #[test]
    fn extra_env_rejects_bad_json() {
        let err = parse_extra_env(Some("{bad json")).unwrap_err();
        assert!(matches!(err, TriggerError::Configuration { .. }));
    }

    #[test]
    fn extra_env_rejects_non_object() {
        let err = parse_extra_env(Some(r#"["A"]"#)).unwrap_err();
        assert!(matches!(err, TriggerError::Configuration { .. }));
    }

    #[test]
    fn extra_env_stringifies_scalars() {
        let env = parse_extra_env(Some(r#"{"N":3,"B":true}"#)).unwrap();
        assert_eq!(env["N"], "3");
        assert_eq!(env["B"], "true");
    }

    // -- flags ----------------------------------------------------------------

    #[test]
    fn flags_are_case_insensitive_true_only() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("TRUE")));
        assert!(parse_flag(Some("True")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    // -- resolve --------------------------------------------------------------

    #[test]
    fn resolve_builds_context_from_ambient_values() {
        let ctx = InvocationContext::resolve(&inputs(), EventDetails::default()).unwrap();

        assert_eq!(ctx.pipeline.to_string(), "acme/web");
        assert_eq!(ctx.branch.as_str(), "main");
        assert_eq!(ctx.commit.as_str(), "abc123");
        assert_eq!(ctx.message, "Deploy");
        assert!(ctx.env.is_empty());
        assert!(!ctx.is_async);
        assert!(!ctx.is_test_mode);
        assert!(ctx.max_wait.is_none());
    }

    #[test]
    fn resolve_treats_empty_overrides_as_absent() {
        let mut raw = inputs();
        raw.branch = Some(String::new());
        raw.commit = Some(String::new());
        raw.head_ref = Some(String::new());

        let ctx = InvocationContext::resolve(&raw, EventDetails::default()).unwrap();

        assert_eq!(ctx.branch.as_str(), "main");
        assert_eq!(ctx.commit.as_str(), "abc123");
    }

    #[test]
    fn resolve_accepts_empty_message() {
        let mut raw = inputs();
        raw.message = Some(String::new());

        let ctx = InvocationContext::resolve(&raw, EventDetails::default()).unwrap();
        assert_eq!(ctx.message, "");
        assert_eq!(ctx.create_build_request().message, "");
    }

    #[test]
    fn resolve_requires_message_to_be_set() {
        let mut raw = inputs();
        raw.message = None;

        let err = InvocationContext::resolve(&raw, EventDetails::default()).unwrap_err();
        assert!(err.to_string().contains("message"), "{err}");
    }

    #[test]
    fn resolve_prefers_commit_override() {
        let mut raw = inputs();
        raw.commit = Some("def456".to_string());

        let ctx = InvocationContext::resolve(&raw, EventDetails::default()).unwrap();
        assert_eq!(ctx.commit.as_str(), "def456");
    }

    #[test]
    fn resolve_reports_missing_token() {
        let mut raw = inputs();
        raw.access_token = None;

        let err = InvocationContext::resolve(&raw, EventDetails::default()).unwrap_err();
        assert!(err.to_string().contains("access token"), "{err}");
    }

    #[test]
    fn resolve_rejects_malformed_pipeline() {
        let mut raw = inputs();
        raw.pipeline = Some("acme/web/extra".to_string());

        let err = InvocationContext::resolve(&raw, EventDetails::default()).unwrap_err();
        assert!(matches!(err, TriggerError::Configuration { .. }));
    }

    #[test]
    fn resolve_parses_max_wait_seconds() {
        let mut raw = inputs();
        raw.max_wait = Some("900".to_string());

        let ctx = InvocationContext::resolve(&raw, EventDetails::default()).unwrap();
        assert_eq!(ctx.max_wait, Some(Duration::from_secs(900)));

        raw.max_wait = Some("soon".to_string());
        assert!(InvocationContext::resolve(&raw, EventDetails::default()).is_err());
    }

    #[test]
    fn create_request_carries_pull_request_fields() {
        let event = EventDetails {
            author: Author::new(BTreeMap::from([("name".to_string(), "octo".to_string())])),
            pull_request: Some(PullRequestInfo {
                number: PullRequestNumber::new(42),
                base_branch: BranchName::new("main").unwrap(),
                repository: "https://github.com/octo/web.git".to_string(),
            }),
        };
        let ctx = InvocationContext::resolve(&inputs(), event).unwrap();

        let body = serde_json::to_value(ctx.create_build_request()).unwrap();

        assert_eq!(body["author"]["name"], "octo");
        assert_eq!(body["pull_request_id"], 42);
        assert_eq!(body["pull_request_base_branch"], "main");
        assert_eq!(body["pull_request_repository"], "https://github.com/octo/web.git");
    }
}
