use std::collections::HashMap;
use std::path::PathBuf;

use trigger::TriggerInputs;

/// Snapshot of the workflow runner's environment, taken once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ActionEnvironment {
    vars: HashMap<String, String>,
}

impl ActionEnvironment {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Builds a snapshot from explicit key/value pairs.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// The raw action inputs plus the ambient git context.
    pub fn inputs(&self) -> TriggerInputs {
        TriggerInputs {
            access_token: self.get("INPUT_ACCESS_TOKEN"),
            pipeline: self.get("INPUT_PIPELINE"),
            branch: self.get("INPUT_BRANCH"),
            commit: self.get("INPUT_COMMIT"),
            message: self.get("INPUT_MESSAGE"),
            env: self.get("INPUT_ENV"),
            is_async: self.get("INPUT_ASYNC"),
            test_mode: self.get("TEST_MODE"),
            max_wait: self.get("INPUT_MAX_WAIT"),
            git_ref: self.get("GITHUB_REF"),
            head_ref: self.get("GITHUB_HEAD_REF"),
            sha: self.get("GITHUB_SHA"),
        }
    }

    /// Path of the webhook payload (`GITHUB_EVENT_PATH`).
    pub fn event_path(&self) -> Option<PathBuf> {
        self.get("GITHUB_EVENT_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Path of the step-output file (`GITHUB_OUTPUT`).
    pub fn output_path(&self) -> Option<PathBuf> {
        self.get("GITHUB_OUTPUT")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}
