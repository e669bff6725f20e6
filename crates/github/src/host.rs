use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;
use trigger::{ActionHost, HostError};
use uuid::Uuid;

/// Where step outputs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Append to the runner's `GITHUB_OUTPUT` file.
    File(PathBuf),
    /// Print the legacy `::set-output` workflow command to stdout.
    WorkflowCommand,
}

/// [`ActionHost`] for a GitHub Actions step.
#[derive(Debug, Clone)]
pub struct GithubActionsHost {
    target: OutputTarget,
}

impl GithubActionsHost {
    pub fn new(target: OutputTarget) -> Self {
        Self { target }
    }

    /// Uses the output file when the runner provides one.
    pub fn from_output_path(path: Option<PathBuf>) -> Self {
        Self::new(path.map_or(OutputTarget::WorkflowCommand, OutputTarget::File))
    }

    pub fn target(&self) -> &OutputTarget {
        &self.target
    }
}

/// Escapes the data part of a workflow command (`::name::data`).
///
/// The runner ends a command at the first newline and decodes `%XX`, so `%`,
/// `\r` and `\n` must be percent-encoded.
pub fn escape_command_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Renders one `GITHUB_OUTPUT` entry.
///
/// Multi-line values use the heredoc form with a random delimiter.
pub(crate) fn output_file_entry(name: &str, value: &str) -> String {
    if value.contains('\n') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

impl ActionHost for GithubActionsHost {
    fn notice(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not abort the run.
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }

    fn set_output(&self, name: &str, value: &str) -> Result<(), HostError> {
        let host_error = |e: std::io::Error| HostError {
            name: name.to_string(),
            message: e.to_string(),
        };

        match &self.target {
            OutputTarget::File(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(host_error)?;
                file.write_all(output_file_entry(name, value).as_bytes())
                    .map_err(host_error)?;
                debug!(name, path = %path.display(), "wrote step output");
            }
            OutputTarget::WorkflowCommand => {
                let mut stdout = std::io::stdout().lock();
                writeln!(
                    stdout,
                    "::set-output name={name}::{}",
                    escape_command_data(value)
                )
                .map_err(host_error)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_entry() {
        assert_eq!(output_file_entry("state", "passed"), "state=passed\n");
    }

    #[test]
    fn multi_line_entry_uses_heredoc() {
        let entry = output_file_entry("data", "a\nb");
        let lines: Vec<_> = entry.lines().collect();

        assert!(lines[0].starts_with("data<<ghadelimiter_"));
        let delimiter = lines[0].trim_start_matches("data<<");
        assert_eq!(lines[1..], ["a", "b", delimiter]);
    }

    #[test]
    fn command_data_is_percent_encoded() {
        assert_eq!(escape_command_data("passed"), "passed");
        assert_eq!(
            escape_command_data("401 Unauthorized\r\n{\"message\":\"100% bad\"}"),
            "401 Unauthorized%0D%0A{\"message\":\"100%25 bad\"}"
        );
    }

    #[test]
    fn command_data_escapes_percent_before_newlines() {
        assert_eq!(escape_command_data("%0A\n"), "%250A%0A");
    }

    #[test]
    fn host_picks_target_from_path() {
        assert_eq!(
            GithubActionsHost::from_output_path(None).target(),
            &OutputTarget::WorkflowCommand
        );
        assert_eq!(
            GithubActionsHost::from_output_path(Some(PathBuf::from("/tmp/out"))).target(),
            &OutputTarget::File(PathBuf::from("/tmp/out"))
        );
    }
}
