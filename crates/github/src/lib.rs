//! GitHub Actions host adapter.
//!
//! Everything the trigger needs from the workflow runner lives here:
//!
//! - [`ActionEnvironment`] snapshots the `INPUT_*` and `GITHUB_*` variables
//!   once at start-up and hands the domain a [`trigger::TriggerInputs`].
//! - [`read_event`] / [`parse_event`] extract the pusher identity and
//!   pull-request metadata from the webhook payload at `GITHUB_EVENT_PATH`.
//! - [`GithubActionsHost`] implements [`trigger::ActionHost`]: progress lines
//!   go to stdout, outputs go to the `GITHUB_OUTPUT` file (or the legacy
//!   `::set-output` workflow command when no file is provided).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Input
//! precedence and validation belong to [`trigger::InvocationContext::resolve`].

mod environment;
mod errors;
mod event;
mod host;

pub use environment::ActionEnvironment;
pub use errors::GithubError;
pub use event::{parse_event, read_event};
pub use host::{escape_command_data, GithubActionsHost, OutputTarget};
