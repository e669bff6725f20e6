//! Core domain for the Buildkite trigger.
//!
//! This crate contains the invocation context, the remote build descriptor,
//! the error taxonomy, and the trigger → wait → report flow. Infrastructure
//! crates implement the traits in [`ports`]; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PipelineSlug`, `BranchName`, `BuildNumber`, etc.) |
//! | [`types`] | Shared value types (`BuildDescriptor`, `BuildState`, `Author`, etc.) |
//! | [`errors`] | Run-level and port-level error types |
//! | [`context`] | Resolution of raw inputs into an [`InvocationContext`] |
//! | [`ports`] | Transport, clock and automation-host traits |
//! | [`runner`] | The trigger flow itself |
//! | [`fakes`] | In-memory port implementations for tests |

pub mod context;
pub mod errors;
pub mod fakes;
pub mod identifiers;
pub mod ports;
pub mod runner;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use context::{
    parse_extra_env, parse_flag, resolve_branch, EventDetails, InvocationContext, TriggerInputs,
};
pub use errors::{HostError, TransportError, TriggerError};
pub use identifiers::{
    AccessToken, BranchName, BuildId, BuildNumber, CommitSha, PipelineSlug, PullRequestNumber,
    RunId, BUILDKITE_API_BASE,
};
pub use ports::{ActionHost, ApiRequest, BuildTransport, Clock, HttpMethod, RequestPurpose};
pub use runner::{TriggerRunner, WaitPolicy};
pub use types::{
    Author, BuildDescriptor, BuildState, CreateBuildRequest, PullRequestInfo, Timestamp,
};
