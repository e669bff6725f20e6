//! Buildkite REST API transport.
//!
//! Implements the [`trigger::BuildTransport`] trait twice:
//!
//! - [`HttpTransport`] talks to `api.buildkite.com` over HTTPS with `reqwest`.
//! - [`FixtureTransport`] serves canned JSON documents from a local directory
//!   and echoes each outgoing request, for offline runs.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, timeouts, status handling and response
//! decoding live here. The [`trigger`] crate sees only
//! [`trigger::BuildTransport`].

mod errors;
mod fixture;
mod http;

pub use errors::BuildkiteError;
pub use fixture::{echo_request, FixtureTransport, DEFAULT_FIXTURE_DIR};
pub use http::{HttpTransport, REQUEST_TIMEOUT, USER_AGENT};
