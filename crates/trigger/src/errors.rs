//! Error types for the trigger domain.
//!
//! [`TriggerError`] covers every condition that ends a run early. The two
//! port-level errors, [`TransportError`] and [`HostError`], are produced by
//! infrastructure implementations of [`crate::ports`] and wrapped into
//! [`TriggerError`] at the domain boundary.
//!
//! None of these conditions is retried internally: the run fails fast and the
//! invoking workflow decides whether to re-run.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// Failure to obtain a build descriptor from a [`crate::BuildTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within the per-call timeout.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL of the request.
        url: String,
        /// The per-call timeout that elapsed.
        timeout: Duration,
    },

    /// The connection failed before a response was received.
    #[error("Request to {url} failed: {message}")]
    Network {
        /// Target URL of the request.
        url: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The remote API answered with a non-2xx status.
    #[error("Request to {url} returned HTTP {status}: {body}")]
    Status {
        /// Target URL of the request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body text, kept for diagnosis.
        body: String,
    },

    /// The response body was not a valid build descriptor.
    #[error("Could not decode response from {url}: {message}")]
    Decode {
        /// Target URL (or fixture path) the body came from.
        url: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// A canned response could not be read in offline mode.
    #[error("Could not read fixture {path}: {message}")]
    Fixture {
        /// Fixture file path.
        path: String,
        /// Description of the I/O failure.
        message: String,
    },
}

/// Failure to publish an output to the automation host.
#[derive(Debug, Error)]
#[error("Could not write output '{name}': {message}")]
pub struct HostError {
    /// Name of the output being written.
    pub name: String,
    /// Description of the underlying failure.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that end a trigger run.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// A required input is missing or malformed.
    ///
    /// Produced while resolving the invocation context; no network call has
    /// been made yet.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The trigger or a poll request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Writing outputs to the automation host failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The optional wait ceiling elapsed before the build finished.
    #[error("Build did not finish within {limit:?}")]
    WaitTimedOut {
        /// The configured ceiling.
        limit: Duration,
    },

    /// The build reached a state outside the accepted set.
    ///
    /// Outputs have already been written when this is returned.
    #[error("Pipeline failed with state '{state}'")]
    PipelineFailed {
        /// The offending remote state string.
        state: String,
    },
}

impl TriggerError {
    /// Shorthand for a [`TriggerError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
