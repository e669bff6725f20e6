use thiserror::Error;

/// Errors raised while constructing a transport.
///
/// Per-request failures are reported as [`trigger::TransportError`] instead.
#[derive(Debug, Error)]
pub enum BuildkiteError {
    /// The underlying HTTP client could not be built (e.g. TLS backend
    /// initialisation failed).
    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
