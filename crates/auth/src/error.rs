//! Error types for token acquisition

use mpesa_transport::TransportError;

/// Errors from the token endpoint. None of them are retried inside the
/// credential manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The endpoint rejected the consumer key/secret (HTTP 401).
    #[error("authentication failed: {message}")]
    Authentication { message: String, body: String },

    /// Missing, malformed or otherwise unusable token response.
    #[error("unexpected token response: {message}")]
    UnexpectedResponse {
        message: String,
        body: Option<String>,
    },

    #[error("network error contacting token endpoint: {0}")]
    Network(#[from] TransportError),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
