//! Error types for authenticated request execution

use mpesa_transport::TransportError;

/// Errors from `Executor::execute`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials rejected by the token endpoint, or a resource call
    /// answered 401 again after one re-authentication.
    #[error("authentication failed: {message}")]
    Authentication { message: String, body: String },

    /// Transport failure or retryable status that outlived the retry budget,
    /// or a transport failure during token refresh.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// Token endpoint answered with something that is not a token.
    #[error("unexpected response: {message}")]
    UnexpectedResponse {
        message: String,
        body: Option<String>,
    },

    /// Non-retryable, non-401 status from a resource endpoint. Callers map
    /// this into their own error kinds by status and body.
    #[error("HTTP {status} from provider")]
    Http { status: u16, body: String },

    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The retry state machine received an event it has no transition for.
    #[error("invalid executor transition: {0}")]
    InvalidTransition(String),
}

impl From<mpesa_auth::Error> for Error {
    fn from(err: mpesa_auth::Error) -> Self {
        match err {
            mpesa_auth::Error::Authentication { message, body } => {
                Error::Authentication { message, body }
            }
            mpesa_auth::Error::UnexpectedResponse { message, body } => {
                Error::UnexpectedResponse { message, body }
            }
            mpesa_auth::Error::Network(source) => Error::Network {
                message: format!("token refresh failed: {source}"),
                source: Some(source),
            },
        }
    }
}

/// Result alias for executor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn auth_network_error_keeps_transport_source() {
        let err: Error =
            mpesa_auth::Error::Network(TransportError::Connect("refused".into())).into();
        match &err {
            Error::Network { source, .. } => {
                assert_eq!(source, &Some(TransportError::Connect("refused".into())));
            }
            other => panic!("expected Network, got {other:?}"),
        }
        assert!(err.source().is_some());
    }

    #[test]
    fn auth_rejection_stays_authentication() {
        let err: Error = mpesa_auth::Error::Authentication {
            message: "bad key".into(),
            body: "{}".into(),
        }
        .into();
        assert!(matches!(err, Error::Authentication { .. }));
    }
}
