//! Error taxonomy surfaced to SDK callers

use std::fmt;

use mpesa_transport::TransportError;
use serde::Deserialize;

/// Provider-level classification of an unexpected response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The short code already has callback URLs registered
    ShortCodeRegistered,
    /// The response could not be understood
    InvalidResponse,
    /// The provider rejected the request parameters
    InvalidRequest,
    /// The initiator credentials were rejected
    InvalidInitiator,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ShortCodeRegistered => "SHORT_CODE_REGISTERED",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidInitiator => "INVALID_INITIATOR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload the provider sends on failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub request_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl ErrorResponse {
    /// Decode a body leniently: `None` when it is not a provider error payload.
    pub fn parse(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) if parsed != ErrorResponse::default() => Some(parsed),
            _ => None,
        }
    }
}

/// Errors returned by `Mpesa` operations.
#[derive(Debug, thiserror::Error)]
pub enum MpesaError {
    /// Request failed local validation; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client could not be constructed from its configuration.
    #[error(transparent)]
    Config(#[from] mpesa_common::Error),

    #[error("authentication failed: {message}")]
    Authentication { message: String, body: String },

    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// Non-2xx or unparseable response, classified by `code`.
    #[error("{message} [{code}]")]
    UnexpectedResponse {
        code: ErrorCode,
        message: String,
        status: Option<u16>,
        body: Option<String>,
        error_response: Option<ErrorResponse>,
    },
}

impl MpesaError {
    pub fn unexpected(
        code: ErrorCode,
        message: impl Into<String>,
        status: Option<u16>,
        body: Option<String>,
    ) -> Self {
        let error_response = body.as_deref().and_then(ErrorResponse::parse);
        MpesaError::UnexpectedResponse {
            code,
            message: message.into(),
            status,
            body,
            error_response,
        }
    }

    /// Error code, for unexpected-response errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            MpesaError::UnexpectedResponse { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Raw response body, when one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            MpesaError::Authentication { body, .. } => Some(body),
            MpesaError::UnexpectedResponse { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

impl From<mpesa_client::Error> for MpesaError {
    fn from(err: mpesa_client::Error) -> Self {
        match err {
            mpesa_client::Error::Authentication { message, body } => {
                MpesaError::Authentication { message, body }
            }
            mpesa_client::Error::Network { message, source } => {
                MpesaError::Network { message, source }
            }
            mpesa_client::Error::UnexpectedResponse { message, body } => {
                MpesaError::unexpected(ErrorCode::InvalidResponse, message, None, body)
            }
            mpesa_client::Error::Http { status, body } => MpesaError::unexpected(
                ErrorCode::UnknownError,
                format!("provider returned HTTP {status}"),
                Some(status),
                Some(body),
            ),
            mpesa_client::Error::Serialize(e) => {
                MpesaError::InvalidRequest(format!("request body could not be encoded: {e}"))
            }
            mpesa_client::Error::InvalidTransition(message) => {
                MpesaError::unexpected(ErrorCode::UnknownError, message, None, None)
            }
        }
    }
}

/// Result alias for SDK operations.
pub type Result<T> = std::result::Result<T, MpesaError>;
