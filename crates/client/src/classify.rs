//! Response classification
//!
//! Maps the result of one exchange to what the executor should do next.
//! 2xx is success, 401 asks for re-authentication, 429/500/502/503 and every
//! transport failure are retryable, any other status is terminal.

use mpesa_transport::{HttpResponse, TransportError};

/// Statuses retried with backoff.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503];

/// Why an attempt may be repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    Transport(TransportError),
    Status { status: u16, body: String },
}

impl RetryCause {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RetryCause::Transport(TransportError::Timeout(_)) => "timeout",
            RetryCause::Transport(_) => "transport",
            RetryCause::Status { status: 429, .. } => "rate_limited",
            RetryCause::Status { .. } => "server_error",
        }
    }
}

/// Classification of one raw response or transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx: the body, untouched.
    Success(String),
    Retryable(RetryCause),
    /// Non-retryable status other than 401.
    Terminal { status: u16, body: String },
    /// 401 from a resource endpoint.
    AuthRejected(String),
}

/// Classify an exchange. Pure function: no I/O.
pub fn classify(result: Result<HttpResponse, TransportError>) -> Outcome {
    match result {
        Err(err) => Outcome::Retryable(RetryCause::Transport(err)),
        Ok(response) if response.is_success() => Outcome::Success(response.body),
        Ok(HttpResponse { status: 401, body }) => Outcome::AuthRejected(body),
        Ok(HttpResponse { status, body }) if RETRYABLE_STATUSES.contains(&status) => {
            Outcome::Retryable(RetryCause::Status { status, body })
        }
        Ok(HttpResponse { status, body }) => Outcome::Terminal { status, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> Outcome {
        classify(Ok(HttpResponse::new(code, body)))
    }

    #[test]
    fn success_keeps_body_verbatim() {
        let body = "{ \"ResponseCode\" : \"0\" ,\n \"x\":1 }  ";
        assert_eq!(status(200, body), Outcome::Success(body.into()));
        assert_eq!(status(204, ""), Outcome::Success(String::new()));
    }

    #[test]
    fn unauthorized_requests_reauth() {
        assert_eq!(
            status(401, "expired"),
            Outcome::AuthRejected("expired".into())
        );
    }

    #[test]
    fn retryable_statuses() {
        for code in [429, 500, 502, 503] {
            assert!(
                matches!(status(code, ""), Outcome::Retryable(RetryCause::Status { status, .. }) if status == code),
                "{code} should be retryable"
            );
        }
    }

    #[test]
    fn other_statuses_are_terminal() {
        for code in [400, 403, 404, 408, 409, 418, 501, 504] {
            assert!(
                matches!(status(code, "x"), Outcome::Terminal { status, .. } if status == code),
                "{code} should be terminal"
            );
        }
    }

    #[test]
    fn transport_errors_are_retryable() {
        let outcome = classify(Err(TransportError::Timeout("read".into())));
        assert_eq!(
            outcome,
            Outcome::Retryable(RetryCause::Transport(TransportError::Timeout(
                "read".into()
            )))
        );
    }

    #[test]
    fn retry_reasons() {
        assert_eq!(
            RetryCause::Transport(TransportError::Timeout(String::new())).reason(),
            "timeout"
        );
        assert_eq!(
            RetryCause::Transport(TransportError::Connect(String::new())).reason(),
            "transport"
        );
        assert_eq!(
            RetryCause::Status {
                status: 429,
                body: String::new()
            }
            .reason(),
            "rate_limited"
        );
        assert_eq!(
            RetryCause::Status {
                status: 503,
                body: String::new()
            }
            .reason(),
            "server_error"
        );
    }
}
