//! Retry state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! `Executor::execute` performs the I/O implied by each action (send, sleep,
//! refresh) and feeds the result back as the next event.
//!
//! ```text
//! Sending ──Success──────────────▶ Done (Return)
//!    │    ──Terminal─────────────▶ Done (Fail Http)
//!    │    ──AuthRejected, first──▶ ReauthPending ──Reauthenticated──▶ Sending
//!    │    ──AuthRejected, again──▶ Done (Fail Authentication)
//!    │    ──Retryable, budget────▶ AwaitingBackoff ──BackoffElapsed──▶ Sending
//!    └    ──Retryable, exhausted─▶ Done (Fail Network)
//! ```

use std::time::Duration;

use crate::classify::{Outcome, RetryCause};
use crate::error::Error;
use crate::retry::RetryPolicy;

/// Per-call retry bookkeeping. Never shared between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Zero-based index of the current attempt. Re-authentication resends do
    /// not advance it.
    pub attempt: u32,
    /// Set once the first 401 has triggered a refresh.
    pub used_reauth: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ExecState {
    /// A request is in flight
    Sending(RetryState),
    /// Sleeping before resending
    AwaitingBackoff { retry: RetryState, delay: Duration },
    /// Waiting for the credential manager to replace a rejected token
    ReauthPending(RetryState),
    /// Terminal state
    Done,
}

#[derive(Debug)]
pub enum ExecEvent {
    /// The in-flight exchange finished and was classified
    Sent(Outcome),
    /// Backoff sleep finished
    BackoffElapsed,
    /// A replacement token is available
    Reauthenticated,
    /// The credential manager could not produce a replacement token
    ReauthFailed(Error),
}

#[derive(Debug)]
pub enum ExecAction {
    /// Build the request with the current token and send it
    Send,
    /// Sleep, then report `BackoffElapsed`
    Backoff {
        delay: Duration,
        cause: RetryCause,
    },
    /// Replace the rejected token, then report `Reauthenticated`
    Reauthenticate,
    /// Return the body to the caller
    Return(String),
    /// Return the error to the caller
    Fail(Error),
}

/// Message for a 401 that survives one re-authentication.
pub const REJECTED_AFTER_REAUTH: &str = "failed to authenticate despite having a valid token";

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(
    state: ExecState,
    event: ExecEvent,
    policy: &RetryPolicy,
) -> (ExecState, ExecAction) {
    match (state, event) {
        // --- Sending ---
        (ExecState::Sending(_), ExecEvent::Sent(Outcome::Success(body))) => {
            (ExecState::Done, ExecAction::Return(body))
        }

        (ExecState::Sending(_), ExecEvent::Sent(Outcome::Terminal { status, body })) => {
            (ExecState::Done, ExecAction::Fail(Error::Http { status, body }))
        }

        (ExecState::Sending(retry), ExecEvent::Sent(Outcome::AuthRejected(_)))
            if !retry.used_reauth =>
        {
            (
                ExecState::ReauthPending(RetryState {
                    used_reauth: true,
                    ..retry
                }),
                ExecAction::Reauthenticate,
            )
        }

        (ExecState::Sending(_), ExecEvent::Sent(Outcome::AuthRejected(body))) => (
            ExecState::Done,
            ExecAction::Fail(Error::Authentication {
                message: REJECTED_AFTER_REAUTH.into(),
                body,
            }),
        ),

        (ExecState::Sending(retry), ExecEvent::Sent(Outcome::Retryable(cause)))
            if policy.allows_retry_after(retry.attempt) =>
        {
            let delay = policy.backoff(retry.attempt);
            (
                ExecState::AwaitingBackoff { retry, delay },
                ExecAction::Backoff { delay, cause },
            )
        }

        (ExecState::Sending(retry), ExecEvent::Sent(Outcome::Retryable(cause))) => {
            (ExecState::Done, ExecAction::Fail(exhausted(retry, cause)))
        }

        // --- AwaitingBackoff ---
        (ExecState::AwaitingBackoff { retry, .. }, ExecEvent::BackoffElapsed) => (
            ExecState::Sending(RetryState {
                attempt: retry.attempt + 1,
                ..retry
            }),
            ExecAction::Send,
        ),

        // --- ReauthPending ---
        (ExecState::ReauthPending(retry), ExecEvent::Reauthenticated) => {
            (ExecState::Sending(retry), ExecAction::Send)
        }

        (ExecState::ReauthPending(_), ExecEvent::ReauthFailed(err)) => {
            (ExecState::Done, ExecAction::Fail(err))
        }

        // --- Invalid transition: stop ---
        (state, event) => (
            ExecState::Done,
            ExecAction::Fail(Error::InvalidTransition(format!(
                "{event:?} in state {state:?}"
            ))),
        ),
    }
}

fn exhausted(retry: RetryState, cause: RetryCause) -> Error {
    let attempts = retry.attempt + 1;
    match cause {
        RetryCause::Transport(source) => Error::Network {
            message: format!("retries exhausted after {attempts} attempts: {source}"),
            source: Some(source),
        },
        RetryCause::Status { status, .. } => Error::Network {
            message: format!("retries exhausted after {attempts} attempts: last status {status}"),
            source: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpesa_transport::TransportError;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(500))
    }

    fn sending(attempt: u32, used_reauth: bool) -> ExecState {
        ExecState::Sending(RetryState {
            attempt,
            used_reauth,
        })
    }

    fn server_error() -> ExecEvent {
        ExecEvent::Sent(Outcome::Retryable(RetryCause::Status {
            status: 503,
            body: "busy".into(),
        }))
    }

    #[test]
    fn success_returns_body() {
        let (state, action) = handle_event(
            sending(0, false),
            ExecEvent::Sent(Outcome::Success("ok".into())),
            &policy(),
        );
        assert_eq!(state, ExecState::Done);
        assert!(matches!(action, ExecAction::Return(body) if body == "ok"));
    }

    #[test]
    fn terminal_status_fails_with_http_error() {
        let (state, action) = handle_event(
            sending(1, true),
            ExecEvent::Sent(Outcome::Terminal {
                status: 400,
                body: "bad".into(),
            }),
            &policy(),
        );
        assert_eq!(state, ExecState::Done);
        assert!(matches!(
            action,
            ExecAction::Fail(Error::Http { status: 400, .. })
        ));
    }

    #[test]
    fn first_401_reauthenticates_without_spending_an_attempt() {
        let (state, action) = handle_event(
            sending(2, false),
            ExecEvent::Sent(Outcome::AuthRejected(String::new())),
            &policy(),
        );
        assert_eq!(
            state,
            ExecState::ReauthPending(RetryState {
                attempt: 2,
                used_reauth: true
            })
        );
        assert!(matches!(action, ExecAction::Reauthenticate));

        let (state, action) = handle_event(state, ExecEvent::Reauthenticated, &policy());
        assert_eq!(state, sending(2, true));
        assert!(matches!(action, ExecAction::Send));
    }

    #[test]
    fn second_401_is_authentication_error() {
        let (state, action) = handle_event(
            sending(0, true),
            ExecEvent::Sent(Outcome::AuthRejected("nope".into())),
            &policy(),
        );
        assert_eq!(state, ExecState::Done);
        match action {
            ExecAction::Fail(Error::Authentication { message, body }) => {
                assert_eq!(message, REJECTED_AFTER_REAUTH);
                assert_eq!(body, "nope");
            }
            other => panic!("expected Authentication failure, got {other:?}"),
        }
    }

    #[test]
    fn failed_reauth_is_terminal() {
        let (state, action) = handle_event(
            ExecState::ReauthPending(RetryState {
                attempt: 0,
                used_reauth: true,
            }),
            ExecEvent::ReauthFailed(Error::Authentication {
                message: "bad key".into(),
                body: String::new(),
            }),
            &policy(),
        );
        assert_eq!(state, ExecState::Done);
        assert!(matches!(
            action,
            ExecAction::Fail(Error::Authentication { .. })
        ));
    }

    #[test]
    fn retryable_backs_off_then_advances_attempt() {
        let (state, action) = handle_event(sending(1, false), server_error(), &policy());
        assert!(matches!(
            action,
            ExecAction::Backoff { delay, .. } if delay == Duration::from_millis(1000)
        ));

        let (state, action) = handle_event(state, ExecEvent::BackoffElapsed, &policy());
        assert_eq!(state, sending(2, false));
        assert!(matches!(action, ExecAction::Send));
    }

    #[test]
    fn backoff_values_follow_attempt_index() {
        let expected = [500, 1000];
        for (attempt, &millis) in expected.iter().enumerate() {
            let (_, action) = handle_event(sending(attempt as u32, false), server_error(), &policy());
            match action {
                ExecAction::Backoff { delay, .. } => {
                    assert_eq!(delay, Duration::from_millis(millis), "attempt {attempt}");
                }
                other => panic!("unexpected action at attempt {attempt}: {other:?}"),
            }
        }
    }

    #[test]
    fn last_attempt_exhausts_budget() {
        let (state, action) = handle_event(
            sending(2, false),
            ExecEvent::Sent(Outcome::Retryable(RetryCause::Transport(
                TransportError::Connect("reset".into()),
            ))),
            &policy(),
        );
        assert_eq!(state, ExecState::Done);
        match action {
            ExecAction::Fail(Error::Network { message, source }) => {
                assert!(message.contains("3 attempts"), "got: {message}");
                assert_eq!(source, Some(TransportError::Connect("reset".into())));
            }
            other => panic!("expected Network failure, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_status_retries_have_no_transport_source() {
        let (_, action) = handle_event(sending(2, false), server_error(), &policy());
        assert!(matches!(
            action,
            ExecAction::Fail(Error::Network { source: None, .. })
        ));
    }

    #[test]
    fn unexpected_event_stops_machine() {
        let (state, action) = handle_event(ExecState::Done, ExecEvent::BackoffElapsed, &policy());
        assert_eq!(state, ExecState::Done);
        assert!(matches!(action, ExecAction::Fail(Error::InvalidTransition(_))));
    }
}
