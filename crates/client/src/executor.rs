//! Authenticated request executor
//!
//! Attaches the bearer token to each request, sends it through the shared
//! transport and drives the retry state machine until it returns or fails.
//! Backoff sleeps happen outside the credential lock; dropping the returned
//! future cancels the call between or during attempts.

use std::sync::Arc;

use mpesa_auth::CredentialManager;
use mpesa_common::Secret;
use mpesa_transport::{
    AUTHORIZATION, CONTENT_TYPE, HeaderValue, HttpRequest, Method, Transport,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::classify::classify;
use crate::error::{Error, Result};
use crate::machine::{ExecAction, ExecEvent, ExecState, RetryState, handle_event};
use crate::retry::RetryPolicy;

/// Executes authenticated calls against resource endpoints.
///
/// Cheap to share behind an `Arc`; every `execute` call keeps its own retry
/// bookkeeping and only the credential cache is shared.
pub struct Executor {
    credentials: Arc<CredentialManager>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Executor {
    pub fn new(
        credentials: Arc<CredentialManager>,
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            credentials,
            transport,
            policy,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `method url` with an optional pre-serialized JSON body and
    /// return the 2xx body text unmodified.
    #[instrument(skip_all, fields(method = %method, url = %log_url(url)))]
    pub async fn execute(&self, method: Method, url: &str, body: Option<String>) -> Result<String> {
        let mut token = self.credentials.current_token().await?;
        let mut state = ExecState::Sending(RetryState::default());
        let mut action = ExecAction::Send;

        loop {
            let event = match action {
                ExecAction::Send => {
                    let request = build_request(&method, url, body.as_deref(), &token)?;
                    debug!(
                        attempt = retry_attempt(&state),
                        body_len = body.as_ref().map(String::len),
                        "sending request"
                    );
                    ExecEvent::Sent(classify(self.transport.send(request).await))
                }
                ExecAction::Backoff { delay, cause } => {
                    warn!(
                        attempt = retry_attempt(&state),
                        reason = cause.reason(),
                        delay_ms = delay.as_millis() as u64,
                        "retrying after backoff"
                    );
                    metrics::counter!("mpesa_request_retries_total", "reason" => cause.reason())
                        .increment(1);
                    tokio::time::sleep(delay).await;
                    ExecEvent::BackoffElapsed
                }
                ExecAction::Reauthenticate => {
                    info!("resource rejected token, re-authenticating");
                    match self.credentials.refresh_rejected(&token).await {
                        Ok(fresh) => {
                            token = fresh;
                            ExecEvent::Reauthenticated
                        }
                        Err(e) => ExecEvent::ReauthFailed(e.into()),
                    }
                }
                ExecAction::Return(body) => {
                    debug!(body_len = body.len(), "request succeeded");
                    metrics::counter!("mpesa_requests_total", "outcome" => "success").increment(1);
                    return Ok(body);
                }
                ExecAction::Fail(err) => {
                    warn!(error = %err, "request failed");
                    metrics::counter!("mpesa_requests_total", "outcome" => outcome_label(&err))
                        .increment(1);
                    return Err(err);
                }
            };
            (state, action) = handle_event(state, event, &self.policy);
        }
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.execute(Method::GET, url, None).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<String> {
        let body = serde_json::to_string(body)?;
        self.execute(Method::POST, url, Some(body)).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<String> {
        let body = serde_json::to_string(body)?;
        self.execute(Method::PUT, url, Some(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<String> {
        self.execute(Method::DELETE, url, None).await
    }
}

/// URL without its query string, which may carry an api key.
fn log_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

fn build_request(
    method: &Method,
    url: &str,
    body: Option<&str>,
    token: &Secret<String>,
) -> Result<HttpRequest> {
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(|e| {
        Error::UnexpectedResponse {
            message: format!("access token is not a valid header value: {e}"),
            body: None,
        }
    })?;
    bearer.set_sensitive(true);

    let mut request = HttpRequest::new(method.clone(), url).with_header(AUTHORIZATION, bearer);
    if let Some(body) = body {
        request = request
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body.to_owned());
    }
    Ok(request)
}

fn retry_attempt(state: &ExecState) -> u32 {
    match state {
        ExecState::Sending(retry)
        | ExecState::ReauthPending(retry)
        | ExecState::AwaitingBackoff { retry, .. } => retry.attempt,
        ExecState::Done => 0,
    }
}

fn outcome_label(err: &Error) -> &'static str {
    match err {
        Error::Authentication { .. } => "authentication",
        Error::Network { .. } => "network",
        Error::UnexpectedResponse { .. } => "unexpected_response",
        Error::Http { .. } => "http_error",
        Error::Serialize(_) | Error::InvalidTransition(_) => "internal",
    }
}
