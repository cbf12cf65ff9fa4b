//! Authenticated request execution for M-Pesa resource endpoints
//!
//! Wraps every outbound call with the current bearer token and decides, per
//! response, whether to return, retry with backoff, re-authenticate once or
//! fail.
//!
//! Call lifecycle:
//! 1. `Executor::execute` fetches a token from `CredentialManager`
//! 2. Each exchange is classified by `classify::classify`
//! 3. `machine::handle_event` picks the next action from the outcome
//! 4. 401 → one `refresh_rejected` + immediate resend (budget untouched)
//! 5. 429/500/502/503/transport failure → sleep `base * 2^attempt`, resend
//! 6. Budget exhausted → `Error::Network`; other statuses → `Error::Http`

pub mod classify;
pub mod error;
pub mod executor;
pub mod machine;
pub mod retry;

pub use classify::{Outcome, RETRYABLE_STATUSES, RetryCause, classify};
pub use error::{Error, Result};
pub use executor::Executor;
pub use machine::{ExecAction, ExecEvent, ExecState, RetryState, handle_event};
pub use retry::{DEFAULT_BASE_BACKOFF, DEFAULT_MAX_RETRIES, RetryPolicy};
pub use mpesa_transport::Method;
