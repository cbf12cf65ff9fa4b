//! M-Pesa credential management
//!
//! Exchanges consumer key/secret for a short-lived bearer token and caches it
//! until expiry. This crate only talks to the token endpoint; resource calls,
//! retries and 401 handling live in `mpesa-client`.
//!
//! Credential flow:
//! 1. `CredentialManager::current_token()` returns the cached token while
//!    `now < expires_at`
//! 2. Otherwise it calls `token::request_token()` under the cache lock
//! 3. On a resource 401 the executor calls `refresh_rejected()` once
//! 4. Self-tests call `refresh()` directly

pub mod clock;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use constants::*;
pub use credentials::{Credential, CredentialManager};
pub use error::{Error, Result};
pub use token::{TokenResponse, request_token};
