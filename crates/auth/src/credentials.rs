//! Cached bearer credential
//!
//! `CredentialManager` owns the one access token a client uses. The cached
//! value lives behind a tokio Mutex and every check-expiry → refresh → update
//! sequence runs inside that single critical section, so at most one token
//! exchange is in flight and every waiter observes the freshest token once
//! the lock is released.
//!
//! The token and its expiry are always replaced together. A failed refresh
//! leaves the previous value in place.

use std::sync::Arc;

use mpesa_common::Secret;
use mpesa_transport::Transport;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::token::request_token;

/// An access token together with its absolute expiry.
///
/// `expires_at` is a unix timestamp in milliseconds, computed at issue time
/// from the provider's `expires_in` (seconds delta).
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: Secret<String>,
    pub expires_at: u64,
}

impl Credential {
    pub fn issued(access_token: Secret<String>, issued_at: u64, expires_in_secs: u64) -> Self {
        Self {
            access_token,
            expires_at: issued_at.saturating_add(expires_in_secs.saturating_mul(1000)),
        }
    }

    /// Valid iff `now < expires_at`.
    pub fn is_valid_at(&self, now_millis: u64) -> bool {
        now_millis < self.expires_at
    }
}

/// Obtains, caches and refreshes the bearer token for one set of consumer
/// credentials. Share it behind an `Arc`.
pub struct CredentialManager {
    token_url: String,
    consumer_key: Secret<String>,
    consumer_secret: Secret<String>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    /// `None` until the first successful refresh (treated as expired).
    cached: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(
        token_url: impl Into<String>,
        consumer_key: Secret<String>,
        consumer_secret: Secret<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::with_clock(
            token_url,
            consumer_key,
            consumer_secret,
            transport,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        token_url: impl Into<String>,
        consumer_key: Secret<String>,
        consumer_secret: Secret<String>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            consumer_key,
            consumer_secret,
            transport,
            clock,
            cached: Mutex::new(None),
        }
    }

    /// A token that was valid when this call observed it.
    ///
    /// Refreshes first when the cache is empty or `now >= expires_at`.
    pub async fn current_token(&self) -> Result<Secret<String>> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref() {
            if credential.is_valid_at(self.clock.now_millis()) {
                return Ok(credential.access_token.clone());
            }
            debug!("cached token expired, refreshing");
        } else {
            debug!("no cached token, refreshing");
        }
        self.refresh_locked(&mut cached).await
    }

    /// Unconditionally exchange the consumer credentials for a new token.
    ///
    /// Used by connectivity self-tests; the request path uses
    /// `refresh_rejected` instead.
    pub async fn refresh(&self) -> Result<()> {
        let mut cached = self.cached.lock().await;
        self.refresh_locked(&mut cached).await.map(|_| ())
    }

    /// Replace a token the server just rejected with 401.
    ///
    /// If another caller already swapped the cached token while this one
    /// waited for the lock, the newer token is returned without a second
    /// exchange.
    pub async fn refresh_rejected(&self, rejected: &Secret<String>) -> Result<Secret<String>> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref()
            && credential.access_token != *rejected
            && credential.is_valid_at(self.clock.now_millis())
        {
            debug!("token already replaced by a concurrent refresh");
            return Ok(credential.access_token.clone());
        }
        let fresh = self.refresh_locked(&mut cached).await?;
        metrics::counter!("mpesa_reauth_total").increment(1);
        Ok(fresh)
    }

    /// Expiry of the cached token in unix millis, if one is cached.
    pub async fn expires_at(&self) -> Option<u64> {
        self.cached.lock().await.as_ref().map(|c| c.expires_at)
    }

    async fn refresh_locked(&self, cached: &mut Option<Credential>) -> Result<Secret<String>> {
        let issued_at = self.clock.now_millis();
        let outcome = request_token(
            self.transport.as_ref(),
            &self.token_url,
            &self.consumer_key,
            &self.consumer_secret,
        )
        .await;

        match outcome {
            Ok(token) => {
                let credential = Credential::issued(token.access_token, issued_at, token.expires_in);
                info!(
                    expires_in = token.expires_in,
                    expires_at = credential.expires_at,
                    "access token refreshed"
                );
                metrics::counter!("mpesa_token_refresh_total", "outcome" => "success").increment(1);
                let access_token = credential.access_token.clone();
                *cached = Some(credential);
                Ok(access_token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                metrics::counter!("mpesa_token_refresh_total", "outcome" => "failure").increment(1);
                Err(e)
            }
        }
    }
}
