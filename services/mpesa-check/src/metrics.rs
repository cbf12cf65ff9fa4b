//! Prometheus rendering of client counters
//!
//! The SDK emits through the `metrics` facade:
//!
//! - `mpesa_token_refresh_total` (counter): label `outcome`
//! - `mpesa_requests_total` (counter): label `outcome`
//! - `mpesa_request_retries_total` (counter): label `reason`
//! - `mpesa_reauth_total` (counter): token exchanges triggered by a 401

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
