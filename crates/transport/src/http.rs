//! reqwest-backed transport
//!
//! Connect and read timeouts map directly onto the reqwest client. reqwest
//! has no separate write timeout, so the write budget is folded into the
//! overall per-request deadline (`connect + read + write`).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

/// Timeouts applied to every exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(5_000),
            read_timeout: Duration::from_millis(15_000),
            write_timeout: Duration::from_millis(10_000),
        }
    }
}

impl TransportConfig {
    /// Upper bound for a whole exchange.
    pub fn total_timeout(&self) -> Duration {
        self.connect_timeout + self.read_timeout + self.write_timeout
    }
}

/// Production transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with the configured timeouts.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.total_timeout())
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (caller owns its timeout configuration).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let mut builder = self.client.request(method, &url).headers(headers);
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(map_send_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(map_body_error)?;

            debug!(url = %url, status, body_len = body.len(), "exchange completed");
            Ok(HttpResponse { status, body })
        })
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

fn map_body_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Body(e.to_string())
    }
}
