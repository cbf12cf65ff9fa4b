//! Transport abstraction for outbound provider calls
//!
//! Defines the `Transport` trait that decouples credential handling and retry
//! policy from the HTTP stack. `HttpTransport` is the reqwest-backed
//! implementation used in production; tests substitute scripted transports
//! so the retry and refresh logic runs without a network.
//!
//! A transport performs exactly one exchange per `send`. It never retries,
//! never classifies status codes and never touches credentials: a non-2xx
//! status is an `Ok(HttpResponse)`, only I/O-level failures are errors.

pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use http::{HttpTransport, TransportConfig};

use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub use reqwest::Method;
pub use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

/// One outbound request, fully built (headers and serialized body included).
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Serialized body. `None` sends an empty body.
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set (or replace) a header.
    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

/// Authorization values and bodies are kept out of the debug representation;
/// bodies may carry security credentials.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name == AUTHORIZATION {
                    (name.as_str(), "[REDACTED]")
                } else {
                    (name.as_str(), value.to_str().unwrap_or("<binary>"))
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(String::len))
            .finish()
    }
}

/// Raw status and body text of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// I/O-level failures. All variants are candidates for retry at the
/// executor level; a timeout is treated like any other transport failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// A single-exchange HTTP transport.
///
/// Uses a `Pin<Box<dyn Future>>` return type so it can be shared as
/// `Arc<dyn Transport>` between the credential manager and the executor.
pub trait Transport: Send + Sync {
    /// Perform one request/response exchange.
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;
}
