//! Scripted in-memory transport for tests.
//!
//! Replays queued outcomes in order and records every request it receives
//! together with the (tokio) instant it arrived, so retry spacing can be
//! asserted under paused time.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

/// A request observed by `ScriptedTransport`.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request: HttpRequest,
    pub at: Instant,
}

impl SentRequest {
    /// Value of the Authorization header, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.request
            .headers
            .get(crate::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse>>>,
    fallback: Option<Result<HttpResponse>>,
    latency: Option<Duration>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    /// Queue a transport failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    /// Outcome used once the queue is empty.
    pub fn always(mut self, outcome: Result<HttpResponse>) -> Self {
        self.fallback = Some(outcome);
        self
    }

    /// Delay every exchange by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn push(self, outcome: Result<HttpResponse>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
        self
    }

    /// Number of exchanges performed so far.
    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of every request received, in order.
    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_outcome(&self) -> Result<HttpResponse> {
        let queued = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        queued.or_else(|| self.fallback.clone()).unwrap_or_else(|| {
            Err(TransportError::Request(
                "scripted transport has no outcome left".into(),
            ))
        })
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(SentRequest {
                    request,
                    at: Instant::now(),
                });
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.next_outcome()
        })
    }
}
