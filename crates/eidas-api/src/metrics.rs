//! # Metrics
//!
//! In-process counters using atomics: relay sessions and traffic, plus
//! HTTP request counts from a middleware. Reported by `GET /status`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

/// Relay counters shared by every session.
#[derive(Debug, Clone, Default)]
pub struct RelayMetrics {
    sessions_opened: Arc<AtomicU64>,
    sessions_active: Arc<AtomicU64>,
    frames_forwarded: Arc<AtomicU64>,
    commands_received: Arc<AtomicU64>,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn session_closed(&self) {
        self.sessions_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_forwarded(&self) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn command_received(&self) {
        self.commands_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Sessions accepted since the process started.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    /// Sessions currently open.
    pub fn sessions_active(&self) -> u64 {
        self.sessions_active.load(Ordering::Relaxed)
    }

    /// Signer lines sent to browsers.
    pub fn frames_forwarded(&self) -> u64 {
        self.frames_forwarded.load(Ordering::Relaxed)
    }

    /// Well-formed browser commands received.
    pub fn commands_received(&self) -> u64 {
        self.commands_received.load(Ordering::Relaxed)
    }
}

/// Static host counters.
#[derive(Debug, Clone, Default)]
pub struct HttpMetrics {
    requests: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, status: StatusCode) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() || status.is_server_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Requests answered by the static host.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Requests answered with a 4xx or 5xx status.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Record each response once it has been produced. A request is counted
/// after its handler runs, so `/status` never includes itself.
pub(crate) async fn count_requests(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    metrics.record(response.status());
    response
}
