//! Request instrumentation middleware
//!
//! Every request moves through `START → IN_FLIGHT → outcome → DONE`:
//!
//! 1. START: take the start instant and derive the entity label from the path
//! 2. IN_FLIGHT: increment the global and per-entity in-flight gauges
//! 3. outcome: the handler runs; the id guard counts the conversion
//! 4. DONE: observe the elapsed time, decrement both gauges and count the
//!    response by status code and handler outcome
//!
//! DONE is driven by `InFlightGuard::drop`, so it also runs when the handler
//! panics or the request future is dropped (client went away).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};

use crate::metrics::Metrics;
use crate::shared::id::IdGuard;

/// Terminal state of a lookup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Found,
    NotFound,
    ParseError,
    Internal,
}

impl RequestOutcome {
    /// Fallback when a handler did not tag its response
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => RequestOutcome::Found,
            StatusCode::NOT_FOUND => RequestOutcome::NotFound,
            StatusCode::BAD_REQUEST => RequestOutcome::ParseError,
            _ => RequestOutcome::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Found => "found",
            RequestOutcome::NotFound => "not_found",
            RequestOutcome::ParseError => "parse_error",
            RequestOutcome::Internal => "internal",
        }
    }
}

/// Per-request instrumentation state
///
/// Inserted into request extensions so handlers can reach the metrics and
/// the entity label without recomputing it.
#[derive(Clone)]
pub struct RequestContext {
    metrics: Metrics,
    started: Instant,
    method: String,
    path: String,
    entity: String,
}

impl RequestContext {
    pub fn new(metrics: Metrics, method: &str, path: &str) -> Self {
        Self {
            metrics,
            started: Instant::now(),
            method: method_label(method).to_string(),
            path: path.to_string(),
            entity: extract_entity(path),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Request path as received, still percent-encoded
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Id conversion guard bound to this request's entity
    pub fn id_guard(&self) -> IdGuard<'_> {
        IdGuard::new(&self.metrics, &self.entity)
    }
}

/// Methods that keep their own `method` label value
const KNOWN_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "CONNECT", "TRACE",
];

/// Label value for a request method
///
/// Extension methods collapse into `"other"` so clients cannot mint series.
pub fn method_label(method: &str) -> &'static str {
    KNOWN_METHODS
        .iter()
        .find(|known| **known == method)
        .copied()
        .unwrap_or("other")
}

/// First path segment after the leading `/`
///
/// `/user/get/42` → `user`, `/` → empty. Any query string is ignored.
pub fn extract_entity(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').next().unwrap_or_default().to_string()
}

/// Holds the in-flight gauges up for the lifetime of a request
pub struct InFlightGuard {
    ctx: RequestContext,
    response: Option<(u16, RequestOutcome)>,
}

impl InFlightGuard {
    /// Increment the in-flight gauges (START → IN_FLIGHT)
    pub fn enter(ctx: RequestContext) -> Self {
        ctx.metrics.request_started(&ctx.entity);
        Self {
            ctx,
            response: None,
        }
    }

    /// Mark the request as answered; the gauges drop with `self`
    pub fn complete(mut self, status: StatusCode, outcome: RequestOutcome) {
        self.response = Some((status.as_u16(), outcome));
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let elapsed = self.ctx.elapsed();

        if self.response.is_none() {
            tracing::warn!(
                method = %self.ctx.method,
                entity = %self.ctx.entity,
                elapsed_ms = elapsed.as_millis() as u64,
                panicking = std::thread::panicking(),
                "Request ended without a response"
            );
        }

        self.ctx.metrics.request_finished(
            &self.ctx.method,
            &self.ctx.entity,
            elapsed,
            self.response
                .map(|(code, outcome)| (code, outcome.as_str())),
        );
    }
}

/// Middleware that instruments every request it wraps
///
/// Mount with `axum::middleware::from_fn_with_state(metrics, instrument_middleware)`.
pub async fn instrument_middleware(
    State(metrics): State<Metrics>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::new(metrics, request.method().as_str(), request.uri().path());
    request.extensions_mut().insert(ctx.clone());

    let method = ctx.method.clone();
    let entity = ctx.entity.clone();
    let guard = InFlightGuard::enter(ctx);

    let response = next.run(request).await;

    let status = response.status();
    let outcome = response
        .extensions()
        .get::<RequestOutcome>()
        .copied()
        .unwrap_or_else(|| RequestOutcome::from_status(status));

    tracing::debug!(
        method = %method,
        entity = %entity,
        status = status.as_u16(),
        outcome = outcome.as_str(),
        "Request completed"
    );

    guard.complete(status, outcome);
    response
}
