//! Kubernetes-style health probes.
//!
//! # Design Decisions
//! - Liveness answers "can this process serve HTTP" and nothing else
//! - Readiness delegates to a pluggable dependency check supplied by the
//!   embedding application; the default is always-ready
//! - A failed readiness check reports its reason in the response body

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Pluggable readiness check. Returns `Ok` when the service's dependencies
/// are reachable, or a human-readable reason when they are not.
pub type ReadyCheck =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

/// The default readiness check: no dependencies, always ready.
pub fn always_ready() -> ReadyCheck {
    Arc::new(|| Box::pin(async { Ok(()) }))
}

/// Build a [`ReadyCheck`] from an async closure.
pub fn ready_check<F, Fut>(check: F) -> ReadyCheck
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    Arc::new(move || Box::pin(check()))
}

/// `GET /healthz`: liveness probe. Constant-time, never consults state.
pub async fn liveness() -> &'static str {
    "OK"
}

/// `GET /readyz`: readiness probe. Delegates to the injected check.
pub async fn readiness(Extension(check): Extension<ReadyCheck>) -> Response {
    match check().await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(reason) => {
            tracing::warn!(reason = %reason, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {reason}")).into_response()
        }
    }
}
