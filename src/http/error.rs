//! Uniform error surfacing for request handling.
//!
//! Handlers record failures on the request's [`ErrorTrail`] instead of
//! hand-rolling error responses. The capture middleware turns any recorded
//! error into one JSON envelope, and panic recovery funnels through the
//! same envelope shape, so clients see a single error format regardless of
//! how the handler failed.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

/// Ordered per-request error sequence.
///
/// A cheap clonable handle: the capture middleware inserts one clone into
/// the request extensions for handlers to record into, keeps another to
/// inspect after the handler returns, and attaches it to the response
/// extensions so the logging middleware can read it. Never shared across
/// requests.
#[derive(Clone, Default)]
pub struct ErrorTrail {
    errors: Arc<Mutex<Vec<String>>>,
}

impl ErrorTrail {
    /// Append an error to the trail.
    pub fn record(&self, err: impl fmt::Display) {
        self.lock().push(err.to_string());
    }

    /// The message of the last recorded error, if any. Later errors shadow
    /// earlier ones for the user-facing envelope.
    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All recorded errors joined for the request log record. Empty string
    /// when the request saw no errors.
    pub fn render(&self) -> String {
        self.lock().join("; ")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A poisoned trail only means a handler panicked mid-record; the
        // errors collected so far are still worth surfacing.
        self.errors.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl fmt::Debug for ErrorTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTrail")
            .field("errors", &*self.lock())
            .finish()
    }
}

/// The uniform JSON error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub error: String,
}

/// Middleware that owns the request's error trail.
///
/// Sits closest to the business handler so that the override below is the
/// status every outer layer (metrics, logging) observes. When the trail is
/// empty the downstream response passes through untouched.
pub async fn capture_errors(mut request: Request, next: Next) -> Response {
    let trail = ErrorTrail::default();
    request.extensions_mut().insert(trail.clone());

    let response = next.run(request).await;

    let mut response = match trail.last() {
        Some(message) => {
            let envelope = ErrorEnvelope {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                error: message,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response()
        }
        None => response,
    };

    response.extensions_mut().insert(trail);
    response
}

/// Convert a caught panic into the uniform 500 envelope.
///
/// Installed with `CatchPanicLayer::custom` as the outermost stage; the
/// panic payload is logged here and never reaches the client.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> axum::http::Response<Full<Bytes>> {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "request handler panicked");

    let envelope = ErrorEnvelope {
        status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        error: "internal server error".to_string(),
    };
    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec());

    axum::http::Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::from(body))
        .expect("static 500 response is always valid")
}
