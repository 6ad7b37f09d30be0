//! Security response headers.
//!
//! # Responsibilities
//! - Stamp every response with baseline browser-hardening headers
//!
//! # Design Decisions
//! - Applied as a response-phase middleware so 404s and error responses
//!   carry the headers too
//! - Overwrites whatever a handler set; the baseline is not negotiable

use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

/// Middleware that sets the baseline security headers on every response.
pub async fn apply(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}
