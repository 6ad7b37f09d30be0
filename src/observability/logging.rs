//! Structured request logging.
//!
//! One record per completed request, written to stdout through the global
//! `tracing` subscriber. The record's level is derived from the final
//! response status, so a handler error surfaced as a 500 is logged at
//! error level by the same code path that logs a routine 200 at info.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Mode;
use crate::http::error::ErrorTrail;

/// Install the global subscriber. Release mode emits JSON records for log
/// aggregation; debug mode emits a human-readable format.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(mode: Mode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    match mode {
        Mode::Release => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        Mode::Debug => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

/// Severity for a request log record, from the final response status.
fn level_for_status(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Middleware that emits exactly one structured record per request.
///
/// Runs outside the error-capture middleware, so the status it reads is
/// the one actually written to the client, and the error text covers every
/// error the downstream handling recorded.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_default();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    let error = response
        .extensions()
        .get::<ErrorTrail>()
        .map(ErrorTrail::render)
        .unwrap_or_default();

    // The emitting macro is selected by level; the record shape is
    // identical across the three.
    macro_rules! emit {
        ($macro:ident) => {
            tracing::$macro!(
                status = status.as_u16(),
                method = %method,
                path = %path,
                client_ip = %client_ip,
                duration = ?duration,
                error = %error,
                "HTTP {} ({})",
                status.as_u16(),
                status_text(status),
            )
        };
    }

    let level = level_for_status(status);
    if level == Level::ERROR {
        emit!(error);
    } else if level == Level::WARN {
        emit!(warn);
    } else {
        emit!(info);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_status_class() {
        assert_eq!(level_for_status(StatusCode::OK), Level::INFO);
        assert_eq!(level_for_status(StatusCode::NO_CONTENT), Level::INFO);
        assert_eq!(level_for_status(StatusCode::TEMPORARY_REDIRECT), Level::INFO);
        assert_eq!(level_for_status(StatusCode::BAD_REQUEST), Level::WARN);
        assert_eq!(level_for_status(StatusCode::NOT_FOUND), Level::WARN);
        assert_eq!(
            level_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            Level::ERROR
        );
        assert_eq!(level_for_status(StatusCode::BAD_GATEWAY), Level::ERROR);
    }

    #[test]
    fn status_text_uses_canonical_reason() {
        assert_eq!(status_text(StatusCode::OK), "OK");
        assert_eq!(status_text(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(
            status_text(StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
    }
}
