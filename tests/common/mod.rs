//! Shared utilities for integration testing.
//!
//! Tests drive the fully wrapped router in-process with
//! `tower::ServiceExt::oneshot`; nothing binds a real socket unless a test
//! exercises the listeners themselves.

// Each integration test crate compiles its own copy of this module and
// uses a different subset of the helpers.
#![allow(dead_code)]

use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, Response, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use prometheus::Registry;
use rampart::health::{always_ready, ReadyCheck};
use rampart::{ErrorTrail, Server, ServerConfig};
use tower::ServiceExt;

/// Application routes exercising each failure mode the shell must handle.
pub fn app_routes() -> Router {
    Router::new()
        .route("/widgets", get(|| async { "widgets" }))
        .route("/boom", get(boom))
        .route("/boom/twice", get(boom_twice))
        .route("/panic", get(|| async { panic!("kaboom") }))
}

async fn boom(Extension(trail): Extension<ErrorTrail>) -> StatusCode {
    trail.record("boom");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn boom_twice(Extension(trail): Extension<ErrorTrail>) -> StatusCode {
    trail.record("first failure");
    trail.record("second failure");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// A server with the default configuration wrapped around [`app_routes`].
pub fn test_server() -> Server {
    Server::new(ServerConfig::default(), app_routes(), always_ready())
        .expect("server construction")
}

pub fn test_server_with_readiness(readiness: ReadyCheck) -> Server {
    Server::new(ServerConfig::default(), app_routes(), readiness)
        .expect("server construction")
}

/// Drive one request through the server's chain.
pub async fn send(server: &Server, method: &str, path: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("request construction");
    server
        .router()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collection")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Current value of the in-flight gauge in `registry`.
pub fn gauge_value(registry: &Registry) -> f64 {
    registry
        .gather()
        .iter()
        .find(|family| family.get_name() == "http_in_flight_requests")
        .map(|family| family.get_metric()[0].get_gauge().get_value())
        .unwrap_or_default()
}

/// Value of the request counter for an exact label set, if recorded.
pub fn counter_value(registry: &Registry, labels: &[(&str, &str)]) -> Option<f64> {
    let families = registry.gather();
    let family = families
        .iter()
        .find(|family| family.get_name() == "http_requests_total")?;

    family
        .get_metric()
        .iter()
        .find(|metric| {
            labels.iter().all(|(name, value)| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
            })
        })
        .map(|metric| metric.get_counter().get_value())
}
