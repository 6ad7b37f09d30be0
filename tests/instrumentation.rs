//! Request-lifecycle instrumentation tests: logging, metrics, error
//! surfacing, and the health probes.

mod common;

use axum::http::{header, StatusCode};
use rampart::health::ready_check;
use rampart::http::ErrorEnvelope;
use tracing_test::traced_test;

#[tokio::test]
async fn healthz_always_returns_ok() {
    // Liveness must not consult readiness state: pair it with a failing
    // readiness check.
    let server =
        common::test_server_with_readiness(ready_check(|| async {
            Err("database unreachable".to_string())
        }));

    let response = common::send(&server, "GET", "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "OK");
}

#[tokio::test]
async fn readyz_reports_success() {
    let server = common::test_server();

    let response = common::send(&server, "GET", "/readyz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "OK");
}

#[tokio::test]
async fn readyz_surfaces_failure_reason() {
    let server =
        common::test_server_with_readiness(ready_check(|| async {
            Err("database unreachable".to_string())
        }));

    let response = common::send(&server, "GET", "/readyz").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(common::body_string(response).await.contains("database unreachable"));
}

#[tokio::test]
async fn recorded_error_is_rewritten_to_the_envelope() {
    let server = common::test_server();

    let response = common::send(&server, "GET", "/boom").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let envelope: ErrorEnvelope =
        serde_json::from_str(&common::body_string(response).await).expect("envelope body");
    assert_eq!(
        envelope,
        ErrorEnvelope {
            status: 500,
            error: "boom".to_string(),
        }
    );
}

#[tokio::test]
async fn last_recorded_error_shadows_earlier_ones() {
    let server = common::test_server();

    let response = common::send(&server, "GET", "/boom/twice").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let envelope: ErrorEnvelope =
        serde_json::from_str(&common::body_string(response).await).expect("envelope body");
    assert_eq!(envelope.error, "second failure");
}

#[tokio::test]
async fn clean_responses_pass_through_unmodified() {
    let server = common::test_server();

    let response = common::send(&server, "GET", "/widgets").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "widgets");
}

#[tokio::test]
async fn panicking_handler_yields_500_and_serving_continues() {
    let server = common::test_server();

    let response = common::send(&server, "GET", "/panic").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The process keeps serving.
    let response = common::send(&server, "GET", "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn in_flight_gauge_returns_to_zero() {
    let server = common::test_server();
    let metrics = server.metrics();

    common::send(&server, "GET", "/widgets").await;
    assert_eq!(common::gauge_value(metrics.registry()), 0.0);

    common::send(&server, "GET", "/boom").await;
    assert_eq!(common::gauge_value(metrics.registry()), 0.0);
}

#[tokio::test]
async fn in_flight_gauge_survives_panics() {
    let server = common::test_server();
    let metrics = server.metrics();

    common::send(&server, "GET", "/panic").await;
    assert_eq!(common::gauge_value(metrics.registry()), 0.0);
}

#[tokio::test]
async fn counter_uses_matched_route_pattern() {
    let server = common::test_server();
    let metrics = server.metrics();

    common::send(&server, "GET", "/widgets").await;

    let count = common::counter_value(
        metrics.registry(),
        &[("method", "GET"), ("route", "/widgets"), ("status", "200")],
    );
    assert_eq!(count, Some(1.0));
}

#[tokio::test]
async fn unmatched_route_uses_the_placeholder_label() {
    let server = common::test_server();
    let metrics = server.metrics();

    let response = common::send(&server, "GET", "/not-a-route").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let count = common::counter_value(
        metrics.registry(),
        &[("method", "GET"), ("route", ""), ("status", "404")],
    );
    assert_eq!(count, Some(1.0), "unmatched routes must share one label");

    // The raw path never becomes a label value.
    let raw = common::counter_value(metrics.registry(), &[("route", "/not-a-route")]);
    assert_eq!(raw, None);
}

#[tokio::test]
async fn metrics_endpoint_exposes_the_three_instruments() {
    let server = common::test_server();

    common::send(&server, "GET", "/widgets").await;
    let response = common::send(&server, "GET", "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/plain; version=0.0.4")
    );

    let body = common::body_string(response).await;
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds"));
    assert!(body.contains("http_in_flight_requests"));
}

#[tokio::test]
async fn security_headers_are_stamped_on_every_response() {
    let server = common::test_server();

    for path in ["/widgets", "/boom", "/not-a-route"] {
        let response = common::send(&server, "GET", path).await;
        let headers = response.headers();
        assert_eq!(
            headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff",
            "{path}"
        );
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(header::REFERRER_POLICY).unwrap(), "no-referrer");
    }
}

#[traced_test]
#[tokio::test]
async fn each_request_emits_one_structured_record() {
    let server = common::test_server();

    let response = common::send(&server, "GET", "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(logs_contain("HTTP 200 (OK)"));
}

#[traced_test]
#[tokio::test]
async fn recorded_errors_reach_the_request_log() {
    let server = common::test_server();

    common::send(&server, "GET", "/boom").await;

    assert!(logs_contain("HTTP 500 (Internal Server Error)"));
    assert!(logs_contain("boom"));
}

#[traced_test]
#[tokio::test]
async fn panic_payload_is_logged() {
    let server = common::test_server();

    common::send(&server, "GET", "/panic").await;

    assert!(logs_contain("request handler panicked"));
    assert!(logs_contain("kaboom"));
}
