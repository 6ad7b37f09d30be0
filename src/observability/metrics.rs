//! Request metrics: instrument registry, recording middleware, and the
//! Prometheus scrape handler.
//!
//! The registry is constructed by the bootstrap and shared via `Arc`,
//! never a process global, so tests run against isolated registries.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Extension, MatchedPath, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Histogram bucket boundaries for request duration, in seconds.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Label used for requests that matched no route. Raw paths never become
/// label values, which keeps the label space bounded.
const UNMATCHED_ROUTE: &str = "";

/// The three aggregate HTTP instruments and the registry that owns them.
pub struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    in_flight: IntGauge,
}

impl HttpMetrics {
    /// Create the instruments and register them with a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests."),
            &["method", "route", "status"],
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds.",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "route", "status"],
        )?;

        let in_flight = IntGauge::new(
            "http_in_flight_requests",
            "Number of requests currently being handled by the service.",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            in_flight,
        })
    }

    /// The underlying registry, for scraping or registering extra
    /// application instruments.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mark a request as in flight. The returned guard decrements the
    /// gauge when dropped, on every exit path.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.in_flight.inc();
        InFlightGuard {
            gauge: self.in_flight.clone(),
        }
    }

    fn record(&self, method: &str, route: &str, status: u16, elapsed_secs: f64) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, route, &status])
            .inc();
        self.request_duration
            .with_label_values(&[method, route, &status])
            .observe(elapsed_secs);
    }
}

/// Scoped in-flight marker. Dropping the guard decrements the gauge, so
/// the increment/decrement pairing holds even when the request future is
/// dropped mid-flight by panic recovery.
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Middleware that records the counter, duration histogram, and in-flight
/// gauge for every request.
///
/// The route label is the matched route pattern, not the raw path; requests
/// that matched no route share one placeholder label.
pub async fn track_requests(
    State(metrics): State<Arc<HttpMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let _in_flight = metrics.track_in_flight();
    let start = Instant::now();

    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let response = next.run(request).await;

    metrics.record(
        &method,
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// `GET /metrics`: Prometheus text exposition of the registry.
pub async fn scrape(Extension(metrics): Extension<Arc<HttpMetrics>>) -> Response {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(err) = encoder.encode(&metrics.registry().gather(), &mut buffer) {
        tracing::error!(error = %err, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        buffer,
    )
        .into_response()
}
