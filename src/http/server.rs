//! Server bootstrap: middleware chain construction and multi-transport
//! startup.
//!
//! # Responsibilities
//! - Wrap the application's routes in the instrumentation chain
//! - Register the health probes and the metrics scrape endpoint
//! - Decide which transports to start from the resolved configuration
//! - Start the detached HTTP/3 listener when TLS material is present
//! - Block on the primary TCP listener for the server lifetime
//!
//! # Chain order (outermost first)
//! ```text
//! panic recovery → request logging → security headers → metrics
//!     → error capture → application routes
//! ```
//! Error capture sits closest to the handlers so the 500 it writes is the
//! status metrics and logging observe.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::middleware;
use axum::routing::get;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::ServerConfig;
use crate::health::{self, ReadyCheck};
use crate::http::error;
use crate::net;
use crate::observability::{logging, metrics};
use crate::security;

/// Errors that abort startup or terminate the serving loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("metric registration failed: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("invalid Alt-Svc advertisement: {0}")]
    AltSvc(#[from] axum::http::header::InvalidHeaderValue),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The configured server, ready to listen.
///
/// `Unconfigured → Configured` happens in [`Server::new`]; [`Server::run`]
/// transitions to listening and only returns once the primary transport
/// has terminated.
pub struct Server {
    config: ServerConfig,
    router: Router,
    metrics: Arc<metrics::HttpMetrics>,
}

impl Server {
    /// Wrap the application's routes in the full chain. Any failure here
    /// is startup-fatal: no listener has been opened yet.
    pub fn new(
        config: ServerConfig,
        app: Router,
        readiness: ReadyCheck,
    ) -> Result<Self, ServerError> {
        let instruments = Arc::new(metrics::HttpMetrics::new()?);
        let router = build_router(app, instruments.clone(), readiness, &config)?;

        Ok(Self {
            config,
            router,
            metrics: instruments,
        })
    }

    /// The metric instruments backing `/metrics`. Lets the embedding
    /// application register its own collectors on the same registry.
    pub fn metrics(&self) -> Arc<metrics::HttpMetrics> {
        self.metrics.clone()
    }

    /// The fully wrapped router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Start listening. Blocks until the primary transport terminates;
    /// the terminal error is returned for the caller to report. The
    /// secondary HTTP/3 listener, when enabled, is spawned detached and is
    /// never joined; its failure is logged and does not end the process.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));

        match self.config.tls.clone() {
            Some(tls) => {
                let acceptor =
                    net::tls::load_acceptor_config(&tls.cert_path, &tls.key_path).await?;

                if self.config.http3_enabled {
                    let router = self.router.clone();
                    tokio::spawn(async move {
                        if let Err(err) = net::http3::serve(addr, tls, router).await {
                            tracing::error!(error = %err, "HTTP/3 listener terminated");
                        }
                    });
                } else {
                    tracing::info!("HTTP/3 listener disabled");
                }

                tracing::info!(address = %addr, "starting HTTPS server");
                axum_server::bind_rustls(addr, acceptor)
                    .serve(
                        self.router
                            .into_make_service_with_connect_info::<SocketAddr>(),
                    )
                    .await?;
            }
            None => {
                let listener = TcpListener::bind(addr).await?;
                tracing::info!(address = %addr, "starting HTTP server");
                axum::serve(
                    listener,
                    self.router
                        .into_make_service_with_connect_info::<SocketAddr>(),
                )
                .await?;
            }
        }

        Ok(())
    }
}

/// Assemble the route table and the middleware chain.
fn build_router(
    app: Router,
    instruments: Arc<metrics::HttpMetrics>,
    readiness: ReadyCheck,
    config: &ServerConfig,
) -> Result<Router, ServerError> {
    let router = app
        .route("/healthz", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .route("/metrics", get(metrics::scrape))
        .layer(Extension(readiness))
        .layer(Extension(instruments.clone()))
        .layer(middleware::from_fn(error::capture_errors))
        .layer(middleware::from_fn_with_state(
            instruments,
            metrics::track_requests,
        ))
        .layer(middleware::from_fn(security::headers::apply))
        .layer(middleware::from_fn(logging::log_requests));

    // Advertise the HTTP/3 endpoint on the TCP side so clients upgrade.
    let router = if config.serves_http3() {
        let advertisement =
            HeaderValue::from_str(&format!("h3=\":{}\"; ma=86400", config.port))?;
        router.layer(SetResponseHeaderLayer::if_not_present(
            header::ALT_SVC,
            advertisement,
        ))
    } else {
        router
    };

    Ok(router.layer(CatchPanicLayer::custom(error::handle_panic)))
}
