//! rampart: production-hardening shell for axum services.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                     RAMPART                      │
//!                  │                                                  │
//!   Client ────────┼─▶ transports ──▶ instrumentation ──▶ app routes  │
//!                  │   (TCP / TLS /    (panic recovery,   (+ probes,  │
//!                  │    HTTP-3)         logging, security   /metrics) │
//!                  │                    headers, metrics,             │
//!                  │                    error capture)                │
//!                  │                                                  │
//!                  │  Cross-cutting: config (env), observability,     │
//!                  │  health checks, TLS material                     │
//!                  └──────────────────────────────────────────────────┘
//! ```
//!
//! The binary wires the shell around an empty application router; real
//! deployments embed [`rampart::Server`] and pass their own routes.

use axum::Router;

use rampart::http::Server;
use rampart::observability::logging;
use rampart::{health, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two rustls crypto backends are linked (quinn brings ring); fix the
    // process-wide provider before any TLS configuration is built.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = ServerConfig::from_env()?;
    logging::init(config.mode);

    tracing::info!(
        port = config.port,
        tls = config.tls.is_some(),
        http3 = config.serves_http3(),
        "configuration loaded"
    );

    let server = Server::new(config, Router::new(), health::always_ready())?;

    tracing::info!("starting HTTP server");
    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "server terminated");
        return Err(err.into());
    }

    Ok(())
}
