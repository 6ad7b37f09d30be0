//! HTTP/3 secondary transport.
//!
//! A QUIC endpoint bound on the same port number as the TCP listener (UDP
//! side), serving the same router so every request passes through the
//! identical middleware chain regardless of transport. The bootstrap
//! spawns [`serve`] as a detached task: its terminal error is logged by
//! the caller and never cascades to the primary listener.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use bytes::{Buf, Bytes, BytesMut};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::config::TlsConfig;
use crate::net::tls;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that terminate the HTTP/3 listener before or while accepting.
#[derive(Debug, thiserror::Error)]
pub enum Http3Error {
    #[error(transparent)]
    Tls(#[from] tls::TlsError),
    #[error("QUIC-compatible cipher suites unavailable: {0}")]
    Crypto(#[from] quinn::crypto::rustls::NoInitialCipherSuite),
    #[error("failed to bind UDP endpoint: {0}")]
    Bind(#[from] std::io::Error),
}

/// Accept QUIC connections and serve HTTP/3 requests against `router`.
///
/// Blocks until the endpoint closes or binding fails; the caller decides
/// whether that is fatal (here: it never is, the task is fire-and-forget).
pub async fn serve(addr: SocketAddr, tls: TlsConfig, router: Router) -> Result<(), Http3Error> {
    let crypto = tls::load_quic_config(&tls.cert_path, &tls.key_path)?;
    let quic_config = quinn::crypto::rustls::QuicServerConfig::try_from(crypto)?;
    let server_config = quinn::ServerConfig::with_crypto(std::sync::Arc::new(quic_config));

    let endpoint = quinn::Endpoint::server(server_config, addr)?;
    tracing::info!(address = %addr, "HTTP/3 listener started");

    while let Some(incoming) = endpoint.accept().await {
        let router = router.clone();
        tokio::spawn(async move {
            match incoming.await {
                Ok(connection) => {
                    if let Err(err) = serve_connection(connection, router).await {
                        tracing::debug!(error = %err, "HTTP/3 connection closed with error");
                    }
                }
                Err(err) => tracing::debug!(error = %err, "QUIC handshake failed"),
            }
        });
    }

    tracing::info!("HTTP/3 endpoint closed");
    Ok(())
}

async fn serve_connection(connection: quinn::Connection, router: Router) -> Result<(), h3::Error> {
    let peer = connection.remote_address();
    let mut connection: h3::server::Connection<h3_quinn::Connection, Bytes> =
        h3::server::Connection::new(h3_quinn::Connection::new(connection)).await?;

    loop {
        match connection.accept().await {
            Ok(Some((request, stream))) => {
                let router = router.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_request(request, stream, router, peer).await {
                        tracing::debug!(error = %err, "HTTP/3 request failed");
                    }
                });
            }
            // Peer closed the connection.
            Ok(None) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

/// Decode one HTTP/3 request, dispatch it through the shared router, and
/// write the response back onto the stream.
async fn handle_request(
    request: Request<()>,
    mut stream: h3::server::RequestStream<h3_quinn::BidiStream<Bytes>, Bytes>,
    router: Router,
    peer: SocketAddr,
) -> Result<(), BoxError> {
    let mut body = BytesMut::new();
    while let Some(mut chunk) = stream.recv_data().await? {
        body.extend_from_slice(chunk.copy_to_bytes(chunk.remaining()).as_ref());
    }

    let (parts, ()) = request.into_parts();
    let mut request = Request::from_parts(parts, Body::from(body.freeze()));
    request.extensions_mut().insert(ConnectInfo(peer));

    let response = match router.oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    };

    let (parts, body) = response.into_parts();
    stream.send_response(Response::from_parts(parts, ())).await?;

    let payload = body.collect().await?.to_bytes();
    if !payload.is_empty() {
        stream.send_data(payload).await?;
    }
    stream.finish().await?;

    Ok(())
}
