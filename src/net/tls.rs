//! TLS configuration and certificate loading.
//!
//! One certificate pair feeds both listeners: the TCP side through
//! axum-server's `RustlsConfig`, the QUIC side through a raw
//! `rustls::ServerConfig` with the h3 ALPN protocol.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

/// Errors loading or assembling TLS material. Startup-fatal for the
/// listener that hits them.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read TLS material: {0}")]
    Io(#[from] std::io::Error),
    #[error("no private key found in {0}")]
    MissingKey(String),
    #[error("TLS material rejected: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Load the certificate pair for the TCP+TLS listener.
pub async fn load_acceptor_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("certificate file not found: {}", cert_path.display()),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("private key file not found: {}", key_path.display()),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Build the rustls server config for the QUIC endpoint from the same
/// certificate pair, advertising HTTP/3 via ALPN.
pub fn load_quic_config(cert_path: &Path, key_path: &Path) -> Result<Arc<rustls::ServerConfig>, TlsError> {
    let certs = read_certs(cert_path)?;
    let key = read_private_key(key_path)?;

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h3".to_vec()];

    Ok(Arc::new(config))
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    Ok(certs)
}

fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| TlsError::MissingKey(path.display().to_string()))
}
