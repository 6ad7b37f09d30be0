//! Environment-resolved server configuration.
//!
//! Configuration is read once at startup and never reloaded. All options
//! have defaults so the server starts with an empty environment:
//!
//! - `RUN_MODE`: `release` (default) or `debug`; selects the log format.
//! - `PORT`: listen port, default `8080`.
//! - `TLS_CERT_FILE` / `TLS_KEY_FILE`: TLS is enabled only when both are
//!   set. A half-configured pair is ignored with a warning.
//! - `HTTP3_ENABLED`: the literal string `false` disables the HTTP/3
//!   listener; anything else leaves it enabled.

use std::num::ParseIntError;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;

/// Deployment mode. Controls the log output format only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// JSON logs for machine ingestion.
    Release,
    /// Human-readable logs.
    Debug,
}

/// TLS material for the listener, as file paths to PEM-encoded data.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Immutable configuration snapshot resolved at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub mode: Mode,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    pub http3_enabled: bool,
}

/// Error type for configuration resolution. Any variant is startup-fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT value `{value}`: {source}")]
    InvalidPort {
        value: String,
        source: ParseIntError,
    },
}

impl ServerConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    ///
    /// Seam for tests: pass a closure over a map instead of mutating the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match lookup("RUN_MODE").as_deref() {
            Some("debug") => Mode::Debug,
            _ => Mode::Release,
        };

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let tls = match (lookup("TLS_CERT_FILE"), lookup("TLS_KEY_FILE")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "TLS_CERT_FILE and TLS_KEY_FILE must both be set; serving plain HTTP"
                );
                None
            }
            (None, None) => None,
        };

        let http3_enabled = lookup("HTTP3_ENABLED").as_deref() != Some("false");

        Ok(Self {
            mode,
            port,
            tls,
            http3_enabled,
        })
    }

    /// Whether the HTTP/3 listener should be started alongside the primary
    /// transport. HTTP/3 requires the TLS certificate pair.
    pub fn serves_http3(&self) -> bool {
        self.tls.is_some() && self.http3_enabled
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Release,
            port: DEFAULT_PORT,
            tls: None,
            http3_enabled: true,
        }
    }
}
