//! HTTP subsystem: the bootstrap and uniform error surfacing.
//!
//! # Data Flow
//! ```text
//! Application Router + ReadyCheck
//!     → server.rs (wrap in chain, register probes + /metrics)
//!     → transports (TCP, TLS, optional HTTP/3)
//!
//! Per request:
//!     handler records failures on error.rs's ErrorTrail
//!     → error capture rewrites the response to the JSON envelope
//!     → outer layers observe the final status
//! ```

pub mod error;
pub mod server;

pub use error::{ErrorEnvelope, ErrorTrail};
pub use server::{Server, ServerError};
