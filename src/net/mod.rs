//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! TCP listener (primary, blocking):
//!     plain  → axum::serve
//!     TLS    → axum-server with tls.rs material
//!
//! UDP listener (secondary, detached):
//!     http3.rs → quinn endpoint → h3 request plumbing → shared Router
//! ```
//!
//! # Design Decisions
//! - Both listeners are fed the same Router; instrumentation is
//!   transport-independent
//! - One certificate pair serves TLS and QUIC
//! - The secondary listener's failure never cascades to the primary

pub mod http3;
pub mod tls;
