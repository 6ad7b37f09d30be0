//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request passes through:
//!     → logging.rs (one structured record per request)
//!     → metrics.rs (counter, duration histogram, in-flight gauge)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON in release mode)
//!     → Metrics endpoint (Prometheus scrape of the injected registry)
//! ```
//!
//! # Design Decisions
//! - The metrics registry is dependency-injected, never a global
//! - Log severity is derived from the final response status
//! - Instrument updates are atomic; middleware holds no locks

pub mod logging;
pub mod metrics;
