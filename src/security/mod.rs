//! Security subsystem.
//!
//! # Design Decisions
//! - Response headers are hardened for every route, including fallbacks
//! - No trust in client input

pub mod headers;
