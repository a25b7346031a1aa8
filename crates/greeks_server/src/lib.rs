//! HTTP service for the option Greeks dashboard
//!
//! Exposes the Greeks pipeline over REST: `GET /api/greeks` plus health and
//! readiness probes.

pub mod config;
pub mod routes;
pub mod server;

// Re-export the pipeline for embedding
pub use greeks_pipeline;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
