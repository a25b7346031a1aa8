//! Route modules for the Greeks server
//!
//! This module contains endpoint group-specific routers:
//! - greeks: Greeks and implied volatility over the instrument universe
//! - health: Health check and readiness endpoints

pub mod greeks;
pub mod health;

use axum::Router;
use greeks_pipeline::GreeksPipeline;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// The request pipeline, shared by every request
    pub pipeline: GreeksPipeline,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<ServerConfig>, pipeline: GreeksPipeline) -> Self {
        Self {
            config,
            pipeline,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(config: Arc<ServerConfig>, pipeline: GreeksPipeline) -> Router {
    let state = AppState::new(config, pipeline);

    Router::new()
        .merge(health::routes())
        .merge(greeks::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
