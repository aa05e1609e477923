//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use roomie_core::config::AppConfig;
use roomie_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Build state around a fresh engine.
    pub fn new(config: AppConfig) -> Self {
        let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
        Self::with_engine(config, realtime)
    }

    /// Build state around an existing engine.
    pub fn with_engine(config: AppConfig, realtime: Arc<RealtimeEngine>) -> Self {
        Self {
            config: Arc::new(config),
            realtime,
            started_at: Instant::now(),
        }
    }
}
