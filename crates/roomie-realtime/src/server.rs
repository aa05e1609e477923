//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::info;

use roomie_core::config::RealtimeConfig;
use roomie_core::error::AppError;
use roomie_core::types::UserId;

use crate::connection::manager::ConnectionManager;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::presence::registry::PresenceRegistry;

/// Central real-time engine. Owns the presence registry for the lifetime of
/// the server; cloning shares the same state.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Presence registry.
    pub registry: Arc<PresenceRegistry>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
    /// Set once shutdown has begun.
    shutting_down: Arc<AtomicBool>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.connections.connection_count())
            .field("online", &self.registry.len())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RealtimeMetrics::new());
        let registry = Arc::new(PresenceRegistry::new(config.announce_policy));
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            registry.clone(),
            metrics.clone(),
        ));

        info!(policy = ?config.announce_policy, "Real-time engine initialized");

        Self {
            connections,
            registry,
            metrics,
            shutdown_tx,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Every online identity, sorted.
    pub fn online_users(&self) -> Vec<UserId> {
        self.registry.online_users()
    }

    /// Current metrics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Whether new connections should be refused.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("Shutting down real-time engine");

        self.shutting_down.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();

        info!("Real-time engine shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_signals_and_clears() {
        let engine = RealtimeEngine::new(RealtimeConfig::default());
        let mut shutdown = engine.shutdown_receiver();

        let (handle, _rx) = engine.connections.register();
        engine
            .connections
            .handle_inbound(&handle.id, r#"{"type":"announce_identity","user_id":"u1"}"#);
        assert_eq!(engine.online_users(), vec![UserId::new("u1")]);

        assert!(!engine.is_shutting_down());
        engine.shutdown().await.unwrap();
        assert!(engine.is_shutting_down());
        assert!(shutdown.recv().await.is_ok());
        assert!(engine.online_users().is_empty());
        assert_eq!(engine.connections.connection_count(), 0);
        assert!(!handle.is_alive());
    }
}
