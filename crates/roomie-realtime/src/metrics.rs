//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently open
    pub connections_active: AtomicU64,
    /// Total frames received
    pub messages_received: AtomicU64,
    /// Total accepted announces
    pub announces: AtomicU64,
    /// Chat events handed to a recipient
    pub relays_delivered: AtomicU64,
    /// Chat events dropped (offline recipient or full queue)
    pub relays_dropped: AtomicU64,
    /// Frames answered with an error event
    pub protocol_errors: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn inc_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_announces(&self) {
        self.announces.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivered(&self) {
        self.relays_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.relays_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_protocol_errors(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            announces: self.announces.load(Ordering::Relaxed),
            relays_delivered: self.relays_delivered.load(Ordering::Relaxed),
            relays_dropped: self.relays_dropped.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub messages_received: u64,
    pub announces: u64,
    pub relays_delivered: u64,
    pub relays_dropped: u64,
    pub protocol_errors: u64,
}
