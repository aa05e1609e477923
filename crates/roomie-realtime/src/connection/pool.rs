//! Connection pool tracking every live transport session by connection ID.

use std::sync::Arc;

use dashmap::DashMap;

use roomie_core::types::ConnectionId;

use super::handle::ConnectionHandle;

/// Thread-safe pool of all active WebSocket connections.
///
/// Identity bookkeeping lives in the presence registry; the pool only knows
/// about transports, including anonymous ones that never announced.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Removes every connection, returning the removed handles.
    pub fn drain(&self) -> Vec<Arc<ConnectionHandle>> {
        let handles = self.all_connections();
        for handle in &handles {
            self.by_id.remove(&handle.id);
        }
        handles
    }
}
