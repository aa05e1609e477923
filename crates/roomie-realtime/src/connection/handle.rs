//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use roomie_core::types::{ConnectionId, UserId};

use crate::message::types::OutboundMessage;

/// Lifecycle of one connection: `Connected -> Announced -> Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "user_id", rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport is up, no identity announced yet.
    Connected,
    /// Transport is up and bound to an identity.
    Announced(UserId),
    /// Transport is gone; terminal.
    Disconnected,
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender channel for pushing serialized frames to the client
/// and the identity announced on it, which can be set at most once.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound text frames
    sender: mpsc::Sender<String>,
    /// Identity announced on this connection
    identity: OnceLock<UserId>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last inbound traffic
    last_activity: Mutex<Instant>,
    /// Whether the connection is still alive
    alive: AtomicBool,
    /// Cancelled when the server decides to drop the connection
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
            identity: OnceLock::new(),
            connected_at: Utc::now(),
            last_activity: Mutex::new(Instant::now()),
            alive: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    /// Queue a serialized frame. Never blocks; a full or closed queue drops it.
    pub fn send_raw(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Serialize and queue an outbound message.
    pub fn send(&self, msg: &OutboundMessage) -> bool {
        match msg.to_json() {
            Ok(frame) => self.send_raw(frame),
            Err(e) => {
                tracing::error!(conn_id = %self.id, error = %e, "Failed to serialize outbound message");
                false
            }
        }
    }

    /// Bind an identity. Returns the already-bound identity if it differs.
    pub fn bind_identity(&self, user_id: UserId) -> Result<(), UserId> {
        match self.identity.set(user_id.clone()) {
            Ok(()) => Ok(()),
            Err(_) => match self.identity.get() {
                Some(existing) if *existing == user_id => Ok(()),
                Some(existing) => Err(existing.clone()),
                None => Ok(()),
            },
        }
    }

    /// The announced identity, if any.
    pub fn identity(&self) -> Option<&UserId> {
        self.identity.get()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        if !self.is_alive() {
            return ConnectionState::Disconnected;
        }
        match self.identity.get() {
            Some(user_id) => ConnectionState::Announced(user_id.clone()),
            None => ConnectionState::Connected,
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection closed and wake whoever is driving its socket.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.closed.cancel();
    }

    /// Resolves once the connection has been closed server-side.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Update last activity timestamp
    pub fn touch(&self) {
        let mut last = self
            .last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Instant::now();
    }

    /// Time since the last inbound traffic.
    pub fn idle_for(&self) -> Duration {
        let last = self
            .last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        last.elapsed()
    }

    /// Get a snapshot of connection info
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            state: self.state(),
            connected_at: self.connected_at,
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Lifecycle state
    pub state: ConnectionState,
    /// Connected at
    pub connected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(tx);
        assert_eq!(handle.state(), ConnectionState::Connected);

        handle.bind_identity(UserId::new("u1")).unwrap();
        assert_eq!(handle.state(), ConnectionState::Announced(UserId::new("u1")));

        handle.mark_closed();
        assert_eq!(handle.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_identity_binds_once() {
        let (tx, _rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(tx);
        assert!(handle.bind_identity(UserId::new("u1")).is_ok());
        assert!(handle.bind_identity(UserId::new("u1")).is_ok());
        assert_eq!(
            handle.bind_identity(UserId::new("u2")),
            Err(UserId::new("u1"))
        );
        assert_eq!(handle.identity(), Some(&UserId::new("u1")));
    }

    #[test]
    fn test_send_drops_when_full_or_closed() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        assert!(handle.send_raw("a".to_string()));
        assert!(!handle.send_raw("b".to_string()));
        assert_eq!(rx.try_recv().unwrap(), "a");

        drop(rx);
        assert!(!handle.send_raw("c".to_string()));
        assert!(!handle.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tracking() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(handle.idle_for() >= Duration::from_secs(30));
        handle.touch();
        assert!(handle.idle_for() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_closed_resolves_after_mark_closed() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        handle.mark_closed();
        handle.closed().await;
    }
}
