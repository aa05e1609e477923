//! Connection manager: connection lifecycle, identity binding, and message routing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roomie_core::config::RealtimeConfig;
use roomie_core::types::{ConnectionId, UserId};

use crate::message::types::{InboundMessage, OutboundMessage};
use crate::message::validator;
use crate::metrics::RealtimeMetrics;
use crate::presence::registry::{AnnounceOutcome, PresenceRegistry};
use crate::relay::{ChatEvent, MessageRelay};

use super::handle::ConnectionHandle;
use super::heartbeat::HeartbeatConfig;
use super::pool::ConnectionPool;

/// Error codes carried by `error` events.
pub mod codes {
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const ALREADY_ANNOUNCED: &str = "ALREADY_ANNOUNCED";
    pub const NOT_ANNOUNCED: &str = "NOT_ANNOUNCED";
    pub const SENDER_MISMATCH: &str = "SENDER_MISMATCH";
}

/// Manages all active WebSocket connections and the identities bound to them.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: Arc<ConnectionPool>,
    /// Presence registry.
    registry: Arc<PresenceRegistry>,
    /// Chat relay.
    relay: MessageRelay,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        registry: Arc<PresenceRegistry>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        let pool = Arc::new(ConnectionPool::new());
        let relay = MessageRelay::new(registry.clone(), pool.clone(), metrics.clone());
        Self {
            pool,
            registry,
            relay,
            metrics,
            config,
        }
    }

    /// Registers a new, still anonymous connection.
    ///
    /// Returns the connection handle and a receiver for outbound frames.
    pub fn register(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx));

        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        info!(conn_id = %handle.id, "WebSocket connection registered");

        (handle, rx)
    }

    /// Unregisters a connection and forgets the identity it held.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.pool.remove(conn_id) else {
            return;
        };
        handle.mark_closed();
        self.metrics.connection_closed();

        match self.registry.forget(conn_id) {
            Some(user_id) => {
                info!(conn_id = %conn_id, user_id = %user_id, "User went offline");
                self.broadcast_online_users();
            }
            None => info!(conn_id = %conn_id, "WebSocket connection unregistered"),
        }
    }

    /// Processes an inbound text frame from a client.
    pub fn handle_inbound(&self, conn_id: &ConnectionId, raw_message: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };

        handle.touch();
        self.metrics.inc_received();

        if let Err(e) = validator::validate_frame(raw_message, &self.config) {
            self.reject(&handle, codes::VALIDATION_ERROR, e.message);
            return;
        }

        let msg: InboundMessage = match serde_json::from_str(raw_message) {
            Ok(m) => m,
            Err(e) => {
                self.reject(
                    &handle,
                    codes::INVALID_MESSAGE,
                    format!("Failed to parse message: {e}"),
                );
                return;
            }
        };

        match msg {
            InboundMessage::AnnounceIdentity { user_id } => self.handle_announce(&handle, user_id),
            InboundMessage::SendChatMessage {
                sender_id,
                receiver_id,
                text,
            } => self.handle_chat(
                &handle,
                ChatEvent {
                    sender_id,
                    receiver_id,
                    text,
                },
            ),
            InboundMessage::Pong { .. } => {}
        }
    }

    fn handle_announce(&self, handle: &ConnectionHandle, user_id: UserId) {
        if user_id.is_blank() {
            self.reject(handle, codes::VALIDATION_ERROR, "User ID is required");
            return;
        }

        if let Some(existing) = handle.identity() {
            if *existing != user_id {
                let message = format!("Connection already announced as {existing}");
                self.reject(handle, codes::ALREADY_ANNOUNCED, message);
                return;
            }
        }

        let outcome = self.registry.announce(user_id.clone(), handle.id);
        match &outcome {
            AnnounceOutcome::AlreadyPresent { current } => {
                debug!(
                    conn_id = %handle.id,
                    user_id = %user_id,
                    current = %current,
                    "Identity already online elsewhere, announce ignored"
                );
                return;
            }
            AnnounceOutcome::Replaced { previous } => {
                info!(
                    conn_id = %handle.id,
                    user_id = %user_id,
                    previous = %previous,
                    "Identity moved to a new connection"
                );
                // the displaced transport no longer carries the identity
                if let Some(stale) = self.pool.get(previous) {
                    stale.mark_closed();
                }
            }
            AnnounceOutcome::Registered => {
                info!(conn_id = %handle.id, user_id = %user_id, "User announced");
            }
            AnnounceOutcome::Unchanged => {}
        }

        if let Err(existing) = handle.bind_identity(user_id.clone()) {
            // another announce bound the connection first; restore its registry entry
            warn!(
                conn_id = %handle.id,
                user_id = %user_id,
                existing = %existing,
                "Connection bound to a different identity during announce"
            );
            self.registry.announce(existing.clone(), handle.id);
            self.broadcast_online_users();
            let message = format!("Connection already announced as {existing}");
            self.reject(handle, codes::ALREADY_ANNOUNCED, message);
            return;
        }
        if outcome.changed() {
            self.metrics.inc_announces();
            self.broadcast_online_users();
        }
    }

    fn handle_chat(&self, handle: &ConnectionHandle, event: ChatEvent) {
        if let Err(e) = validator::validate_chat(&event, &self.config) {
            self.reject(handle, codes::VALIDATION_ERROR, e.message);
            return;
        }

        match handle.identity() {
            None => {
                self.reject(handle, codes::NOT_ANNOUNCED, "Announce an identity before chatting");
            }
            Some(me) if *me != event.sender_id => {
                self.reject(handle, codes::SENDER_MISMATCH, "Sender does not match announced identity");
            }
            Some(_) => {
                let outcome = self.relay.relay(&event);
                debug!(conn_id = %handle.id, outcome = ?outcome, "Chat message relayed");
            }
        }
    }

    fn reject(&self, handle: &ConnectionHandle, code: &str, message: impl Into<String>) {
        let message = message.into();
        debug!(conn_id = %handle.id, code = code, message = %message, "Protocol error");
        self.metrics.inc_protocol_errors();
        handle.send(&OutboundMessage::error(code, message));
    }

    /// Sends the current online list to every connection.
    pub fn broadcast_online_users(&self) {
        let msg = OutboundMessage::OnlineUserListChanged {
            user_ids: self.registry.online_users(),
        };
        let frame = match msg.to_json() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Failed to serialize online list");
                return;
            }
        };

        for conn in self.pool.all_connections() {
            conn.send_raw(frame.clone());
        }
    }

    /// Closes all connections and clears the registry.
    pub fn close_all(&self) {
        let all = self.pool.drain();
        for conn in &all {
            conn.mark_closed();
            self.metrics.connection_closed();
        }
        self.registry.clear();
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns a connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Heartbeat timing for new connections.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from(&self.config)
    }

    /// Returns a reference to the chat relay.
    pub fn relay(&self) -> &MessageRelay {
        &self.relay
    }
}
