//! Best-effort chat relay.
//!
//! A chat event is handed to the recipient's live connection at most once.
//! Offline recipients and full outbound queues drop the event silently;
//! durable storage of conversations is someone else's job.

use std::sync::Arc;

use roomie_core::types::{ConnectionId, UserId};

use crate::connection::pool::ConnectionPool;
use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;
use crate::presence::registry::PresenceRegistry;

/// One chat message in transit. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
}

/// What happened to a relayed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued on the recipient's connection.
    Delivered(ConnectionId),
    /// No connection is bound to the recipient.
    RecipientOffline,
    /// The recipient's connection is gone or its queue is full.
    DeliveryFailed,
}

/// Routes chat events to the connection registered for the recipient.
#[derive(Debug, Clone)]
pub struct MessageRelay {
    registry: Arc<PresenceRegistry>,
    pool: Arc<ConnectionPool>,
    metrics: Arc<RealtimeMetrics>,
}

impl MessageRelay {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        pool: Arc<ConnectionPool>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            registry,
            pool,
            metrics,
        }
    }

    /// Deliver `event` to the recipient's current connection, if any.
    pub fn relay(&self, event: &ChatEvent) -> RelayOutcome {
        let Some(conn_id) = self.registry.lookup(&event.receiver_id) else {
            tracing::debug!(
                sender = %event.sender_id,
                receiver = %event.receiver_id,
                "Recipient offline, dropping chat message"
            );
            self.metrics.inc_dropped();
            return RelayOutcome::RecipientOffline;
        };

        let Some(handle) = self.pool.get(&conn_id) else {
            self.metrics.inc_dropped();
            return RelayOutcome::DeliveryFailed;
        };

        let msg = OutboundMessage::IncomingChatMessage {
            sender_id: event.sender_id.clone(),
            text: event.text.clone(),
        };

        if handle.send(&msg) {
            self.metrics.inc_delivered();
            RelayOutcome::Delivered(conn_id)
        } else {
            tracing::debug!(
                conn_id = %conn_id,
                receiver = %event.receiver_id,
                "Chat message could not be queued"
            );
            self.metrics.inc_dropped();
            RelayOutcome::DeliveryFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::handle::ConnectionHandle;
    use roomie_core::config::AnnouncePolicy;
    use tokio::sync::mpsc;

    struct Fixture {
        registry: Arc<PresenceRegistry>,
        pool: Arc<ConnectionPool>,
        metrics: Arc<RealtimeMetrics>,
        relay: MessageRelay,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(PresenceRegistry::new(AnnouncePolicy::LastWins));
        let pool = Arc::new(ConnectionPool::new());
        let metrics = Arc::new(RealtimeMetrics::new());
        let relay = MessageRelay::new(registry.clone(), pool.clone(), metrics.clone());
        Fixture {
            registry,
            pool,
            metrics,
            relay,
        }
    }

    fn connect(f: &Fixture, user: &str) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(tx));
        f.pool.add(handle.clone());
        f.registry.announce(UserId::new(user), handle.id);
        (handle, rx)
    }

    fn event(to: &str) -> ChatEvent {
        ChatEvent {
            sender_id: UserId::new("alice"),
            receiver_id: UserId::new(to),
            text: "hi".to_string(),
        }
    }

    #[test]
    fn test_delivers_exactly_once_to_recipient() {
        let f = fixture();
        let (bob, mut bob_rx) = connect(&f, "bob");
        let (_carol, mut carol_rx) = connect(&f, "carol");

        assert_eq!(f.relay.relay(&event("bob")), RelayOutcome::Delivered(bob.id));

        let frame = bob_rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "incoming_chat_message");
        assert_eq!(value["sender_id"], "alice");
        assert!(bob_rx.try_recv().is_err());
        assert!(carol_rx.try_recv().is_err());
        assert_eq!(f.metrics.snapshot().relays_delivered, 1);
    }

    #[test]
    fn test_offline_recipient_is_silent_drop() {
        let f = fixture();
        assert_eq!(f.relay.relay(&event("nobody")), RelayOutcome::RecipientOffline);
        assert_eq!(f.metrics.snapshot().relays_dropped, 1);
    }

    #[test]
    fn test_goes_to_latest_connection_after_reconnect() {
        let f = fixture();
        let (_old, mut old_rx) = connect(&f, "bob");
        let (new, mut new_rx) = connect(&f, "bob");

        assert_eq!(f.relay.relay(&event("bob")), RelayOutcome::Delivered(new.id));
        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_connection_fails_delivery() {
        let f = fixture();
        let (_bob, bob_rx) = connect(&f, "bob");
        drop(bob_rx);
        assert_eq!(f.relay.relay(&event("bob")), RelayOutcome::DeliveryFailed);
    }
}
