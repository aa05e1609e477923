//! # roomie-realtime
//!
//! Real-time WebSocket engine for Roomie. Provides:
//!
//! - Connection lifecycle with ping/pong heartbeat
//! - A presence registry binding each online user to one connection
//! - Best-effort, at-most-once chat relay to online recipients
//! - Online-list broadcasts on every presence change
//! - Engine metrics

pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod relay;
pub mod server;

pub use connection::manager::ConnectionManager;
pub use presence::registry::{AnnounceOutcome, PresenceRegistry};
pub use relay::{ChatEvent, MessageRelay, RelayOutcome};
pub use server::RealtimeEngine;
