//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// What the presence registry does when an identity that is already
/// online is announced from a different connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncePolicy {
    /// The newest connection replaces the registered one.
    #[default]
    LastWins,
    /// The registered connection is kept and the new announce is ignored.
    FirstWins,
}

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Seconds without inbound traffic before a connection is dropped.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Maximum chat text length in characters.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Duplicate-identity resolution.
    #[serde(default)]
    pub announce_policy: AnnouncePolicy,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_message_bytes: default_max_message_bytes(),
            max_text_chars: default_max_text_chars(),
            announce_policy: AnnouncePolicy::default(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    25
}

fn default_ping_timeout() -> u64 {
    60
}

fn default_max_message_bytes() -> usize {
    65_536
}

fn default_max_text_chars() -> usize {
    4000
}
