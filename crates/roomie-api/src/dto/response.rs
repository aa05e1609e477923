//! Response DTOs.

use serde::{Deserialize, Serialize};

use roomie_core::types::UserId;
use roomie_realtime::metrics::MetricsSnapshot;

/// Standard success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Basic health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Open WebSocket connections.
    pub ws_connections: usize,
    /// Announced users.
    pub online_users: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}

/// Online presence listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    /// Online identities, sorted.
    pub user_ids: Vec<UserId>,
    /// Number of online identities.
    pub count: usize,
}

/// Presence of one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceResponse {
    pub user_id: UserId,
    pub online: bool,
}
