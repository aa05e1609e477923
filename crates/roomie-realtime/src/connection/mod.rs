//! WebSocket connection lifecycle.

pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use handle::{ConnectionHandle, ConnectionInfo, ConnectionState};
pub use heartbeat::{HeartbeatConfig, run_heartbeat};
pub use manager::ConnectionManager;
pub use pool::ConnectionPool;
