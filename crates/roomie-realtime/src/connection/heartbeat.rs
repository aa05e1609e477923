//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use roomie_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::types::OutboundMessage;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Idle time after which the connection is considered dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and closes the connection once it has been silent
/// for longer than the timeout. Any inbound frame counts as activity.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // first tick fires immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = handle.closed() => break,
        }

        let idle = handle.idle_for();
        if idle > config.ping_timeout {
            tracing::warn!(
                conn_id = %handle.id,
                idle_secs = idle.as_secs(),
                "Heartbeat timeout, closing connection"
            );
            handle.mark_closed();
            break;
        }

        let ping = OutboundMessage::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if !handle.send(&ping) && !handle.is_alive() {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, connection gone");
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn config() -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(25),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_then_times_out_silent_connection() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(tx));

        let task = tokio::spawn(run_heartbeat(handle.clone(), config()));
        task.await.unwrap();

        assert!(!handle.is_alive());
        let mut pings = 0;
        while let Ok(frame) = rx.try_recv() {
            assert!(frame.contains("\"type\":\"ping\""));
            pings += 1;
        }
        assert_eq!(pings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_connection_alive() {
        let (tx, mut rx) = mpsc::channel(64);
        let handle = Arc::new(ConnectionHandle::new(tx));
        let task = tokio::spawn(run_heartbeat(handle.clone(), config()));

        for _ in 0..6 {
            time::sleep(Duration::from_secs(10)).await;
            handle.touch();
        }
        assert!(handle.is_alive());

        handle.mark_closed();
        task.await.unwrap();
        while rx.try_recv().is_ok() {}
    }
}
