//! Presence registry: which identity is online on which connection.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use roomie_core::config::AnnouncePolicy;
use roomie_core::types::{ConnectionId, UserId};

/// Result of an announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// The identity was offline and is now bound to the connection.
    Registered,
    /// The identity was already bound to this very connection.
    Unchanged,
    /// The identity moved from `previous` to the announcing connection.
    Replaced {
        /// Connection that held the identity before.
        previous: ConnectionId,
    },
    /// The identity stays on `current`; the announce was ignored.
    AlreadyPresent {
        /// Connection that keeps the identity.
        current: ConnectionId,
    },
}

impl AnnounceOutcome {
    /// Whether the online set or its bindings changed.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Registered | Self::Replaced { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    by_user: HashMap<UserId, ConnectionId>,
    by_conn: HashMap<ConnectionId, UserId>,
}

/// Process-wide mapping from user identity to its live connection.
///
/// Both directions are kept under one lock so that an identity maps to at
/// most one connection and a connection carries at most one identity.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    policy: AnnouncePolicy,
    inner: RwLock<Inner>,
}

impl PresenceRegistry {
    /// Create an empty registry with the given reconnect policy.
    pub fn new(policy: AnnouncePolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Reconnect policy in effect.
    pub fn policy(&self) -> AnnouncePolicy {
        self.policy
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bind `user_id` to `conn_id`.
    pub fn announce(&self, user_id: UserId, conn_id: ConnectionId) -> AnnounceOutcome {
        let mut inner = self.write();

        let outcome = match inner.by_user.get(&user_id).copied() {
            Some(current) if current == conn_id => return AnnounceOutcome::Unchanged,
            Some(current) if self.policy == AnnouncePolicy::FirstWins => {
                return AnnounceOutcome::AlreadyPresent { current };
            }
            Some(previous) => {
                inner.by_conn.remove(&previous);
                AnnounceOutcome::Replaced { previous }
            }
            None => AnnounceOutcome::Registered,
        };

        // A connection carries one identity; drop whatever it held before.
        if let Some(old_user) = inner.by_conn.insert(conn_id, user_id.clone()) {
            if old_user != user_id {
                inner.by_user.remove(&old_user);
            }
        }
        inner.by_user.insert(user_id, conn_id);

        outcome
    }

    /// Connection currently bound to `user_id`.
    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.read().by_user.get(user_id).copied()
    }

    /// Identity bound to `conn_id`.
    pub fn identity_of(&self, conn_id: &ConnectionId) -> Option<UserId> {
        self.read().by_conn.get(conn_id).cloned()
    }

    /// Drop whatever identity `conn_id` holds. Returns it if one was removed.
    ///
    /// A connection that was displaced by a newer announce holds nothing, so
    /// its late disconnect leaves the fresh binding alone.
    pub fn forget(&self, conn_id: &ConnectionId) -> Option<UserId> {
        let mut inner = self.write();
        let user_id = inner.by_conn.remove(conn_id)?;
        if inner.by_user.get(&user_id) == Some(conn_id) {
            inner.by_user.remove(&user_id);
        }
        Some(user_id)
    }

    /// Every online identity, sorted.
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.read().by_user.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.read().by_user.contains_key(user_id)
    }

    /// Number of online identities.
    pub fn len(&self) -> usize {
        self.read().by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every binding.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.by_user.clear();
        inner.by_conn.clear();
    }
}
