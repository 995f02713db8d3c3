//! Connection registry: maps identities to their open signaling sockets
//!
//! Every authenticated socket is enrolled in the group named after its
//! identity. Delivery is addressed to a group, so an identity with several
//! open sockets receives each event on all of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use crate::domain::Identity;
use crate::interfaces::ws::protocol::ServerEvent;
use crate::shared::errors::AuthError;

use super::connection::{Connection, ConnectionId};

/// Handshake query key carrying the caller's identity
pub const IDENTITY_KEY: &str = "callerId";

/// Thread-safe registry of identity groups
pub struct ConnectionRegistry {
    groups: DashMap<Identity, Vec<Connection>>,
    next_connection_id: AtomicU64,
}

/// Shared, reference-counted connection registry
pub type SharedConnectionRegistry = Arc<ConnectionRegistry>;

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared() -> SharedConnectionRegistry {
        Arc::new(Self::new())
    }

    /// Read the caller identity from handshake metadata.
    pub fn authenticate(handshake: &HashMap<String, String>) -> Result<Identity, AuthError> {
        Identity::parse(handshake.get(IDENTITY_KEY).map(String::as_str))
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a connection to its identity's group
    pub fn enroll(&self, connection: Connection) {
        info!(
            identity = %connection.identity,
            connection_id = %connection.connection_id,
            "Enrolling connection"
        );
        self.groups
            .entry(connection.identity.clone())
            .or_default()
            .push(connection);
        metrics::gauge!("signaling_active_connections").increment(1.0);
    }

    /// Remove a connection from its identity's group.
    ///
    /// The group itself disappears with its last connection.
    pub fn unenroll(&self, identity: &Identity, connection_id: ConnectionId) -> bool {
        let mut removed = false;
        let mut emptied = false;

        if let Some(mut group) = self.groups.get_mut(identity) {
            let before = group.len();
            group.retain(|c| c.connection_id != connection_id);
            removed = group.len() != before;
            emptied = group.is_empty();
        }

        if emptied {
            self.groups.remove_if(identity, |_, group| group.is_empty());
        }

        if removed {
            metrics::gauge!("signaling_active_connections").decrement(1.0);
            info!(%identity, %connection_id, "Unenrolled connection");
        } else {
            warn!(%identity, %connection_id, "Attempted to unenroll unknown connection");
        }
        removed
    }

    /// Send an event to every connection of `identity`.
    ///
    /// Returns the number of connections the frame was queued on; an offline
    /// identity yields 0 and is not an error.
    pub fn deliver_to(&self, identity: &Identity, event: &ServerEvent) -> usize {
        let Some(group) = self.groups.get(identity) else {
            debug!(%identity, event = event.event_name(), "Target not connected, dropping");
            return 0;
        };
        let Some(frame) = encode(event) else {
            return 0;
        };
        send_all(group.value(), &frame)
    }

    /// Send an event to every connected identity
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };
        self.groups
            .iter()
            .map(|group| send_all(group.value(), &frame))
            .sum()
    }

    /// Check if an identity has at least one open connection
    pub fn is_connected(&self, identity: &Identity) -> bool {
        self.groups.contains_key(identity)
    }

    /// Number of identity groups
    pub fn identity_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of open connections across all groups
    pub fn connection_count(&self) -> usize {
        self.groups.iter().map(|r| r.value().len()).sum()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_frame() {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!(event = event.event_name(), error = %e, "Failed to encode event");
            None
        }
    }
}

fn send_all(group: &[Connection], frame: &str) -> usize {
    let mut sent = 0;
    for conn in group {
        match conn.send(frame.to_string()) {
            Ok(()) => sent += 1,
            // Writer task already gone; the socket's own cleanup will unenroll it.
            Err(e) => debug!(
                identity = %conn.identity,
                connection_id = %conn.connection_id,
                error = %e,
                "Dropping frame for closing connection"
            ),
        }
    }
    sent
}
