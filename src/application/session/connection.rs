//! WebSocket connection abstraction

use std::fmt;

use tokio::sync::mpsc;

use crate::domain::Identity;

/// Process-unique id of one signaling socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An open signaling socket bound to one identity
#[derive(Debug)]
pub struct Connection {
    pub connection_id: ConnectionId,
    /// Identity bound at authentication, fixed for the socket's lifetime
    pub identity: Identity,
    /// Outbound queue drained by the socket's writer task
    pub sender: mpsc::UnboundedSender<String>,
}

impl Connection {
    pub fn new(
        connection_id: ConnectionId,
        identity: Identity,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            connection_id,
            identity,
            sender,
        }
    }

    /// Queue a frame for the client
    pub fn send(&self, frame: String) -> Result<(), String> {
        self.sender
            .send(frame)
            .map_err(|e| format!("Failed to send message: {}", e))
    }
}
