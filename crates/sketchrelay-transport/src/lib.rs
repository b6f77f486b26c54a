//! WebSocket transport for Sketchrelay.
//!
//! Accepts connections and exposes each one as two independently owned
//! halves, a [`WsSender`] for the write pump and a [`WsReceiver`] for
//! the read pump, so neither direction can ever block the other. The
//! receiver surfaces ping/pong activity as [`Frame`]s because the
//! connection actor's liveness deadline must refresh on any inbound
//! traffic, not just data.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{
    Frame, WsConnection, WsListener, WsReceiver, WsSender,
    DEFAULT_MAX_MESSAGE_SIZE,
};

use std::fmt;

/// Opaque identifier for a connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "ada");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "ada");
    }
}
