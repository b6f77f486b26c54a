//! Room timing and queue configuration.

use std::time::Duration;

/// Configuration shared by every room a [`Hub`](crate::Hub) creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a room may stay continuously empty before its actor
    /// exits and the code is released.
    pub empty_grace: Duration,

    /// How long a disconnected nickname stays reserved for
    /// reconnection before it is pruned and freed for fresh use.
    pub disconnect_grace: Duration,

    /// Period of the sweep tick that checks both graces.
    pub sweep_interval: Duration,

    /// Capacity of a room's event channel. Joins are handed off with a
    /// non-blocking send, so this also bounds how far a room can fall
    /// behind before join requests are shed.
    pub event_queue: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            empty_grace: Duration::from_secs(5 * 60),
            disconnect_grace: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            event_queue: 64,
        }
    }
}
