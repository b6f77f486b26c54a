//! What a room sees of a connection.
//!
//! The connection actor itself lives in the server crate; rooms and the
//! hub only ever hold a [`ClientHandle`], a pair of channels into the
//! actor. The outbound channel is bounded with try-send semantics
//! ("push or drop"): a slow or stalled peer loses messages instead of
//! blocking the room. The control channel carries affiliation changes,
//! so the actor's room binding moves by message passing rather than by
//! anyone mutating shared connection state.

use tokio::sync::mpsc;

use sketchrelay_transport::ConnectionId;

use crate::RoomSender;

/// Affiliation changes pushed from a room to a connection actor.
#[derive(Debug)]
pub enum ClientControl {
    /// The connection was admitted: forward all further inbound
    /// traffic into `room`.
    Attached {
        /// The admitting room's event channel.
        room: RoomSender,
        /// The identity the room admitted the connection under.
        nickname: String,
    },
    /// The connection was removed (left, or the room closed); it is
    /// unaffiliated again.
    Detached,
}

/// Bounded, best-effort sender for a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl OutboundSender {
    /// Wraps the sending half of a connection's outbound queue.
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Queues bytes for delivery. Returns `false` when the message was
    /// dropped: queue full (stalled peer) or connection gone. Never
    /// blocks.
    pub fn push(&self, data: Vec<u8>) -> bool {
        self.tx.try_send(data).is_ok()
    }
}

/// Cheap-to-clone handle to a connection actor.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    outbound: OutboundSender,
    control: mpsc::UnboundedSender<ClientControl>,
}

impl ClientHandle {
    /// Builds a handle from a connection's channels.
    pub fn new(
        id: ConnectionId,
        outbound: OutboundSender,
        control: mpsc::UnboundedSender<ClientControl>,
    ) -> Self {
        Self {
            id,
            outbound,
            control,
        }
    }

    /// Returns the connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Best-effort delivery into the connection's outbound queue.
    pub fn push(&self, data: Vec<u8>) -> bool {
        self.outbound.push(data)
    }

    /// Tells the connection actor it now belongs to `room`.
    pub fn attach(&self, room: RoomSender, nickname: &str) {
        let _ = self.control.send(ClientControl::Attached {
            room,
            nickname: nickname.to_string(),
        });
    }

    /// Tells the connection actor it is unaffiliated again. A handle
    /// whose actor already exited is fine; the send error is ignored.
    pub fn detach(&self) {
        let _ = self.control.send(ClientControl::Detached);
    }
}
