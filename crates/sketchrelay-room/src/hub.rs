//! Hub: the process-wide room registry.
//!
//! The hub owns the code → room map and the code generator, creates
//! rooms, and runs a small event loop that routes join requests and
//! disconnect notices from connection actors to the right room. The
//! registry map is the only piece of state in the system shared across
//! actors; it sits behind a reader/writer lock because listings and
//! room creation are invoked from outside the hub's own loop
//! (HTTP-style collaborators). The lock is never held across an await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use sketchrelay_protocol::{Codec, JsonCodec, RoomSummary, ServerEvent};
use sketchrelay_transport::ConnectionId;

use crate::room::{spawn_room, JoinRequest, RoomEvent, RoomSender};
use crate::{codes, ClientHandle, CodeGenerator, RoomConfig};

/// Capacity of the hub's event channel.
const HUB_EVENT_QUEUE: usize = 64;

/// Events processed by the hub loop, one at a time.
#[derive(Debug)]
pub enum HubEvent {
    /// A connection was accepted and is not yet in any room.
    Register {
        /// The new connection.
        id: ConnectionId,
    },
    /// A connection tore down. If it had joined a room, the hub
    /// forwards the disconnect there with a non-blocking attempt.
    Unregister {
        /// The departed connection.
        id: ConnectionId,
        /// The room it was bound to, if any.
        room: Option<RoomSender>,
    },
    /// A `JOIN_ROOM` request from an unaffiliated connection.
    Join(JoinRequest),
}

struct RoomEntry {
    name: String,
    sender: RoomSender,
    member_count: Arc<AtomicUsize>,
}

/// The registry. Create with [`spawn_hub`], share as `Arc<Hub>`.
pub struct Hub {
    rooms: RwLock<HashMap<String, RoomEntry>>,
    codes: Mutex<CodeGenerator>,
    events: mpsc::Sender<HubEvent>,
    config: RoomConfig,
    codec: JsonCodec,
    /// Live connection count, for operational logging.
    connections: AtomicUsize,
}

impl Hub {
    /// Creates a room, spawns its actor, and registers it.
    ///
    /// Returns the public room code and the host token. The token is
    /// the one secret proving host identity: hand it to the creator
    /// out-of-band (e.g., in the HTTP response minting the room) and
    /// never through a room broadcast.
    pub fn create_room(self: &Arc<Self>, name: &str) -> (String, String) {
        let host_token = codes::host_token();
        let member_count = Arc::new(AtomicUsize::new(0));

        // Code generation happens under the write lock so a concurrent
        // create cannot race the collision check.
        let mut rooms = self.rooms.write();
        let code = self.codes.lock().generate(|c| rooms.contains_key(c));
        let sender = spawn_room(
            code.clone(),
            host_token.clone(),
            self.config.clone(),
            Arc::clone(self),
            Arc::clone(&member_count),
        );
        rooms.insert(
            code.clone(),
            RoomEntry {
                name: name.to_string(),
                sender,
                member_count,
            },
        );
        drop(rooms);

        tracing::info!(room = %code, name, "room created");
        (code, host_token)
    }

    /// Snapshot of all open rooms. Member counts are best-effort (the
    /// room actors publish them; nobody blocks on an actor here).
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        self.rooms
            .read()
            .iter()
            .map(|(code, entry)| RoomSummary {
                code: code.clone(),
                name: entry.name.clone(),
                member_count: entry.member_count.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Drops a room's registry entry, making its code free for reuse.
    /// Called by the room actor as its loop exits.
    pub fn close_room(&self, code: &str) {
        if self.rooms.write().remove(code).is_some() {
            tracing::info!(room = %code, "room unregistered");
        }
    }

    /// Returns a sender for feeding connection events into the hub loop.
    pub fn events(&self) -> mpsc::Sender<HubEvent> {
        self.events.clone()
    }

    fn route_join(&self, req: JoinRequest) {
        let sender = self
            .rooms
            .read()
            .get(&req.room_code)
            .map(|entry| entry.sender.clone());

        match sender {
            None => {
                tracing::debug!(code = %req.room_code, "join for unknown room");
                self.send_error(&req.client, "Room not found");
            }
            Some(tx) => {
                // Non-blocking hand-off: a room that is closing (or has
                // fallen far behind) must never wedge the hub. The
                // request is shed; the client stays unaffiliated.
                if tx.try_send(RoomEvent::Join(req)).is_err() {
                    tracing::debug!("join dropped, room closing or backlogged");
                }
            }
        }
    }

    fn send_error(&self, client: &ClientHandle, message: &str) {
        let event = ServerEvent::Error {
            message: message.to_string(),
        };
        match self.codec.encode(&event) {
            Ok(bytes) => {
                client.push(bytes);
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to encode error event");
            }
        }
    }
}

/// Starts the hub loop task and returns the shared registry handle.
pub fn spawn_hub(config: RoomConfig) -> Arc<Hub> {
    let (tx, rx) = mpsc::channel(HUB_EVENT_QUEUE);

    let hub = Arc::new(Hub {
        rooms: RwLock::new(HashMap::new()),
        codes: Mutex::new(CodeGenerator::new()),
        events: tx,
        config,
        codec: JsonCodec,
        connections: AtomicUsize::new(0),
    });

    tokio::spawn(run(Arc::clone(&hub), rx));

    hub
}

/// The hub loop: serves one event at a time until every event sender
/// (the server's accept loop and all connection actors) is gone.
async fn run(hub: Arc<Hub>, mut events: mpsc::Receiver<HubEvent>) {
    tracing::info!("hub started");

    while let Some(event) = events.recv().await {
        match event {
            HubEvent::Register { id } => {
                let n = hub.connections.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(conn = %id, connections = n, "connection registered");
            }
            HubEvent::Unregister { id, room } => {
                if let Some(room) = room {
                    // Non-blocking: the room may already be gone.
                    let _ = room.try_send(RoomEvent::Disconnect(id));
                }
                let n = hub
                    .connections
                    .fetch_sub(1, Ordering::Relaxed)
                    .saturating_sub(1);
                tracing::debug!(conn = %id, connections = n, "connection unregistered");
            }
            HubEvent::Join(req) => hub.route_join(req),
        }
    }

    tracing::info!("hub stopped");
}
