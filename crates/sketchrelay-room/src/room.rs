//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task and communicates with the outside
//! world through an mpsc channel: no shared mutable state, just
//! message passing. The actor is the single writer of all room state
//! (membership, phase, disconnect reservations, empty timer), so none
//! of it needs a lock.
//!
//! Routing is asymmetric by role: the host's messages fan out to every
//! other member, players' messages go to the host alone. The relay
//! never interprets game content beyond three control tags and one
//! phase field.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use sketchrelay_protocol::{
    extract_phase, message_type, Codec, JsonCodec, PlayerEntry, ServerEvent,
    CLOSE_ROOM, GAME_STATE_UPDATE, LEAVE_ROOM,
};
use sketchrelay_transport::ConnectionId;

use crate::{ClientHandle, Hub, RoomConfig};

/// Phase in which a room starts and to which it returns between games.
pub const PHASE_LOBBY: &str = "LOBBY";
/// The other join-permitted phase; anything else is join-restricted.
pub const PHASE_GAME_OVER: &str = "GAME_OVER";

/// Channel sender for delivering events to a room actor.
pub type RoomSender = mpsc::Sender<RoomEvent>;

/// A join hand-off from the hub to a room. Lives only for the duration
/// of the hand-off; the room either admits the client or answers with
/// an `ERROR` envelope and forgets the request.
#[derive(Debug)]
pub struct JoinRequest {
    /// The requesting connection.
    pub client: ClientHandle,
    /// The code the client asked for (the hub already resolved it).
    pub room_code: String,
    /// Requested display identity.
    pub nickname: String,
    /// Host secret, if the client claims host identity.
    pub host_token: Option<String>,
}

/// Events a room actor processes, strictly in arrival order.
#[derive(Debug)]
pub enum RoomEvent {
    /// Admission request routed through the hub.
    Join(JoinRequest),
    /// A member's connection tore down.
    Disconnect(ConnectionId),
    /// Raw inbound traffic from an affiliated connection.
    Relay {
        /// The sending connection.
        from: ConnectionId,
        /// The verbatim wire bytes.
        data: Vec<u8>,
    },
}

/// A currently connected member.
struct Member {
    nickname: String,
    is_host: bool,
    client: ClientHandle,
}

/// The room actor state. Runs inside a Tokio task; see [`spawn_room`].
pub(crate) struct RoomActor {
    code: String,
    host_token: String,
    members: HashMap<ConnectionId, Member>,
    /// Nickname → when it dropped. Reserved for reconnection until the
    /// grace period prunes it.
    disconnected: HashMap<String, Instant>,
    host_connected: bool,
    /// Current game phase as declared by the host. Only `LOBBY` and
    /// `GAME_OVER` permit fresh joins.
    phase: String,
    /// Set while membership is zero; drives idle closure.
    empty_since: Option<Instant>,
    config: RoomConfig,
    codec: JsonCodec,
    hub: Arc<Hub>,
    /// Our own inbox sender, handed to members on attach.
    sender: RoomSender,
    receiver: mpsc::Receiver<RoomEvent>,
    /// Best-effort count published for registry listings.
    member_count: Arc<AtomicUsize>,
}

impl RoomActor {
    /// Runs the actor loop until the host closes the room, the room
    /// idles out, or every handle to its inbox is gone.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room actor started");

        let period = self.config.sweep_interval;
        let mut sweep =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                event = self.receiver.recv() => match event {
                    Some(RoomEvent::Join(req)) => self.handle_join(req),
                    Some(RoomEvent::Disconnect(id)) => self.handle_disconnect(id),
                    Some(RoomEvent::Relay { from, data }) => {
                        if self.handle_relay(from, data).is_break() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = sweep.tick() => {
                    if self.handle_sweep().is_break() {
                        break;
                    }
                }
            }
        }

        self.hub.close_room(&self.code);
        tracing::info!(room = %self.code, "room actor stopped");
    }

    fn handle_join(&mut self, req: JoinRequest) {
        let is_host = req
            .host_token
            .as_deref()
            .is_some_and(|t| !t.is_empty() && t == self.host_token);

        // Mid-game the room only takes the host back, or a player whose
        // nickname is reserved in the disconnected set (a reconnection).
        let restricted = self.phase != PHASE_LOBBY && self.phase != PHASE_GAME_OVER;
        if restricted && !is_host && !self.disconnected.contains_key(&req.nickname)
        {
            self.send_error(&req.client, "Game in progress - cannot join now");
            return;
        }

        let taken = self
            .members
            .values()
            .any(|m| m.nickname == req.nickname);
        if taken && !is_host {
            self.send_error(&req.client, "Nickname already taken");
            return;
        }

        let was_disconnected =
            !is_host && self.disconnected.remove(&req.nickname).is_some();

        if is_host {
            // Token possession proves identity: a rejoining host
            // displaces a stale host connection that is still
            // registered, keeping at most one host in the set.
            let stale = self
                .members
                .iter()
                .find(|(_, m)| m.is_host)
                .map(|(id, _)| *id);
            if let Some(id) = stale {
                if let Some(old) = self.members.remove(&id) {
                    old.client.detach();
                    tracing::debug!(
                        room = %self.code,
                        conn = %id,
                        "displaced stale host connection"
                    );
                }
            }
            self.host_connected = true;
            self.broadcast(&ServerEvent::HostReconnected);
        } else {
            // Without a host nothing will flow; tell the joiner why.
            if !self.host_connected {
                self.send_event(&req.client, &ServerEvent::GamePaused);
            }
            if was_disconnected {
                self.broadcast(&ServerEvent::PlayerReconnected {
                    nickname: req.nickname.clone(),
                });
            }
        }

        req.client.attach(self.sender.clone(), &req.nickname);
        self.members.insert(
            req.client.id(),
            Member {
                nickname: req.nickname.clone(),
                is_host,
                client: req.client.clone(),
            },
        );
        self.publish_member_count();

        let players: Vec<PlayerEntry> = self
            .members
            .values()
            .map(|m| PlayerEntry {
                nickname: m.nickname.clone(),
                is_host: m.is_host,
            })
            .collect();
        self.send_event(
            &req.client,
            &ServerEvent::JoinSuccess {
                room_code: self.code.clone(),
                is_host,
                nickname: req.nickname.clone(),
                players,
                host_token: is_host.then(|| self.host_token.clone()),
            },
        );
        self.broadcast_except(
            req.client.id(),
            &ServerEvent::PlayerJoined {
                nickname: req.nickname.clone(),
                is_host,
            },
        );

        self.empty_since = None;
        tracing::info!(
            room = %self.code,
            nickname = %req.nickname,
            is_host,
            members = self.members.len(),
            "member joined"
        );
    }

    fn handle_disconnect(&mut self, id: ConnectionId) {
        // A connection that already left (or was displaced) is gone
        // from the set; a second disconnect is a no-op.
        let Some(member) = self.members.remove(&id) else {
            return;
        };
        self.publish_member_count();

        // Reserve the nickname so the player can pick up where they
        // left off, even mid-game.
        self.disconnected
            .insert(member.nickname.clone(), Instant::now());

        if member.is_host {
            self.host_connected = false;
            self.broadcast(&ServerEvent::HostDisconnected);
        } else {
            self.broadcast(&ServerEvent::PlayerDisconnected {
                nickname: member.nickname.clone(),
            });
        }

        self.update_empty_timer();
        tracing::info!(
            room = %self.code,
            nickname = %member.nickname,
            is_host = member.is_host,
            members = self.members.len(),
            "member disconnected"
        );
    }

    fn handle_relay(
        &mut self,
        from: ConnectionId,
        data: Vec<u8>,
    ) -> ControlFlow<()> {
        // Late event for a connection that was already removed.
        let Some(member) = self.members.get(&from) else {
            tracing::debug!(room = %self.code, conn = %from, "relay from non-member");
            return ControlFlow::Continue(());
        };
        let sender_is_host = member.is_host;
        let kind = message_type(&data);

        if sender_is_host {
            match kind.as_deref() {
                Some(CLOSE_ROOM) => {
                    self.broadcast(&ServerEvent::RoomClosed);
                    for m in self.members.values() {
                        m.client.detach();
                    }
                    self.members.clear();
                    self.publish_member_count();
                    tracing::info!(room = %self.code, "host closed the room");
                    return ControlFlow::Break(());
                }
                Some(GAME_STATE_UPDATE) => {
                    if let Some(phase) = extract_phase(&data) {
                        tracing::debug!(room = %self.code, %phase, "phase updated");
                        self.phase = phase;
                    }
                }
                _ => {}
            }

            // Host → everyone else, verbatim. Never echoed back.
            for m in self.members.values() {
                if m.client.id() != from && !m.client.push(data.clone()) {
                    tracing::debug!(
                        room = %self.code,
                        nickname = %m.nickname,
                        "dropped relay to slow member"
                    );
                }
            }
        } else {
            if kind.as_deref() == Some(LEAVE_ROOM) {
                self.handle_leave(from);
                return ControlFlow::Continue(());
            }

            // Player → host only. With no host connected the message is
            // dropped outright: the host is the single source of game
            // truth, and there is nothing to resend state on its behalf.
            if let Some(host) = self.members.values().find(|m| m.is_host) {
                host.client.push(data);
            }
        }

        ControlFlow::Continue(())
    }

    fn handle_leave(&mut self, id: ConnectionId) {
        let Some(member) = self.members.remove(&id) else {
            return;
        };
        self.publish_member_count();

        self.send_event(&member.client, &ServerEvent::LeftRoom);
        member.client.detach();

        // An intentional departure is not expected back: no
        // reconnection reservation.
        self.disconnected.remove(&member.nickname);

        self.broadcast(&ServerEvent::PlayerLeft {
            nickname: member.nickname.clone(),
        });
        self.update_empty_timer();
        tracing::info!(
            room = %self.code,
            nickname = %member.nickname,
            members = self.members.len(),
            "member left"
        );
    }

    fn handle_sweep(&mut self) -> ControlFlow<()> {
        if let Some(since) = self.empty_since {
            if since.elapsed() > self.config.empty_grace {
                tracing::info!(room = %self.code, "empty past grace period, closing");
                return ControlFlow::Break(());
            }
        }

        // Free nicknames whose owners never came back.
        let grace = self.config.disconnect_grace;
        self.disconnected.retain(|_, dropped_at| dropped_at.elapsed() <= grace);

        ControlFlow::Continue(())
    }

    fn update_empty_timer(&mut self) {
        self.empty_since = if self.members.is_empty() {
            Some(Instant::now())
        } else {
            None
        };
    }

    fn publish_member_count(&self) {
        self.member_count
            .store(self.members.len(), Ordering::Relaxed);
    }

    // -- Delivery helpers: best-effort, never fatal ----------------------

    fn broadcast(&self, event: &ServerEvent) {
        if let Some(bytes) = self.encode(event) {
            for m in self.members.values() {
                m.client.push(bytes.clone());
            }
        }
    }

    fn broadcast_except(&self, skip: ConnectionId, event: &ServerEvent) {
        if let Some(bytes) = self.encode(event) {
            for m in self.members.values() {
                if m.client.id() != skip {
                    m.client.push(bytes.clone());
                }
            }
        }
    }

    fn send_event(&self, client: &ClientHandle, event: &ServerEvent) {
        if let Some(bytes) = self.encode(event) {
            client.push(bytes);
        }
    }

    fn send_error(&self, client: &ClientHandle, message: &str) {
        self.send_event(
            client,
            &ServerEvent::Error {
                message: message.to_string(),
            },
        );
    }

    fn encode(&self, event: &ServerEvent) -> Option<Vec<u8>> {
        match self.codec.encode(event) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!(
                    room = %self.code,
                    error = %e,
                    "failed to encode event, skipping send"
                );
                None
            }
        }
    }
}

/// Spawns a new room actor task and returns the sender for its inbox.
///
/// The hub registers the sender before the first join can possibly
/// arrive; the actor removes its own registry entry on exit.
pub(crate) fn spawn_room(
    code: String,
    host_token: String,
    config: RoomConfig,
    hub: Arc<Hub>,
    member_count: Arc<AtomicUsize>,
) -> RoomSender {
    let (tx, rx) = mpsc::channel(config.event_queue);

    let actor = RoomActor {
        code,
        host_token,
        members: HashMap::new(),
        disconnected: HashMap::new(),
        host_connected: false,
        phase: PHASE_LOBBY.to_string(),
        empty_since: None,
        config,
        codec: JsonCodec,
        hub,
        sender: tx.clone(),
        receiver: rx,
        member_count,
    };

    tokio::spawn(actor.run());

    tx
}
