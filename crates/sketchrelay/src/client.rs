//! Per-connection actor: bridges one WebSocket to the relay.
//!
//! Each accepted connection gets two tasks, a read pump and a write
//! pump, so a stalled direction can never block the other. The read
//! pump owns the connection's affiliation state (which room, if any)
//! and is the single teardown path that notifies the hub; the write
//! pump drains the bounded outbound queue and keeps the peer alive
//! with periodic pings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use sketchrelay_protocol::{message_type, JoinPayload, JOIN_ROOM};
use sketchrelay_room::{
    ClientControl, ClientHandle, Hub, HubEvent, JoinRequest, OutboundSender,
    RoomEvent, RoomSender,
};
use sketchrelay_transport::{
    Frame, WsConnection, WsReceiver, WsSender, DEFAULT_MAX_MESSAGE_SIZE,
};

/// Keepalive and queue tuning for connections.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Time allowed to write one message to the peer.
    pub write_timeout: Duration,

    /// Maximum silence (no frames, no pong) before the connection is
    /// declared dead and torn down.
    pub liveness_timeout: Duration,

    /// Ping period. Must be comfortably under `liveness_timeout` so a
    /// healthy peer always produces a pong in time.
    pub ping_interval: Duration,

    /// Outbound queue capacity. Delivery is best-effort: when a slow
    /// peer fills the queue, further messages to it are dropped.
    pub outbound_queue: usize,

    /// Maximum inbound message size; oversized frames terminate the
    /// connection.
    pub max_message_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        let liveness_timeout = Duration::from_secs(60);
        Self {
            write_timeout: Duration::from_secs(10),
            liveness_timeout,
            // 9/10 of the liveness window, like the classic pump setup.
            ping_interval: liveness_timeout * 9 / 10,
            outbound_queue: 256,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Wires up the channels for a fresh connection and starts its pumps.
pub(crate) fn spawn_client(
    conn: WsConnection,
    hub: Arc<Hub>,
    config: ConnectionConfig,
) {
    let id = conn.id();
    let (ws_tx, ws_rx) = conn.into_split();

    let (out_tx, out_rx) = mpsc::channel(config.outbound_queue);
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
    // Flipped by the read pump on exit so the write pump closes the
    // socket even with an empty queue.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = ClientHandle::new(id, OutboundSender::new(out_tx), ctrl_tx);

    tokio::spawn(write_pump(ws_tx, out_rx, shutdown_rx, config.clone()));
    tokio::spawn(read_pump(ws_rx, hub, handle, ctrl_rx, shutdown_tx, config));
}

/// Reads frames until the connection dies, forwarding traffic to the
/// hub (unaffiliated) or the bound room (affiliated).
async fn read_pump(
    mut ws_rx: WsReceiver,
    hub: Arc<Hub>,
    handle: ClientHandle,
    mut control: mpsc::UnboundedReceiver<ClientControl>,
    shutdown: watch::Sender<bool>,
    config: ConnectionConfig,
) {
    let id = handle.id();
    let events = hub.events();
    if events.send(HubEvent::Register { id }).await.is_err() {
        // Hub loop gone: the process is shutting down.
        return;
    }

    // Current affiliation; mutated only by control messages from the
    // admitting room, never by anyone reaching into this task.
    let mut room: Option<RoomSender> = None;

    loop {
        tokio::select! {
            ctrl = control.recv() => match ctrl {
                Some(ClientControl::Attached { room: sender, nickname }) => {
                    tracing::debug!(conn = %id, %nickname, "attached to room");
                    room = Some(sender);
                }
                Some(ClientControl::Detached) => {
                    tracing::debug!(conn = %id, "detached from room");
                    room = None;
                }
                None => break,
            },
            result = tokio::time::timeout(
                config.liveness_timeout,
                ws_rx.next_frame(),
            ) => match result {
                Ok(Ok(Some(Frame::Data(data)))) => {
                    handle_inbound(&events, &handle, &mut room, data).await;
                }
                // Ping/pong count as liveness; looping re-arms the
                // read deadline.
                Ok(Ok(Some(Frame::Ping | Frame::Pong))) => {}
                Ok(Ok(None)) => {
                    tracing::debug!(conn = %id, "connection closed by peer");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::debug!(conn = %id, error = %e, "read failed");
                    break;
                }
                Err(_) => {
                    tracing::info!(conn = %id, "liveness timeout, closing");
                    break;
                }
            },
        }
    }

    // The single teardown path: unregister exactly once, then signal
    // the write pump to close the socket.
    let _ = events.send(HubEvent::Unregister { id, room }).await;
    let _ = shutdown.send(true);
}

/// Routes one inbound data frame.
async fn handle_inbound(
    events: &mpsc::Sender<HubEvent>,
    handle: &ClientHandle,
    room: &mut Option<RoomSender>,
    data: Vec<u8>,
) {
    if let Some(sender) = room {
        // Affiliated: everything is forwarded verbatim. A send error
        // means the room actor exited underneath us; the binding is
        // stale, so drop it and the message with it.
        let event = RoomEvent::Relay {
            from: handle.id(),
            data,
        };
        if sender.send(event).await.is_err() {
            tracing::debug!(conn = %handle.id(), "room gone, clearing binding");
            *room = None;
        }
        return;
    }

    // Unaffiliated: only a join request means anything; all other
    // shapes are noise and ignored without ceremony.
    if message_type(&data).as_deref() != Some(JOIN_ROOM) {
        return;
    }
    let Some(join) = JoinPayload::parse(&data) else {
        return;
    };
    let _ = events
        .send(HubEvent::Join(JoinRequest {
            client: handle.clone(),
            room_code: join.room_code,
            nickname: join.nickname,
            host_token: join.host_token,
        }))
        .await;
}

/// Drains the outbound queue to the socket and pings the peer.
async fn write_pump(
    mut ws_tx: WsSender,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    mut shutdown: watch::Receiver<bool>,
    config: ConnectionConfig,
) {
    let id = ws_tx.id();
    let mut ping = tokio::time::interval_at(
        tokio::time::Instant::now() + config.ping_interval,
        config.ping_interval,
    );

    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(data) => {
                    match tokio::time::timeout(
                        config.write_timeout,
                        ws_tx.send(data),
                    )
                    .await
                    {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::debug!(conn = %id, error = %e, "write failed");
                            break;
                        }
                        Err(_) => {
                            tracing::debug!(conn = %id, "write timed out");
                            break;
                        }
                    }
                }
                None => break,
            },
            _ = ping.tick() => {
                if ws_tx.ping().await.is_err() {
                    break;
                }
            }
            // Fires on read-pump exit, including an abnormal one.
            _ = shutdown.changed() => break,
        }
    }

    // Closing the sink is what unblocks a still-running read pump and
    // tells the peer we are done.
    let _ = ws_tx.close().await;
    tracing::debug!(conn = %id, "write pump stopped");
}
