//! End-to-end tests: real WebSocket clients against a running relay.
//!
//! Each test spins up a server on an OS-assigned port, mints a room
//! through the hub (the collaborator entry point), and drives the wire
//! protocol from plain tokio-tungstenite clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use sketchrelay::{ConnectionConfig, Hub, RelayServer, RoomConfig};

type ClientWs = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =========================================================================
// Harness
// =========================================================================

async fn start_server_with(
    connection_config: ConnectionConfig,
) -> (Arc<Hub>, std::net::SocketAddr) {
    let server = RelayServer::builder()
        .bind("127.0.0.1:0")
        .room_config(RoomConfig::default())
        .connection_config(connection_config)
        .build()
        .await
        .expect("server should bind");

    let hub = Arc::clone(server.hub());
    let addr = server.local_addr().expect("listener has an address");
    tokio::spawn(server.run());

    (hub, addr)
}

async fn start_server() -> (Arc<Hub>, std::net::SocketAddr) {
    start_server_with(ConnectionConfig::default()).await
}

async fn connect(addr: std::net::SocketAddr) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Receives the next data message and parses it, skipping keepalive
/// frames.
async fn recv_event(ws: &mut ClientWs) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Binary(data) => {
                return serde_json::from_slice(&data).expect("invalid JSON")
            }
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("invalid JSON")
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn expect_event(ws: &mut ClientWs, kind: &str) -> serde_json::Value {
    let event = recv_event(ws).await;
    assert_eq!(event["type"], kind, "unexpected event: {event}");
    event
}

fn join_message(code: &str, nickname: &str, token: Option<&str>) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "room_code": code,
        "nickname": nickname,
    });
    if let Some(token) = token {
        payload["host_token"] = serde_json::Value::String(token.to_string());
    }
    serde_json::json!({ "type": "JOIN_ROOM", "payload": payload })
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_and_relay_end_to_end() {
    let (hub, addr) = start_server().await;
    let (code, token) = hub.create_room("e2e");

    // Host joins with the token.
    let mut host = connect(addr).await;
    send_json(&mut host, join_message(&code, "host", Some(&token))).await;
    let event = expect_event(&mut host, "JOIN_SUCCESS").await;
    assert_eq!(event["payload"]["is_host"], true);
    assert_eq!(event["payload"]["host_token"], token.as_str());

    // A player joins plain.
    let mut player = connect(addr).await;
    send_json(&mut player, join_message(&code, "ada", None)).await;
    let event = expect_event(&mut player, "JOIN_SUCCESS").await;
    assert_eq!(event["payload"]["is_host"], false);
    expect_event(&mut host, "PLAYER_JOINED").await;

    // Player → host: opaque traffic lands on the host verbatim.
    send_json(
        &mut player,
        serde_json::json!({ "type": "GUESS", "payload": {"word": "otter"} }),
    )
    .await;
    let event = expect_event(&mut host, "GUESS").await;
    assert_eq!(event["payload"]["word"], "otter");

    // Host → players: broadcast, not echoed.
    send_json(
        &mut host,
        serde_json::json!({
            "type": "GAME_STATE_UPDATE",
            "payload": {"game_state": {"phase": "DRAWING"}, "round": 1}
        }),
    )
    .await;
    let event = expect_event(&mut player, "GAME_STATE_UPDATE").await;
    assert_eq!(event["payload"]["round"], 1);
}

#[tokio::test]
async fn test_unknown_room_yields_error() {
    let (_hub, addr) = start_server().await;

    let mut client = connect(addr).await;
    send_json(&mut client, join_message("000001", "ada", None)).await;

    let event = expect_event(&mut client, "ERROR").await;
    assert_eq!(event["payload"]["message"], "Room not found");
}

#[tokio::test]
async fn test_unaffiliated_noise_is_ignored() {
    let (hub, addr) = start_server().await;
    let (code, _token) = hub.create_room("noisy");

    let mut client = connect(addr).await;

    // Garbage and non-join messages before joining: silently dropped,
    // the connection stays usable.
    client
        .send(Message::Text("this is not even json".into()))
        .await
        .unwrap();
    send_json(
        &mut client,
        serde_json::json!({ "type": "GUESS", "payload": {} }),
    )
    .await;

    send_json(&mut client, join_message(&code, "ada", None)).await;
    expect_event(&mut client, "GAME_PAUSED").await;
    expect_event(&mut client, "JOIN_SUCCESS").await;
}

#[tokio::test]
async fn test_close_room_reaches_every_member() {
    let (hub, addr) = start_server().await;
    let (code, token) = hub.create_room("closing");

    let mut host = connect(addr).await;
    send_json(&mut host, join_message(&code, "host", Some(&token))).await;
    expect_event(&mut host, "JOIN_SUCCESS").await;

    let mut player = connect(addr).await;
    send_json(&mut player, join_message(&code, "ada", None)).await;
    expect_event(&mut player, "JOIN_SUCCESS").await;
    expect_event(&mut host, "PLAYER_JOINED").await;

    send_json(&mut host, serde_json::json!({ "type": "CLOSE_ROOM" })).await;

    expect_event(&mut host, "ROOM_CLOSED").await;
    expect_event(&mut player, "ROOM_CLOSED").await;

    // The registry entry is gone shortly after.
    for _ in 0..100 {
        if hub.room_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room was never unregistered");
}

#[tokio::test]
async fn test_socket_close_announces_disconnect() {
    let (hub, addr) = start_server().await;
    let (code, token) = hub.create_room("dropsy");

    let mut host = connect(addr).await;
    send_json(&mut host, join_message(&code, "host", Some(&token))).await;
    expect_event(&mut host, "JOIN_SUCCESS").await;

    let mut player = connect(addr).await;
    send_json(&mut player, join_message(&code, "ada", None)).await;
    expect_event(&mut player, "JOIN_SUCCESS").await;
    expect_event(&mut host, "PLAYER_JOINED").await;

    // The player's connection drops without a LEAVE_ROOM.
    player.close(None).await.unwrap();

    let event = expect_event(&mut host, "PLAYER_DISCONNECTED").await;
    assert_eq!(event["payload"]["nickname"], "ada");
}

#[tokio::test]
async fn test_oversized_message_tears_connection_down() {
    let config = ConnectionConfig {
        max_message_size: 1024,
        ..ConnectionConfig::default()
    };
    let (hub, addr) = start_server_with(config).await;
    let (code, token) = hub.create_room("limits");

    let mut host = connect(addr).await;
    send_json(&mut host, join_message(&code, "host", Some(&token))).await;
    expect_event(&mut host, "JOIN_SUCCESS").await;

    let mut player = connect(addr).await;
    send_json(&mut player, join_message(&code, "ada", None)).await;
    expect_event(&mut player, "JOIN_SUCCESS").await;
    expect_event(&mut host, "PLAYER_JOINED").await;

    // Blow past the limit: the relay must kill the connection, not
    // relay or buffer the message.
    let huge = "x".repeat(4 * 1024);
    send_json(
        &mut player,
        serde_json::json!({ "type": "GUESS", "payload": {"word": huge} }),
    )
    .await;

    let event = expect_event(&mut host, "PLAYER_DISCONNECTED").await;
    assert_eq!(event["payload"]["nickname"], "ada");
}
