//! Server-originated wire types.
//!
//! These are the structures the relay serializes and pushes to clients.
//! The serde attributes are load-bearing: the adjacent tagging
//! (`tag = "type", content = "payload"`) plus SCREAMING_SNAKE_CASE
//! renaming is what produces the `{"type": ..., "payload": ...}`
//! envelope the client SDK expects.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PlayerEntry
// ---------------------------------------------------------------------------

/// One row of the player list sent in [`ServerEvent::JoinSuccess`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// The player's display identity, unique among connected members.
    pub nickname: String,
    /// Whether this member is the room's authoritative host.
    pub is_host: bool,
}

// ---------------------------------------------------------------------------
// RoomSummary
// ---------------------------------------------------------------------------

/// A snapshot row returned by room listings.
///
/// The member count is best-effort: it is published by the room actor
/// and read without consulting the actor, so it can lag by an event or
/// two. Good enough for a lobby browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Public 6-digit room code.
    pub code: String,
    /// Display name chosen at creation.
    pub name: String,
    /// Number of currently connected members.
    pub member_count: usize,
}

// ---------------------------------------------------------------------------
// ServerEvent: every notification the relay originates
// ---------------------------------------------------------------------------

/// Messages the relay sends to clients.
///
/// Serialized as `{"type": "<TAG>", "payload": {...}}`; variants without
/// fields omit the `payload` key entirely. Clients dispatch on the tag,
/// so the exact tag strings are part of the wire contract, hence the
/// SCREAMING_SNAKE_CASE rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// Something about the last request was wrong: unknown room code,
    /// taken nickname, join-restricted phase.
    Error { message: String },

    /// Reply to the joiner after admission. `host_token` is only
    /// present when the joiner proved host identity; it must never
    /// reach other members.
    JoinSuccess {
        room_code: String,
        is_host: bool,
        nickname: String,
        players: Vec<PlayerEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host_token: Option<String>,
    },

    /// Broadcast to existing members when someone is admitted.
    PlayerJoined { nickname: String, is_host: bool },

    /// Broadcast when a member leaves intentionally (`LEAVE_ROOM`).
    PlayerLeft { nickname: String },

    /// Broadcast when a member's connection drops. The nickname stays
    /// reserved for reconnection until the grace period expires.
    PlayerDisconnected { nickname: String },

    /// Broadcast when a previously-dropped member reconnects, so the
    /// host can resend game state.
    PlayerReconnected { nickname: String },

    /// The host's connection dropped. Relay toward the host is
    /// suspended until they return; the room does not close.
    HostDisconnected,

    /// The host reconnected with a valid token.
    HostReconnected,

    /// Sent to a joiner admitted while no host is connected: nothing
    /// will flow until the host returns.
    GamePaused,

    /// Ack to the client that sent `LEAVE_ROOM`.
    LeftRoom,

    /// The host closed the room; the code is no longer resolvable.
    RoomClosed,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The envelope shapes are the wire contract; a serde attribute
    //! regression here breaks every client, so each shape is pinned.

    use super::*;

    #[test]
    fn test_error_event_json_shape() {
        let ev = ServerEvent::Error {
            message: "Room not found".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "ERROR");
        assert_eq!(json["payload"]["message"], "Room not found");
    }

    #[test]
    fn test_join_success_includes_token_for_host() {
        let ev = ServerEvent::JoinSuccess {
            room_code: "123456".into(),
            is_host: true,
            nickname: "ada".into(),
            players: vec![PlayerEntry {
                nickname: "ada".into(),
                is_host: true,
            }],
            host_token: Some("deadbeef".into()),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "JOIN_SUCCESS");
        assert_eq!(json["payload"]["room_code"], "123456");
        assert_eq!(json["payload"]["is_host"], true);
        assert_eq!(json["payload"]["host_token"], "deadbeef");
        assert_eq!(json["payload"]["players"][0]["nickname"], "ada");
    }

    #[test]
    fn test_join_success_omits_token_for_players() {
        let ev = ServerEvent::JoinSuccess {
            room_code: "123456".into(),
            is_host: false,
            nickname: "bob".into(),
            players: vec![],
            host_token: None,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        // The token key must be absent, not null: non-host clients
        // never see the secret in any form.
        assert!(json["payload"].get("host_token").is_none());
    }

    #[test]
    fn test_unit_events_have_no_payload() {
        for (ev, tag) in [
            (ServerEvent::HostDisconnected, "HOST_DISCONNECTED"),
            (ServerEvent::HostReconnected, "HOST_RECONNECTED"),
            (ServerEvent::GamePaused, "GAME_PAUSED"),
            (ServerEvent::LeftRoom, "LEFT_ROOM"),
            (ServerEvent::RoomClosed, "ROOM_CLOSED"),
        ] {
            let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
            assert_eq!(json["type"], tag);
            assert!(json.get("payload").is_none(), "{tag} should carry no payload");
        }
    }

    #[test]
    fn test_player_events_json_shape() {
        let ev = ServerEvent::PlayerDisconnected {
            nickname: "carol".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "PLAYER_DISCONNECTED");
        assert_eq!(json["payload"]["nickname"], "carol");

        let ev = ServerEvent::PlayerJoined {
            nickname: "dave".into(),
            is_host: false,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "PLAYER_JOINED");
        assert_eq!(json["payload"]["is_host"], false);
    }

    #[test]
    fn test_server_event_round_trip() {
        let ev = ServerEvent::PlayerReconnected {
            nickname: "eve".into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_room_summary_round_trip() {
        let summary = RoomSummary {
            code: "042917".into(),
            name: "friday doodles".into(),
            member_count: 3,
        };
        let bytes = serde_json::to_vec(&summary).unwrap();
        let decoded: RoomSummary = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary, decoded);
    }
}
