//! Minimal parsing of client traffic.
//!
//! The relay deliberately does not model client messages as a typed
//! enum: apart from four recognized `type` tags, everything a client
//! sends is opaque and forwarded verbatim. These probes pull out only
//! the fields the core inspects and tolerate arbitrary extra content.

use serde::Deserialize;

/// Join request, the only message a connection may send before it is
/// affiliated with a room.
pub const JOIN_ROOM: &str = "JOIN_ROOM";
/// Host-only: close the room and notify every member.
pub const CLOSE_ROOM: &str = "CLOSE_ROOM";
/// Player-only: leave intentionally (no reconnection reservation).
pub const LEAVE_ROOM: &str = "LEAVE_ROOM";
/// Host-only: opaque state broadcast whose `phase` field gates joins.
pub const GAME_STATE_UPDATE: &str = "GAME_STATE_UPDATE";

#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: String,
}

/// Extracts the `type` tag from a raw message.
///
/// Returns `None` for anything that is not a JSON object with a string
/// `type` field; the caller treats that as noise, not an error.
pub fn message_type(data: &[u8]) -> Option<String> {
    serde_json::from_slice::<TypeProbe>(data)
        .ok()
        .map(|p| p.kind)
}

// ---------------------------------------------------------------------------
// JOIN_ROOM payload
// ---------------------------------------------------------------------------

/// The payload of a `JOIN_ROOM` message.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    /// Public code of the room to join.
    pub room_code: String,
    /// Requested display identity.
    pub nickname: String,
    /// Host secret, present only when the client claims host identity.
    #[serde(default)]
    pub host_token: Option<String>,
}

#[derive(Deserialize)]
struct JoinProbe {
    payload: JoinPayload,
}

impl JoinPayload {
    /// Parses the payload out of a raw `JOIN_ROOM` envelope.
    ///
    /// The caller has already matched the `type` tag; a malformed or
    /// missing payload yields `None` and the message is ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        serde_json::from_slice::<JoinProbe>(data)
            .ok()
            .map(|p| p.payload)
    }
}

// ---------------------------------------------------------------------------
// GAME_STATE_UPDATE phase extraction
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
struct PhaseProbe {
    #[serde(default)]
    payload: PhasePayload,
}

#[derive(Default, Deserialize)]
struct PhasePayload {
    #[serde(default)]
    game_state: GameStateProbe,
}

#[derive(Default, Deserialize)]
struct GameStateProbe {
    #[serde(default)]
    phase: String,
}

/// Pulls the `payload.game_state.phase` field out of a raw
/// `GAME_STATE_UPDATE` envelope.
///
/// Everything else in the payload is game content the relay never
/// looks at. Returns `None` when the field is absent or empty, so a
/// state update without a phase leaves the room's phase untouched.
pub fn extract_phase(data: &[u8]) -> Option<String> {
    let probe: PhaseProbe = serde_json::from_slice(data).ok()?;
    let phase = probe.payload.game_state.phase;
    if phase.is_empty() { None } else { Some(phase) }
}

// =========================================================================
// Tests
// =========================================================================
