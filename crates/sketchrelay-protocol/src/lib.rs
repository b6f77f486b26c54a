//! Wire protocol for Sketchrelay.
//!
//! Every message on the wire is a JSON envelope with a `type` tag and a
//! type-specific `payload`. This crate defines both sides of that
//! contract as the relay core sees it:
//!
//! - **Server events** ([`ServerEvent`]): the notifications the relay
//!   originates (`JOIN_SUCCESS`, `PLAYER_LEFT`, `ROOM_CLOSED`, ...).
//! - **Inbound probes** ([`message_type`], [`JoinPayload`],
//!   [`extract_phase`]): the *minimal* parse of client traffic. The
//!   relay never interprets game content; it reads the `type` tag, the
//!   join payload, and the one phase field that gates joins. Everything
//!   else stays opaque bytes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how server events
//!   become bytes.
//! - **Errors** ([`ProtocolError`]).

mod codec;
mod error;
mod probe;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use probe::{
    extract_phase, message_type, JoinPayload, CLOSE_ROOM, GAME_STATE_UPDATE,
    JOIN_ROOM, LEAVE_ROOM,
};
pub use types::{PlayerEntry, RoomSummary, ServerEvent};
