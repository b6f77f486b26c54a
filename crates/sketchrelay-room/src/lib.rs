//! Room registry and the per-room relay actor for Sketchrelay.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! membership, join policy, relay routing, and idle-timeout cleanup.
//! The [`Hub`] is the process-wide registry: it mints collision-free
//! room codes, routes join requests to the right room, and drops a
//! room's entry when its actor exits.
//!
//! # Key types
//!
//! - [`Hub`] / [`spawn_hub`]: registry + hub event loop
//! - [`RoomEvent`] / [`RoomSender`]: the per-room actor's inbox
//! - [`ClientHandle`]: how rooms deliver to a connection (best-effort,
//!   drop-on-full)
//! - [`CodeGenerator`]: unpredictable 6-digit room codes
//! - [`RoomConfig`]: grace periods and queue sizes

mod client;
mod codes;
mod config;
mod hub;
mod room;

pub use client::{ClientControl, ClientHandle, OutboundSender};
pub use codes::{host_token, CodeGenerator};
pub use config::RoomConfig;
pub use hub::{spawn_hub, Hub, HubEvent};
pub use room::{
    JoinRequest, RoomEvent, RoomSender, PHASE_GAME_OVER, PHASE_LOBBY,
};
