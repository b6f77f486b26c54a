//! # Sketchrelay
//!
//! Session relay backend for multiplayer drawing/guessing games: many
//! independent rooms, each with one authoritative host and several
//! players over persistent WebSocket connections. The relay routes
//! opaque game messages between a room's members, gates joins on the
//! in-flight game phase, keeps identities alive across transient
//! disconnects, and reclaims abandoned rooms.
//!
//! The server itself never interprets game content; the host is the
//! single source of game-state truth, and the relay is plumbing.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sketchrelay::RelayServer;
//!
//! # async fn run() -> Result<(), sketchrelay::RelayError> {
//! let server = RelayServer::builder().bind("0.0.0.0:8000").build().await?;
//! let (code, host_token) = server.hub().create_room("friday doodles");
//! // Hand `code` to players and `host_token` to the host out-of-band,
//! // then serve connections:
//! server.run().await
//! # }
//! ```

mod client;
mod error;
mod server;

pub use client::ConnectionConfig;
pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};

pub use sketchrelay_protocol::{RoomSummary, ServerEvent};
pub use sketchrelay_room::{Hub, RoomConfig};
