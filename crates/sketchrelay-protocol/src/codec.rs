//! Codec trait and the JSON implementation.
//!
//! The relay core only needs "turn a server event into bytes" and, in
//! tests, the reverse. Keeping it behind a trait means a binary codec
//! can be swapped in at the server boundary without touching the rooms.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust types to wire bytes and back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON codec via `serde_json`.
///
/// The envelope format is JSON on the wire, so this is the codec the
/// relay ships with; it is also what makes messages inspectable in
/// browser DevTools, which matters for a web game.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
