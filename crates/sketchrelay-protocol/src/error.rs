//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// Encode failures inside the relay are non-fatal by design: the send
/// is skipped and the room keeps running. Decode failures on inbound
/// traffic are equally benign: unparseable client bytes are ignored
/// (unaffiliated) or relayed opaquely (affiliated).
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a
    /// shape mismatch.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
