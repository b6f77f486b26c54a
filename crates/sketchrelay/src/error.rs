//! Unified error type for the relay server.

use sketchrelay_protocol::ProtocolError;
use sketchrelay_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// Users of the `sketchrelay` crate deal with this single type; the
/// `#[from]` impls let `?` lift sub-crate errors automatically. Note
/// how little flows through here: inside the relay, delivery and
/// encode failures are handled in place (drop the message, tear down
/// the connection) rather than escalated.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchrelay_protocol::Codec;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::MessageTooLarge {
            size: 10,
            limit: 5,
        };
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Transport(_)));
        assert!(relay_err.to_string().contains("10"));
    }

    #[test]
    fn test_from_protocol_error() {
        let bad: Result<sketchrelay_protocol::ServerEvent, _> =
            sketchrelay_protocol::JsonCodec.decode(b"{{{");
        let err = bad.unwrap_err();
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Protocol(_)));
    }
}
