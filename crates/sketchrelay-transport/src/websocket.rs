//! WebSocket listener and split connection halves, via `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Maximum inbound message size unless overridden: 512 KiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512 * 1024;

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// One inbound unit from the peer.
///
/// Ping/pong frames are surfaced (rather than swallowed) so the read
/// pump can treat them as liveness evidence; pings are additionally
/// answered by tungstenite itself on the next write flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A data message (binary or text), as raw bytes.
    Data(Vec<u8>),
    /// The peer probed us.
    Ping,
    /// The peer answered one of our probes.
    Pong,
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Accepts incoming WebSocket connections on a TCP listener.
pub struct WsListener {
    listener: TcpListener,
    max_message_size: usize,
}

impl WsListener {
    /// Binds to the given address with the default message-size limit.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self {
            listener,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        })
    }

    /// Overrides the per-message inbound size limit.
    pub fn max_message_size(mut self, limit: usize) -> Self {
        self.max_message_size = limit;
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and upgrades the next incoming connection.
    pub async fn accept(&mut self) -> Result<WsConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id =
            ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        Ok(WsConnection {
            id,
            ws,
            max_message_size: self.max_message_size,
        })
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// An accepted connection, not yet split into its two pump halves.
pub struct WsConnection {
    id: ConnectionId,
    ws: WsStream,
    max_message_size: usize,
}

impl WsConnection {
    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Splits the connection into independently owned halves.
    pub fn into_split(self) -> (WsSender, WsReceiver) {
        let (sink, stream) = self.ws.split();
        (
            WsSender { id: self.id, sink },
            WsReceiver {
                id: self.id,
                stream,
                max_message_size: self.max_message_size,
            },
        )
    }
}

/// The write half of a connection. Owned by the write pump.
pub struct WsSender {
    id: ConnectionId,
    sink: SplitSink<WsStream, Message>,
}

impl WsSender {
    /// Returns the connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends a data message to the peer.
    pub async fn send(&mut self, data: Vec<u8>) -> Result<(), TransportError> {
        self.sink
            .send(Message::Binary(data.into()))
            .await
            .map_err(send_failed)
    }

    /// Sends a keepalive probe.
    pub async fn ping(&mut self) -> Result<(), TransportError> {
        self.sink
            .send(Message::Ping(Vec::new().into()))
            .await
            .map_err(send_failed)
    }

    /// Closes the connection. The peer (and our own read half) will
    /// observe end-of-stream.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink.close().await.map_err(send_failed)
    }
}

/// The read half of a connection. Owned by the read pump.
pub struct WsReceiver {
    id: ConnectionId,
    stream: SplitStream<WsStream>,
    max_message_size: usize,
}

impl WsReceiver {
    /// Returns the connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Receives the next frame from the peer.
    ///
    /// Returns `Ok(None)` on clean close. A data message larger than
    /// the configured limit yields [`TransportError::MessageTooLarge`];
    /// the caller is expected to tear the connection down.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return self.bounded(data.into());
                }
                Some(Ok(Message::Text(text))) => {
                    return self.bounded(text.as_bytes().to_vec());
                }
                Some(Ok(Message::Ping(_))) => return Ok(Some(Frame::Ping)),
                Some(Ok(Message::Pong(_))) => return Ok(Some(Frame::Pong)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // raw frame fragments
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(std::io::ErrorKind::ConnectionReset, e),
                    ));
                }
            }
        }
    }

    fn bounded(&self, data: Vec<u8>) -> Result<Option<Frame>, TransportError> {
        if data.len() > self.max_message_size {
            tracing::warn!(
                id = %self.id,
                size = data.len(),
                limit = self.max_message_size,
                "oversized message"
            );
            return Err(TransportError::MessageTooLarge {
                size: data.len(),
                limit: self.max_message_size,
            });
        }
        Ok(Some(Frame::Data(data)))
    }
}

fn send_failed(e: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::SendFailed(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        e,
    ))
}
