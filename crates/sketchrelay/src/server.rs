//! `RelayServer` builder and accept loop.
//!
//! Ties the layers together: transport → connection actors → hub →
//! rooms. The surrounding application owns request routing and static
//! assets; this server only accepts WebSocket connections and exposes
//! the hub for the HTTP-style entry points (create/list rooms).

use std::sync::Arc;

use sketchrelay_room::{spawn_hub, Hub, RoomConfig};
use sketchrelay_transport::WsListener;

use crate::client::{spawn_client, ConnectionConfig};
use crate::RelayError;

/// Builder for configuring and starting a relay server.
pub struct RelayServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    connection_config: ConnectionConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            room_config: RoomConfig::default(),
            connection_config: ConnectionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the room timing configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Overrides the connection keepalive/queue configuration.
    pub fn connection_config(mut self, config: ConnectionConfig) -> Self {
        self.connection_config = config;
        self
    }

    /// Binds the listener and starts the hub.
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let listener = WsListener::bind(&self.bind_addr)
            .await?
            .max_message_size(self.connection_config.max_message_size);
        let hub = spawn_hub(self.room_config);

        Ok(RelayServer {
            listener,
            hub,
            connection_config: self.connection_config,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    listener: WsListener,
    hub: Arc<Hub>,
    connection_config: ConnectionConfig,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// The room registry. This is where collaborators mint rooms
    /// ([`Hub::create_room`]) and snapshot listings
    /// ([`Hub::list_rooms`]), typically behind HTTP endpoints owned
    /// by the surrounding application.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop, spawning a connection actor per accepted
    /// socket. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("sketchrelay server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    spawn_client(
                        conn,
                        Arc::clone(&self.hub),
                        self.connection_config.clone(),
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
