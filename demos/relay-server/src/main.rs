//! Minimal relay server: binds, mints one bootstrap room, and serves.
//!
//! In a full deployment the surrounding application exposes
//! `hub().create_room()` and `hub().list_rooms()` behind HTTP endpoints
//! and serves the game's static assets; here the room code and host
//! token are just logged so two browser tabs can play.
//!
//! ```text
//! RUST_LOG=debug cargo run -p relay-server -- 127.0.0.1:8000
//! ```

use sketchrelay::RelayServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8000".to_string());

    let server = RelayServer::builder().bind(&addr).build().await?;

    let (code, host_token) = server.hub().create_room("demo room");
    tracing::info!(%code, %host_token, "bootstrap room ready");

    server.run().await?;
    Ok(())
}
