//! TCP broadcast server
//!
//! Every accepted connection gets its own bus subscription and receives each
//! event as one JSON line. Clients never send anything.

use std::net::SocketAddr;
use std::sync::Arc;

use eyre::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::bus::EventBus;
use super::types::BroadcastEvent;

/// Bound listener streaming bus events to connected clients
pub struct BroadcastServer {
    listener: TcpListener,
}

impl BroadcastServer {
    /// Bind the listener; use port 0 for an ephemeral port
    pub async fn bind(addr: &str) -> Result<Self> {
        debug!(%addr, "BroadcastServer::bind: called");
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind broadcast listener on {}", addr))?;
        info!(addr = %listener.local_addr()?, "Broadcast listener bound");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("Failed to read listener address")
    }

    /// Accept clients until the task is dropped
    pub async fn run(self, event_bus: Arc<EventBus>) {
        debug!("BroadcastServer::run: accepting clients");
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "Broadcast client connected");
                    let rx = event_bus.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = serve_client(stream, rx).await {
                            debug!(%peer, error = %e, "serve_client: connection ended");
                        }
                        info!(%peer, "Broadcast client disconnected");
                    });
                }
                Err(e) => {
                    warn!(error = %e, "BroadcastServer: accept failed");
                }
            }
        }
    }
}

async fn serve_client(mut stream: TcpStream, mut rx: broadcast::Receiver<BroadcastEvent>) -> Result<()> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                send_event(&mut stream, &event).await?;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "serve_client: client lagged behind, missed events");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("serve_client: bus closed");
                return Ok(());
            }
        }
    }
}

/// Write one event as a JSON line
async fn send_event(stream: &mut TcpStream, event: &BroadcastEvent) -> Result<()> {
    let json = serde_json::to_string(event).context("Failed to serialize event")?;
    stream
        .write_all(json.as_bytes())
        .await
        .context("Failed to write event")?;
    stream.write_all(b"\n").await.context("Failed to write newline")?;
    stream.flush().await.context("Failed to flush event")?;
    Ok(())
}
