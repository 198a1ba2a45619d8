//! Client side of the broadcast sink, used by `pe listen`

use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::types::BroadcastEvent;

/// Default timeout for connecting
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to a running broadcast sink
pub struct BroadcastClient {
    lines: Lines<BufReader<TcpStream>>,
}

impl BroadcastClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_TIMEOUT).await
    }

    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        debug!(%addr, ?timeout, "BroadcastClient::connect: called");
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .context("Connection timeout")?
            .with_context(|| format!("Failed to connect to broadcast sink at {}", addr))?;
        Ok(Self {
            lines: BufReader::new(stream).lines(),
        })
    }

    /// Wait for the next event; `None` once the server closes the connection
    ///
    /// Lines that do not decode are logged and skipped.
    pub async fn next_event(&mut self) -> Result<Option<BroadcastEvent>> {
        loop {
            let Some(line) = self.lines.next_line().await.context("Failed to read event")? else {
                debug!("BroadcastClient: connection closed");
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BroadcastEvent>(&line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => warn!(%line, error = %e, "BroadcastClient: skipping undecodable line"),
            }
        }
    }
}
