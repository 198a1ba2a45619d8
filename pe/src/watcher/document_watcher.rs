//! Polling watcher for a single document

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::config::WatchConfig;

/// New contents of a watched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub document_id: String,
    pub text: String,
}

/// Document identity for `path`: its canonical form when it resolves
pub fn document_id_for(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Polls one file and reports every change of its text
pub struct DocumentWatcher {
    config: WatchConfig,
    path: PathBuf,
    document_id: String,
    tx: mpsc::Sender<DocumentChange>,
    last_text: Option<String>,
}

impl DocumentWatcher {
    pub fn new(config: WatchConfig, path: impl Into<PathBuf>, tx: mpsc::Sender<DocumentChange>) -> Self {
        let path = path.into();
        let document_id = document_id_for(&path);
        debug!(%document_id, "DocumentWatcher::new: called");
        Self {
            config,
            path,
            document_id,
            tx,
            last_text: None,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    async fn read_text(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    /// Read the file once and send it if it changed; the first read always sends
    ///
    /// Returns whether a change was sent.
    pub async fn check_once(&mut self) -> Result<bool> {
        let text = self.read_text().await?;
        if self.last_text.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }

        debug!(document_id = %self.document_id, len = text.len(), "DocumentWatcher: document changed");
        self.tx
            .send(DocumentChange {
                document_id: self.document_id.clone(),
                text: text.clone(),
            })
            .await
            .map_err(|_| eyre::eyre!("Document change channel closed"))?;
        self.last_text = Some(text);
        Ok(true)
    }

    /// Poll until the receiving side goes away
    pub async fn run(mut self) -> Result<()> {
        info!(
            path = %self.path.display(),
            interval_ms = self.config.poll_interval_ms,
            "DocumentWatcher started"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval());
        loop {
            interval.tick().await;
            if self.tx.is_closed() {
                debug!("DocumentWatcher: receiver dropped, stopping");
                return Ok(());
            }
            if let Err(e) = self.check_once().await {
                error!(error = %e, "Error checking document");
            }
        }
    }
}
