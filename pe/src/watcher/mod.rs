//! Document watcher - feeds file contents to the timer on every change
//!
//! The `DocumentWatcher` polls one file and sends its full text whenever it
//! differs from the last text seen. A missing file reads as empty text, so
//! deleting the file cancels its timer like deleting the line would.

mod config;
mod document_watcher;

pub use config::WatchConfig;
pub use document_watcher::{DocumentChange, DocumentWatcher, document_id_for};
