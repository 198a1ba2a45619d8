//! Broadcast sink - mirrors timer ticks to remote listeners
//!
//! ```text
//!   Scheduler ──emit──► EventBus (tokio::sync::broadcast)
//!                          │
//!            ┌─────────────┼──────────────┐
//!            ▼             ▼              ▼
//!      BroadcastServer  EventLogger   (tests, status)
//!      TCP, JSON lines  events.jsonl
//! ```
//!
//! Only `interval`, `step` and `finish` cross the bus. Each is serialized as
//! `{"type": ..., ...fields, "content": <declaration label>}`.

mod bus;
mod client;
mod config;
mod logger;
mod server;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter};
pub use client::BroadcastClient;
pub use config::BroadcastConfig;
pub use logger::{EventLogger, read_event_log, spawn_event_logger};
pub use server::BroadcastServer;
pub use types::{BroadcastEvent, EventLogEntry};
