//! Wire types for broadcast events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::TimerEvent;

/// A timer event as seen by remote listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastEvent {
    Interval {
        remaining: u64,
        duration: u64,
        step: String,
        symbol: Option<String>,
        content: String,
    },
    Step {
        step: String,
        symbol: Option<String>,
        content: String,
    },
    Finish {
        content: String,
    },
}

impl BroadcastEvent {
    /// Convert a timer event; `start` and `cancel` are not broadcast
    pub fn from_timer_event(event: &TimerEvent) -> Option<Self> {
        match event {
            TimerEvent::Interval {
                remaining,
                duration,
                step,
                symbol,
                declaration,
            } => Some(BroadcastEvent::Interval {
                remaining: *remaining,
                duration: *duration,
                step: step.clone(),
                symbol: symbol.clone(),
                content: declaration.label.clone(),
            }),
            TimerEvent::Step {
                step,
                symbol,
                declaration,
            } => Some(BroadcastEvent::Step {
                step: step.clone(),
                symbol: symbol.clone(),
                content: declaration.label.clone(),
            }),
            TimerEvent::Finish { declaration } => Some(BroadcastEvent::Finish {
                content: declaration.label.clone(),
            }),
            TimerEvent::Start { .. } | TimerEvent::Cancel => None,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            BroadcastEvent::Interval { .. } => "interval",
            BroadcastEvent::Step { .. } => "step",
            BroadcastEvent::Finish { .. } => "finish",
        }
    }

    /// The label of the declaration the event belongs to
    pub fn content(&self) -> &str {
        match self {
            BroadcastEvent::Interval { content, .. }
            | BroadcastEvent::Step { content, .. }
            | BroadcastEvent::Finish { content } => content,
        }
    }
}

/// A timestamped event log entry for file persistence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub event: BroadcastEvent,
}

impl EventLogEntry {
    /// Create a new log entry with current timestamp
    pub fn new(event: BroadcastEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}
