//! Timer lifecycle events

use std::sync::Arc;

use crate::scanner::Declaration;

/// Everything the session can announce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A plan began counting down
    Start { declaration: Arc<Declaration> },
    /// One tick of the active entry
    Interval {
        remaining: u64,
        duration: u64,
        step: String,
        symbol: Option<String>,
        declaration: Arc<Declaration>,
    },
    /// The plan moved into a new repetition
    Step {
        step: String,
        symbol: Option<String>,
        declaration: Arc<Declaration>,
    },
    /// The last entry reached zero
    Finish { declaration: Arc<Declaration> },
    /// The running plan was discarded
    Cancel,
}

impl TimerEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            TimerEvent::Start { .. } => "start",
            TimerEvent::Interval { .. } => "interval",
            TimerEvent::Step { .. } => "step",
            TimerEvent::Finish { .. } => "finish",
            TimerEvent::Cancel => "cancel",
        }
    }

    /// The declaration this event belongs to, if any
    pub fn declaration(&self) -> Option<&Declaration> {
        match self {
            TimerEvent::Start { declaration }
            | TimerEvent::Interval { declaration, .. }
            | TimerEvent::Step { declaration, .. }
            | TimerEvent::Finish { declaration } => Some(declaration),
            TimerEvent::Cancel => None,
        }
    }
}
