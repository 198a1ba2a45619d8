//! Message types for the timer service

use thiserror::Error;
use tokio::sync::oneshot;

use super::handlers::EventHandlers;
use super::state::SessionSnapshot;

/// Errors from talking to the timer service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Timer service channel closed")]
    ChannelClosed,

    #[error("Timer service dropped the reply")]
    ReplyDropped,
}

pub type ServiceResponse<T> = Result<T, ServiceError>;

/// Commands sent to the timer service task
#[derive(Debug)]
pub enum ServiceCommand {
    /// Rescan a document's text
    Evaluate {
        text: String,
        document_id: String,
        handlers: EventHandlers,
        reply: oneshot::Sender<SessionSnapshot>,
    },

    /// Discard the running plan
    Stop { reply: oneshot::Sender<SessionSnapshot> },

    /// Restart the latest declaration
    Retry { reply: oneshot::Sender<SessionSnapshot> },

    /// Read the current session state
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },

    /// Stop the service task
    Shutdown,
}
