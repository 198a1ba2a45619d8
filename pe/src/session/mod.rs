//! Timer session - the single active countdown and its state machine
//!
//! Layers, innermost first:
//!
//! - [`Session`] is a plain value. Every transition consumes it and returns the
//!   next session plus the events to emit, so the state machine is testable
//!   without clocks or callbacks.
//! - [`Scheduler`] owns the session, routes events to [`EventHandlers`] and
//!   mirrors them onto the broadcast bus.
//! - [`TimerService`] is the actor that owns a `Scheduler` and drives the
//!   one-second tick. [`TimerHandle`] is the cloneable front door.

mod config;
mod events;
mod handlers;
mod messages;
mod scheduler;
mod service;
mod state;

pub use config::TimerConfig;
pub use events::TimerEvent;
pub use handlers::EventHandlers;
pub use messages::{ServiceCommand, ServiceError, ServiceResponse};
pub use scheduler::Scheduler;
pub use service::{TimerHandle, TimerService};
pub use state::{Phase, Session, SessionSnapshot, TimerControl, Transition};
