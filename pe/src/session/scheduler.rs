//! Scheduler - owns the session and routes its events
//!
//! `Start` and `Cancel` produced by a rescan go to the handlers passed with that
//! rescan. Tick events go to the handlers bound when the running plan was
//! adopted, and are mirrored onto the broadcast bus when one is attached.

use std::mem;

use tracing::debug;

use super::events::TimerEvent;
use super::handlers::EventHandlers;
use super::state::{Session, SessionSnapshot, TimerControl, Transition};
use crate::broadcast::EventEmitter;
use crate::scanner::scan;

/// Synchronous scheduler around the single [`Session`]
#[derive(Debug, Default)]
pub struct Scheduler {
    session: Session,
    bound: EventHandlers,
    emitter: Option<EventEmitter>,
}

impl Scheduler {
    pub fn new(loop_cap: u32) -> Self {
        Self {
            session: Session::new(loop_cap),
            bound: EventHandlers::default(),
            emitter: None,
        }
    }

    /// Mirror tick events onto a broadcast bus
    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Scan `text` and update the session
    pub fn evaluate(&mut self, text: &str, document_id: &str, handlers: &EventHandlers) -> TimerControl {
        debug!(%document_id, len = text.len(), "Scheduler::evaluate: called");
        let found = scan(text, document_id);
        let transition = mem::take(&mut self.session).evaluate(found, document_id);
        self.apply(transition, Some(handlers))
    }

    /// Deliver one tick of plan generation `generation`
    pub fn tick(&mut self, generation: u64) -> TimerControl {
        let transition = mem::take(&mut self.session).tick(generation);
        self.apply(transition, None)
    }

    pub fn stop_timer(&mut self) -> TimerControl {
        debug!("Scheduler::stop_timer: called");
        let transition = mem::take(&mut self.session).stop();
        self.apply(transition, None)
    }

    pub fn retry_latest(&mut self) -> TimerControl {
        debug!("Scheduler::retry_latest: called");
        let transition = mem::take(&mut self.session).retry_latest();
        self.apply(transition, None)
    }

    fn apply(&mut self, transition: Transition, caller: Option<&EventHandlers>) -> TimerControl {
        let Transition {
            session,
            events,
            timer,
            adopted,
        } = transition;
        self.session = session;

        // Cancel for the previous plan must reach the caller before rebinding
        for event in &events {
            match event {
                TimerEvent::Start { .. } | TimerEvent::Cancel => match caller {
                    Some(handlers) => handlers.dispatch(event),
                    None => self.bound.dispatch(event),
                },
                TimerEvent::Interval { .. } | TimerEvent::Step { .. } | TimerEvent::Finish { .. } => {
                    self.bound.dispatch(event);
                    if let Some(emitter) = &self.emitter {
                        emitter.timer_event(event);
                    }
                }
            }
        }

        if adopted && let Some(handlers) = caller {
            self.bound = handlers.clone();
        }

        timer
    }
}
