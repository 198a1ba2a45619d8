//! Event handler capability record

use std::fmt;
use std::sync::Arc;

use super::events::TimerEvent;
use crate::scanner::Declaration;

type StartFn = Arc<dyn Fn(&Declaration) + Send + Sync>;
type IntervalFn = Arc<dyn Fn(u64, u64, &str, Option<&str>, &Declaration) + Send + Sync>;
type StepFn = Arc<dyn Fn(&str, Option<&str>, &Declaration) + Send + Sync>;
type FinishFn = Arc<dyn Fn(&Declaration) + Send + Sync>;
type CancelFn = Arc<dyn Fn() + Send + Sync>;

/// Callbacks for timer events, each independently optional
///
/// Handlers are cheap to clone; the scheduler keeps a copy bound to the
/// running plan so ticks reach whoever started it.
#[derive(Clone, Default)]
pub struct EventHandlers {
    start: Option<StartFn>,
    interval: Option<IntervalFn>,
    step: Option<StepFn>,
    finish: Option<FinishFn>,
    cancel: Option<CancelFn>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// `start(declaration)`
    pub fn on_start(mut self, f: impl Fn(&Declaration) + Send + Sync + 'static) -> Self {
        self.start = Some(Arc::new(f));
        self
    }

    /// `interval(remaining, duration, step, symbol, declaration)`
    pub fn on_interval(mut self, f: impl Fn(u64, u64, &str, Option<&str>, &Declaration) + Send + Sync + 'static) -> Self {
        self.interval = Some(Arc::new(f));
        self
    }

    /// `step(step, symbol, declaration)`
    pub fn on_step(mut self, f: impl Fn(&str, Option<&str>, &Declaration) + Send + Sync + 'static) -> Self {
        self.step = Some(Arc::new(f));
        self
    }

    /// `finish(declaration)`
    pub fn on_finish(mut self, f: impl Fn(&Declaration) + Send + Sync + 'static) -> Self {
        self.finish = Some(Arc::new(f));
        self
    }

    /// `cancel()`
    pub fn on_cancel(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.cancel = Some(Arc::new(f));
        self
    }

    /// Call the handler matching `event`, if one is set
    pub fn dispatch(&self, event: &TimerEvent) {
        match event {
            TimerEvent::Start { declaration } => {
                if let Some(f) = &self.start {
                    f(declaration.as_ref());
                }
            }
            TimerEvent::Interval {
                remaining,
                duration,
                step,
                symbol,
                declaration,
            } => {
                if let Some(f) = &self.interval {
                    f(*remaining, *duration, step.as_str(), symbol.as_deref(), declaration.as_ref());
                }
            }
            TimerEvent::Step {
                step,
                symbol,
                declaration,
            } => {
                if let Some(f) = &self.step {
                    f(step.as_str(), symbol.as_deref(), declaration.as_ref());
                }
            }
            TimerEvent::Finish { declaration } => {
                if let Some(f) = &self.finish {
                    f(declaration.as_ref());
                }
            }
            TimerEvent::Cancel => {
                if let Some(f) = &self.cancel {
                    f();
                }
            }
        }
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("start", &self.start.is_some())
            .field("interval", &self.interval.is_some())
            .field("step", &self.step.is_some())
            .field("finish", &self.finish.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}
