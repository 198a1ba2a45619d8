//! TimerService - actor that owns the scheduler and its tick source
//!
//! Rescans, control commands and ticks are all handled on the one actor task,
//! so a rescan always completes before the next tick is looked at.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::config::TimerConfig;
use super::handlers::EventHandlers;
use super::messages::{ServiceCommand, ServiceError, ServiceResponse};
use super::scheduler::Scheduler;
use super::state::{SessionSnapshot, TimerControl};
use crate::broadcast::EventEmitter;

/// Handle for talking to the timer service
///
/// Cheap to clone; every clone drives the same session.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<ServiceCommand>,
}

impl TimerHandle {
    /// Spawn the service task and return a handle to it
    pub fn spawn(config: &TimerConfig, emitter: Option<EventEmitter>) -> Self {
        debug!(loop_cap = config.loop_cap, tick_ms = config.tick_ms, "TimerHandle::spawn: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));

        let mut scheduler = Scheduler::new(config.loop_cap);
        if let Some(emitter) = emitter {
            scheduler = scheduler.with_emitter(emitter);
        }
        let service = TimerService::new(scheduler, rx, config.tick());
        tokio::spawn(service.run());

        info!("TimerService spawned");
        Self { tx }
    }

    /// Rescan a document's text
    pub async fn evaluate(
        &self,
        text: impl Into<String>,
        document_id: impl Into<String>,
        handlers: EventHandlers,
    ) -> ServiceResponse<SessionSnapshot> {
        let text = text.into();
        let document_id = document_id.into();
        debug!(%document_id, len = text.len(), "TimerHandle::evaluate: called");
        self.request(|reply| ServiceCommand::Evaluate {
            text,
            document_id,
            handlers,
            reply,
        })
        .await
    }

    /// Discard the running plan
    pub async fn stop_timer(&self) -> ServiceResponse<SessionSnapshot> {
        debug!("TimerHandle::stop_timer: called");
        self.request(|reply| ServiceCommand::Stop { reply }).await
    }

    /// Restart the latest declaration from its first entry
    pub async fn retry_latest(&self) -> ServiceResponse<SessionSnapshot> {
        debug!("TimerHandle::retry_latest: called");
        self.request(|reply| ServiceCommand::Retry { reply }).await
    }

    pub async fn snapshot(&self) -> ServiceResponse<SessionSnapshot> {
        self.request(|reply| ServiceCommand::Snapshot { reply }).await
    }

    /// Stop the service task; pending ticks are dropped
    pub async fn shutdown(&self) -> ServiceResponse<()> {
        debug!("TimerHandle::shutdown: called");
        self.tx
            .send(ServiceCommand::Shutdown)
            .await
            .map_err(|_| ServiceError::ChannelClosed)
    }

    async fn request<F>(&self, build: F) -> ServiceResponse<SessionSnapshot>
    where
        F: FnOnce(oneshot::Sender<SessionSnapshot>) -> ServiceCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ServiceError::ChannelClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ReplyDropped)
    }
}

/// What woke the actor
enum Wake {
    Command(Option<ServiceCommand>),
    Tick(u64),
}

/// The actor state: scheduler plus at most one armed tick source
pub struct TimerService {
    scheduler: Scheduler,
    rx: mpsc::Receiver<ServiceCommand>,
    tick: Duration,
    /// Generation the interval was armed for, and the interval itself
    armed: Option<(u64, Interval)>,
}

impl TimerService {
    pub fn new(scheduler: Scheduler, rx: mpsc::Receiver<ServiceCommand>, tick: Duration) -> Self {
        Self {
            scheduler,
            rx,
            tick,
            armed: None,
        }
    }

    /// Process commands and ticks until shutdown or every handle is dropped
    pub async fn run(mut self) {
        debug!("TimerService actor started");

        loop {
            let wake = tokio::select! {
                cmd = self.rx.recv() => Wake::Command(cmd),
                generation = next_tick(&mut self.armed) => Wake::Tick(generation),
            };

            match wake {
                Wake::Tick(generation) => {
                    let control = self.scheduler.tick(generation);
                    self.apply_control(control);
                }
                Wake::Command(Some(cmd)) => {
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                Wake::Command(None) => {
                    debug!("TimerService: all handles dropped");
                    break;
                }
            }
        }

        info!("TimerService stopped");
    }

    /// Returns false when the actor should stop
    fn handle_command(&mut self, cmd: ServiceCommand) -> bool {
        match cmd {
            ServiceCommand::Evaluate {
                text,
                document_id,
                handlers,
                reply,
            } => {
                debug!(%document_id, "actor_loop: Evaluate command");
                let control = self.scheduler.evaluate(&text, &document_id, &handlers);
                self.apply_control(control);
                let _ = reply.send(self.scheduler.snapshot());
            }
            ServiceCommand::Stop { reply } => {
                debug!("actor_loop: Stop command");
                let control = self.scheduler.stop_timer();
                self.apply_control(control);
                let _ = reply.send(self.scheduler.snapshot());
            }
            ServiceCommand::Retry { reply } => {
                debug!("actor_loop: Retry command");
                let control = self.scheduler.retry_latest();
                self.apply_control(control);
                let _ = reply.send(self.scheduler.snapshot());
            }
            ServiceCommand::Snapshot { reply } => {
                let _ = reply.send(self.scheduler.snapshot());
            }
            ServiceCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                return false;
            }
        }
        true
    }

    fn apply_control(&mut self, control: TimerControl) {
        match control {
            TimerControl::Keep => {}
            TimerControl::Arm(generation) => {
                debug!(generation, "TimerService: arming tick");
                let mut interval = time::interval_at(Instant::now() + self.tick, self.tick);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.armed = Some((generation, interval));
            }
            TimerControl::Disarm => {
                debug!("TimerService: disarming tick");
                self.armed = None;
            }
        }
    }
}

/// Wait for the armed interval, or forever when nothing is armed
async fn next_tick(armed: &mut Option<(u64, Interval)>) -> u64 {
    match armed {
        Some((generation, interval)) => {
            interval.tick().await;
            *generation
        }
        None => std::future::pending().await,
    }
}
