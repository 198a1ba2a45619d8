//! Session state machine
//!
//! ```text
//!            scan: new declaration            tick: last entry hits 0
//!   ┌──────┐ ───────────────────────► ┌─────────┐ ─────────────────► ┌──────┐
//!   │ IDLE │                          │ RUNNING │                    │ IDLE │
//!   └──────┘ ◄─── stop / not found ── └─────────┘                    └──────┘
//!      │                                │     ▲
//!      │ scan: new paused declaration   │     │ scan: pause marker removed
//!      ▼                                ▼     │
//!   ┌────────┐ ◄──── scan: pause marker added ┘
//!   │ PAUSED │
//!   └────────┘
//! ```
//!
//! The declaration last adopted stays in the session after it finishes or is
//! stopped, so rescanning unchanged text keeps doing nothing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::events::TimerEvent;
use crate::plan::{DEFAULT_LOOP_CAP, Plan, compile_with_cap};
use crate::scanner::Declaration;

/// Lifecycle phase of the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
}

/// What the tick source has to do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerControl {
    /// Leave the tick source as it is
    Keep,
    /// Start a fresh tick source for this plan generation
    Arm(u64),
    /// Stop ticking
    Disarm,
}

/// Result of one state transition
#[derive(Debug)]
pub struct Transition {
    /// The session after the transition
    pub session: Session,
    /// Events to emit, in order
    pub events: Vec<TimerEvent>,
    /// Instruction for the tick source
    pub timer: TimerControl,
    /// Whether a plan was adopted from the caller; its handlers become the
    /// ones that receive tick events
    pub adopted: bool,
}

/// Events and tick instruction produced by a transition step
struct Outcome {
    events: Vec<TimerEvent>,
    timer: TimerControl,
    adopted: bool,
}

impl Outcome {
    fn none() -> Self {
        Self {
            events: Vec::new(),
            timer: TimerControl::Keep,
            adopted: false,
        }
    }
}

/// Point-in-time view of the session for status display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub document_id: Option<String>,
    pub label: Option<String>,
    pub position: usize,
    pub plan_len: usize,
    pub remaining: u64,
    pub duration: u64,
    pub step: String,
    pub symbol: Option<String>,
}

/// The single timer session
#[derive(Debug, Clone)]
pub struct Session {
    /// Declaration of the current (or last finished/stopped) plan
    declaration: Option<Arc<Declaration>>,
    /// Last declaration seen by a scan, for retry
    latest: Option<Arc<Declaration>>,
    plan: Plan,
    position: usize,
    remaining: u64,
    phase: Phase,
    /// Whether the current plan has fired `start`
    started: bool,
    /// Bumped whenever a tick source is armed or discarded
    generation: u64,
    /// Document whose last scan found nothing and already fired `cancel`
    cleared: Option<String>,
    loop_cap: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_LOOP_CAP)
    }
}

impl Session {
    /// Create an idle session with the given loop cap
    pub fn new(loop_cap: u32) -> Self {
        Self {
            declaration: None,
            latest: None,
            plan: Plan::default(),
            position: 0,
            remaining: 0,
            phase: Phase::Idle,
            started: false,
            generation: 0,
            cleared: None,
            loop_cap,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_deref()
    }

    pub fn latest(&self) -> Option<&Declaration> {
        self.latest.as_deref()
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loop_cap(&self) -> u32 {
        self.loop_cap
    }

    /// Whether a plan is running or paused
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let entry = self.plan.get(self.position).filter(|_| self.is_active());
        SessionSnapshot {
            phase: self.phase,
            document_id: self.declaration.as_ref().map(|d| d.document_id.clone()),
            label: self.declaration.as_ref().map(|d| d.label.clone()),
            position: self.position,
            plan_len: self.plan.len(),
            remaining: if self.is_active() { self.remaining } else { 0 },
            duration: entry.map_or(0, |e| e.seconds),
            step: entry.map(|e| e.step_label()).unwrap_or_default(),
            symbol: entry.and_then(|e| e.symbol.clone()),
        }
    }

    // === Transitions ===

    /// React to a rescan of `document_id` that found `found`
    pub fn evaluate(mut self, found: Option<Declaration>, document_id: &str) -> Transition {
        debug!(%document_id, found = found.is_some(), phase = ?self.phase, "Session::evaluate: called");
        let outcome = match found {
            Some(declaration) => {
                self.cleared = None;
                self.on_found(declaration)
            }
            None => self.on_not_found(document_id),
        };
        self.finish_transition(outcome)
    }

    /// Advance the countdown by one tick of plan generation `generation`
    pub fn tick(mut self, generation: u64) -> Transition {
        let outcome = self.on_tick(generation);
        self.finish_transition(outcome)
    }

    /// Discard the running plan
    pub fn stop(mut self) -> Transition {
        debug!(phase = ?self.phase, "Session::stop: called");
        let outcome = if self.is_active() {
            info!(generation = self.generation, "Timer stopped");
            self.halt();
            Outcome {
                events: vec![TimerEvent::Cancel],
                timer: TimerControl::Disarm,
                adopted: false,
            }
        } else {
            Outcome::none()
        };
        self.finish_transition(outcome)
    }

    /// Restart the most recently seen declaration from its first entry
    pub fn retry_latest(mut self) -> Transition {
        debug!(has_latest = self.latest.is_some(), "Session::retry_latest: called");
        let outcome = match self.latest.clone() {
            Some(latest) => {
                let plan = compile_with_cap(&latest.ast, self.loop_cap);
                if plan.is_empty() {
                    Outcome::none()
                } else {
                    info!(label = %latest.label, paused = latest.paused, "Timer restarted");
                    let paused = latest.paused;
                    self.install(latest.clone(), plan, paused);
                    self.started = true;
                    Outcome {
                        events: vec![TimerEvent::Start { declaration: latest }],
                        timer: TimerControl::Arm(self.generation),
                        adopted: false,
                    }
                }
            }
            None => Outcome::none(),
        };
        self.finish_transition(outcome)
    }

    fn finish_transition(self, outcome: Outcome) -> Transition {
        Transition {
            session: self,
            events: outcome.events,
            timer: outcome.timer,
            adopted: outcome.adopted,
        }
    }

    fn on_found(&mut self, found: Declaration) -> Outcome {
        if let Some(current) = &self.declaration {
            if current.same_timer(&found) {
                debug!("Session::on_found: unchanged declaration, nothing to do");
                return Outcome::none();
            }
            if current.same_content(&found) {
                return self.toggle_pause(found);
            }
            if current.document_id != found.document_id && self.phase == Phase::Paused {
                debug!(
                    paused_document = %current.document_id,
                    document_id = %found.document_id,
                    "Session::on_found: paused timer in another document, ignoring"
                );
                return Outcome::none();
            }
        }
        self.adopt(found)
    }

    fn on_not_found(&mut self, document_id: &str) -> Outcome {
        match &self.declaration {
            None if self.cleared.as_deref() == Some(document_id) => {
                debug!(%document_id, "Session::on_not_found: already cleared, nothing to do");
                Outcome::none()
            }
            None => {
                debug!(%document_id, "Session::on_not_found: no timer declared");
                self.cleared = Some(document_id.to_string());
                Outcome {
                    events: vec![TimerEvent::Cancel],
                    timer: TimerControl::Keep,
                    adopted: false,
                }
            }
            Some(current) if current.document_id != document_id => {
                debug!(running_document = %current.document_id, %document_id, "Session::on_not_found: other document, ignoring");
                Outcome::none()
            }
            Some(_) => {
                info!(%document_id, "Timer declaration removed");
                self.halt();
                self.declaration = None;
                self.plan = Plan::default();
                self.cleared = Some(document_id.to_string());
                Outcome {
                    events: vec![TimerEvent::Cancel],
                    timer: TimerControl::Disarm,
                    adopted: false,
                }
            }
        }
    }

    /// Same timer, only the pause marker changed
    fn toggle_pause(&mut self, found: Declaration) -> Outcome {
        let found = Arc::new(found);
        self.latest = Some(found.clone());
        self.declaration = Some(found.clone());

        match (found.paused, self.phase) {
            (true, Phase::Running) => {
                info!(remaining = self.remaining, "Timer paused");
                self.phase = Phase::Paused;
                Outcome::none()
            }
            (false, Phase::Paused) if self.started => {
                info!(remaining = self.remaining, "Timer resumed");
                self.phase = Phase::Running;
                Outcome::none()
            }
            (false, Phase::Paused) => {
                // Adopted while paused, never started: this is its real start
                info!(label = %found.label, "Timer started");
                self.phase = Phase::Running;
                self.started = true;
                self.generation += 1;
                Outcome {
                    events: vec![TimerEvent::Start { declaration: found }],
                    timer: TimerControl::Arm(self.generation),
                    adopted: true,
                }
            }
            _ => Outcome::none(),
        }
    }

    /// A different timer replaces whatever was there
    fn adopt(&mut self, found: Declaration) -> Outcome {
        let mut events = Vec::new();
        if self.is_active() {
            info!("Replacing running timer");
            events.push(TimerEvent::Cancel);
        }

        let found = Arc::new(found);
        let plan = compile_with_cap(&found.ast, self.loop_cap);
        if plan.is_empty() {
            self.halt();
            self.declaration = None;
            return Outcome {
                events,
                timer: TimerControl::Disarm,
                adopted: false,
            };
        }

        self.latest = Some(found.clone());
        let paused = found.paused;
        self.install(found.clone(), plan, paused);
        if self.plan.is_truncated() {
            warn!(label = %found.label, entries = self.plan.len(), "Timer plan truncated");
        }

        if paused {
            info!(label = %found.label, "Timer adopted paused");
            return Outcome {
                events,
                timer: TimerControl::Disarm,
                adopted: true,
            };
        }

        info!(label = %found.label, entries = self.plan.len(), "Timer started");
        self.started = true;
        events.push(TimerEvent::Start { declaration: found });
        Outcome {
            events,
            timer: TimerControl::Arm(self.generation),
            adopted: true,
        }
    }

    fn on_tick(&mut self, generation: u64) -> Outcome {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Session::on_tick: stale tick dropped");
            return Outcome::none();
        }
        if self.phase != Phase::Running {
            return Outcome::none();
        }
        let (Some(declaration), Some(entry)) = (self.declaration.clone(), self.plan.get(self.position).cloned()) else {
            return Outcome::none();
        };

        self.remaining = self.remaining.saturating_sub(1);
        let mut events = vec![TimerEvent::Interval {
            remaining: self.remaining,
            duration: entry.seconds,
            step: entry.step_label(),
            symbol: entry.symbol.clone(),
            declaration: declaration.clone(),
        }];
        if self.remaining > 0 {
            return Outcome {
                events,
                timer: TimerControl::Keep,
                adopted: false,
            };
        }

        self.position += 1;
        let timer = match self.plan.get(self.position) {
            Some(next) => {
                self.remaining = next.seconds;
                if self.plan.announces_step(self.position) {
                    debug!(position = self.position, step = %next.step_label(), "Session::on_tick: step");
                    events.push(TimerEvent::Step {
                        step: next.step_label(),
                        symbol: next.symbol.clone(),
                        declaration,
                    });
                }
                TimerControl::Keep
            }
            None => {
                info!(label = %declaration.label, "Timer finished");
                events.push(TimerEvent::Finish { declaration });
                self.halt();
                TimerControl::Disarm
            }
        };

        Outcome {
            events,
            timer,
            adopted: false,
        }
    }

    /// Load a compiled plan at its first entry under a new generation
    fn install(&mut self, declaration: Arc<Declaration>, plan: Plan, paused: bool) {
        self.remaining = plan.get(0).map_or(0, |e| e.seconds);
        self.plan = plan;
        self.position = 0;
        self.declaration = Some(declaration);
        self.phase = if paused { Phase::Paused } else { Phase::Running };
        self.started = false;
        self.generation += 1;
    }

    /// Go idle and invalidate any outstanding ticks
    fn halt(&mut self) {
        self.phase = Phase::Idle;
        self.started = false;
        self.remaining = 0;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn decl(text: &str) -> Option<Declaration> {
        scan(text, "doc")
    }

    fn decl_in(text: &str, document_id: &str) -> Option<Declaration> {
        scan(text, document_id)
    }

    fn event_types(events: &[TimerEvent]) -> Vec<&'static str> {
        events.iter().map(TimerEvent::event_type).collect()
    }

    /// Feed `n` ticks of the current generation, collecting all events
    fn run_ticks(mut session: Session, n: usize) -> (Session, Vec<TimerEvent>) {
        let mut events = Vec::new();
        for _ in 0..n {
            let generation = session.generation();
            let t = session.tick(generation);
            events.extend(t.events);
            session = t.session;
        }
        (session, events)
    }

    fn started(text: &str) -> Session {
        let t = Session::default().evaluate(decl(text), "doc");
        assert_eq!(event_types(&t.events), vec!["start"]);
        t.session
    }

    #[test]
    fn test_first_declaration_starts() {
        let t = Session::default().evaluate(decl("[p1] xxx"), "doc");
        assert_eq!(event_types(&t.events), vec!["start"]);
        assert!(t.adopted);
        assert_eq!(t.timer, TimerControl::Arm(t.session.generation()));
        assert_eq!(t.session.phase(), Phase::Running);
        assert_eq!(t.session.remaining(), 60);
        match &t.events[0] {
            TimerEvent::Start { declaration } => assert_eq!(declaration.label, "xxx"),
            other => panic!("Expected Start, got {:?}", other),
        }
    }

    #[test]
    fn test_counts_down_then_finishes() {
        let session = started("[p1] xxx");
        let (session, events) = run_ticks(session, 60);

        let remaining: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Interval { remaining, duration, .. } => {
                    assert_eq!(*duration, 60);
                    Some(*remaining)
                }
                _ => None,
            })
            .collect();
        assert_eq!(remaining, (0..60).rev().collect::<Vec<u64>>());
        assert_eq!(events.last().map(TimerEvent::event_type), Some("finish"));
        assert_eq!(events.iter().filter(|e| e.event_type() == "finish").count(), 1);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_ticks_after_finish_are_ignored() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 60);
        let (session, events) = run_ticks(session, 5);
        assert!(events.is_empty());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_unchanged_rescan_is_noop() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 30);
        let generation = session.generation();

        let t = session.evaluate(decl("[p1] xxx"), "doc");
        assert!(t.events.is_empty());
        assert_eq!(t.timer, TimerControl::Keep);
        assert!(!t.adopted);
        assert_eq!(t.session.remaining(), 30);
        assert_eq!(t.session.generation(), generation);
    }

    #[test]
    fn test_rescan_after_finish_does_not_restart() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 60);
        let t = session.evaluate(decl("[p1] xxx"), "doc");
        assert!(t.events.is_empty());
        assert_eq!(t.session.phase(), Phase::Idle);
    }

    #[test]
    fn test_changed_declaration_restarts() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 30);

        let t = session.evaluate(decl("[p1] yyy"), "doc");
        assert_eq!(event_types(&t.events), vec!["cancel", "start"]);
        assert!(t.adopted);
        assert_eq!(t.session.remaining(), 60);
        assert_eq!(t.timer, TimerControl::Arm(t.session.generation()));
    }

    #[test]
    fn test_pause_and_resume_preserve_remaining() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 10);

        let t = session.evaluate(decl("[-p1] xxx"), "doc");
        assert!(t.events.is_empty());
        assert_eq!(t.timer, TimerControl::Keep);
        assert_eq!(t.session.phase(), Phase::Paused);

        // Paused ticks are dropped
        let (session, events) = run_ticks(t.session, 10);
        assert!(events.is_empty());
        assert_eq!(session.remaining(), 50);

        let t = session.evaluate(decl("[p1] xxx"), "doc");
        assert!(t.events.is_empty());
        assert_eq!(t.session.phase(), Phase::Running);

        let (session, events) = run_ticks(t.session, 50);
        let intervals = events.iter().filter(|e| e.event_type() == "interval").count();
        assert_eq!(intervals, 50);
        assert_eq!(events.last().map(TimerEvent::event_type), Some("finish"));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_new_paused_declaration_is_adopted_without_ticking() {
        let t = Session::default().evaluate(decl("[-p1] xxx"), "doc");
        assert!(t.events.is_empty());
        assert!(t.adopted);
        assert_eq!(t.timer, TimerControl::Disarm);
        assert_eq!(t.session.phase(), Phase::Paused);
        assert_eq!(t.session.remaining(), 60);

        // Removing the marker is the actual start
        let t = t.session.evaluate(decl("[p1] xxx"), "doc");
        assert_eq!(event_types(&t.events), vec!["start"]);
        assert_eq!(t.timer, TimerControl::Arm(t.session.generation()));
        assert_eq!(t.session.phase(), Phase::Running);
        assert_eq!(t.session.remaining(), 60);
    }

    #[test]
    fn test_paused_then_removed_then_restarted_counts_from_beginning() {
        let session = started("[p1] xxx");
        let session = session.evaluate(decl("[-p1] xxx"), "doc").session;
        let t = session.evaluate(decl(""), "doc");
        assert_eq!(event_types(&t.events), vec!["cancel"]);

        let t = t.session.evaluate(decl("[p1] xxx"), "doc");
        assert_eq!(event_types(&t.events), vec!["start"]);
        let (session, _) = run_ticks(t.session, 10);
        assert_eq!(session.remaining(), 50);
    }

    #[test]
    fn test_not_found_cancels_once() {
        let session = started("[p1] xxx");
        let t = session.evaluate(None, "doc");
        assert_eq!(event_types(&t.events), vec!["cancel"]);
        assert_eq!(t.timer, TimerControl::Disarm);
        assert!(t.session.declaration().is_none());

        let t = t.session.evaluate(None, "doc");
        assert!(t.events.is_empty());
    }

    #[test]
    fn test_not_found_on_fresh_session_cancels_once() {
        let t = Session::default().evaluate(None, "doc");
        assert_eq!(event_types(&t.events), vec!["cancel"]);
        assert_eq!(t.timer, TimerControl::Keep);
        assert_eq!(t.session.phase(), Phase::Idle);

        let t = t.session.evaluate(None, "doc");
        assert!(t.events.is_empty());

        // Another document has not been cleared yet
        let t = t.session.evaluate(None, "other");
        assert_eq!(event_types(&t.events), vec!["cancel"]);
    }

    #[test]
    fn test_documents_without_timer_cancel_on_fresh_session() {
        for text in ["", "plain text", "- [x] [p1] done", "[pa] broken"] {
            let t = Session::default().evaluate(decl(text), "doc");
            assert_eq!(event_types(&t.events), vec!["cancel"], "fresh scan of {:?}", text);
        }
    }

    #[test]
    fn test_found_declaration_resets_cleared_document() {
        let t = Session::default().evaluate(None, "doc");
        let t = t.session.evaluate(decl("[1s] once"), "doc");
        let (session, _) = run_ticks(t.session, 1);
        assert_eq!(session.phase(), Phase::Idle);

        // The finished declaration is the baseline, so removing it cancels once
        let t = session.evaluate(None, "doc");
        assert_eq!(event_types(&t.events), vec!["cancel"]);
        let t = t.session.evaluate(None, "doc");
        assert!(t.events.is_empty());
    }

    #[test]
    fn test_invalid_declaration_cancels_like_missing() {
        let session = started("[p1] xxx");
        let t = session.evaluate(decl("[p1 pa] xxx"), "doc");
        assert_eq!(event_types(&t.events), vec!["cancel"]);
    }

    #[test]
    fn test_other_document_not_found_is_ignored() {
        let t = Session::default().evaluate(decl_in("[p1] xxx", "a"), "a");
        let (session, _) = run_ticks(t.session, 5);

        let t = session.evaluate(None, "b");
        assert!(t.events.is_empty());
        assert_eq!(t.session.phase(), Phase::Running);
        assert_eq!(t.session.remaining(), 55);
    }

    #[test]
    fn test_new_declaration_in_same_document_replaces() {
        let t = Session::default().evaluate(decl_in("[p1] xxx", "a"), "a");
        let t = t.session.evaluate(decl_in("[p2] xxx", "a"), "a");
        assert_eq!(event_types(&t.events), vec!["cancel", "start"]);
        assert_eq!(t.session.remaining(), 120);
    }

    #[test]
    fn test_running_timer_is_replaced_by_other_document() {
        let t = Session::default().evaluate(decl_in("[p1] xxx", "a"), "a");
        let t = t.session.evaluate(decl_in("[p2] yyy", "b"), "b");
        assert_eq!(event_types(&t.events), vec!["cancel", "start"]);
        assert_eq!(t.session.declaration().map(|d| d.document_id.as_str()), Some("b"));
    }

    #[test]
    fn test_paused_timer_is_not_cancelled_by_other_document() {
        let t = Session::default().evaluate(decl_in("[p1] xxx", "a"), "a");
        let t = t.session.evaluate(decl_in("[-p1] xxx", "a"), "a");
        assert_eq!(t.session.phase(), Phase::Paused);

        let t = t.session.evaluate(decl_in("[p2] yyy", "b"), "b");
        assert!(t.events.is_empty());
        assert_eq!(t.session.phase(), Phase::Paused);
        assert_eq!(t.session.declaration().map(|d| d.document_id.as_str()), Some("a"));

        let t = t.session.evaluate(None, "b");
        assert!(t.events.is_empty());
        assert_eq!(t.session.phase(), Phase::Paused);
    }

    #[test]
    fn test_stale_generation_ticks_are_dropped() {
        let session = started("[p1] xxx");
        let stale = session.generation();
        let t = session.evaluate(decl("[p2] yyy"), "doc");
        assert_ne!(t.session.generation(), stale);

        let t = t.session.tick(stale);
        assert!(t.events.is_empty());
        assert_eq!(t.session.remaining(), 120);
    }

    #[test]
    fn test_step_fired_between_repetitions() {
        let session = started("[(p1 p2)2] loop");
        let (session, events) = run_ticks(session, 60 + 120 + 60 + 120);

        let steps: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Step { step, .. } => Some(step.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec!["2".to_string()]);

        // The step is announced right after the second entry's last interval
        let step_index = events.iter().position(|e| e.event_type() == "step").unwrap();
        let intervals_before = events[..step_index]
            .iter()
            .filter(|e| e.event_type() == "interval")
            .count();
        assert_eq!(intervals_before, 180);

        assert_eq!(events.last().map(TimerEvent::event_type), Some("finish"));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_interval_carries_step_and_symbol() {
        let session = started("[(1s🍅 1s☕)2] symbols");
        let (_, events) = run_ticks(session, 4);
        let seen: Vec<(String, Option<String>)> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Interval { step, symbol, .. } => Some((step.clone(), symbol.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                ("1".to_string(), Some("🍅".to_string())),
                ("1".to_string(), Some("☕".to_string())),
                ("2".to_string(), Some("🍅".to_string())),
                ("2".to_string(), Some("☕".to_string())),
            ]
        );
    }

    #[test]
    fn test_unbounded_loop_runs_cap_times() {
        let t = Session::new(3).evaluate(decl("[(1s)] capped"), "doc");
        let (session, events) = run_ticks(t.session, 10);
        assert_eq!(events.iter().filter(|e| e.event_type() == "interval").count(), 3);
        assert_eq!(events.iter().filter(|e| e.event_type() == "step").count(), 2);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_zero_length_entry_takes_one_tick() {
        let session = started("[0s 1s] zero");
        let (session, events) = run_ticks(session, 2);
        assert_eq!(event_types(&events), vec!["interval", "interval", "finish"]);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_stop_cancels_and_keeps_baseline() {
        let session = started("[p1] xxx");
        let t = session.stop();
        assert_eq!(event_types(&t.events), vec!["cancel"]);
        assert_eq!(t.timer, TimerControl::Disarm);
        assert_eq!(t.session.phase(), Phase::Idle);

        // Unchanged text does not bring the stopped timer back
        let t = t.session.evaluate(decl("[p1] xxx"), "doc");
        assert!(t.events.is_empty());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let t = Session::default().stop();
        assert!(t.events.is_empty());
        assert_eq!(t.timer, TimerControl::Keep);
    }

    #[test]
    fn test_retry_restarts_from_beginning() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 60);
        assert_eq!(session.phase(), Phase::Idle);

        let t = session.retry_latest();
        assert_eq!(event_types(&t.events), vec!["start"]);
        assert_eq!(t.timer, TimerControl::Arm(t.session.generation()));
        assert!(!t.adopted);
        assert_eq!(t.session.phase(), Phase::Running);
        assert_eq!(t.session.remaining(), 60);
    }

    #[test]
    fn test_retry_preserves_pause_state() {
        let session = started("[p1] xxx");
        let (session, _) = run_ticks(session, 20);
        let session = session.evaluate(decl("[-p1] xxx"), "doc").session;

        let t = session.retry_latest();
        assert_eq!(event_types(&t.events), vec!["start"]);
        assert_eq!(t.session.phase(), Phase::Paused);
        assert_eq!(t.session.remaining(), 60);

        let (session, events) = run_ticks(t.session, 5);
        assert!(events.is_empty());

        // Resuming continues the restarted plan without a second start
        let t = session.evaluate(decl("[p1] xxx"), "doc");
        assert!(t.events.is_empty());
        assert_eq!(t.session.phase(), Phase::Running);
    }

    #[test]
    fn test_retry_without_history_is_noop() {
        let t = Session::default().retry_latest();
        assert!(t.events.is_empty());
        assert_eq!(t.timer, TimerControl::Keep);
    }

    #[test]
    fn test_snapshot_reflects_active_entry() {
        let session = started("[(1m🍅 5m)2] snap");
        let (session, _) = run_ticks(session, 61);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Running);
        assert_eq!(snapshot.label.as_deref(), Some("snap"));
        assert_eq!(snapshot.position, 1);
        assert_eq!(snapshot.plan_len, 4);
        assert_eq!(snapshot.duration, 300);
        assert_eq!(snapshot.remaining, 299);
        assert_eq!(snapshot.step, "1");
        assert_eq!(snapshot.symbol, None);
    }

    #[test]
    fn test_snapshot_when_idle() {
        let snapshot = Session::default().snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.label, None);
        assert_eq!(snapshot.remaining, 0);
        assert_eq!(snapshot.duration, 0);
    }
}
