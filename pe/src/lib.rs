//! pomoedit - countdown timers declared inside text
//!
//! A task line such as `- [ ] [(25m🍅 5m☕)4] write the report` declares a timer.
//! Every time the text changes it is rescanned: an unchanged declaration keeps
//! running, an edited one restarts, a `[-...]` pause marker holds it, and a
//! removed one cancels it.
//!
//! # Modules
//!
//! - [`syntax`] - tokenizer and parser for the timer expression
//! - [`scanner`] - finds the active declaration in a document
//! - [`plan`] - flattens the timer tree into countdown entries
//! - [`session`] - the session state machine, scheduler and tick actor
//! - [`broadcast`] - optional TCP sink mirroring timer ticks
//! - [`watcher`] - polls a file and feeds its text to the timer
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod plan;
pub mod scanner;
pub mod session;
pub mod syntax;
pub mod watcher;

// Re-export commonly used types
pub use broadcast::{BroadcastClient, BroadcastConfig, BroadcastEvent, BroadcastServer, EventBus, EventEmitter};
pub use config::Config;
pub use plan::{DEFAULT_LOOP_CAP, Plan, PlanEntry, compile, compile_with_cap};
pub use scanner::{Declaration, diagnose, scan};
pub use session::{
    EventHandlers, Phase, Scheduler, Session, SessionSnapshot, TimerConfig, TimerControl, TimerEvent, TimerHandle,
    TimerService, Transition,
};
pub use syntax::{Node, SyntaxError, Token, parse, parse_syntax, tokenize};
pub use watcher::{DocumentChange, DocumentWatcher, WatchConfig};
