//! Plan compiler - flattens the timer tree into an ordered countdown schedule
//!
//! Groups are expanded depth first. Entering a group pushes a 1-based
//! repetition index onto the step path, each repetition rewrites it, leaving the
//! group pops it. An unbounded group (`loop_count == 0`) repeats `cap` times.

use serde::Serialize;
use tracing::{debug, warn};

use crate::syntax::Node;

/// Repetition count substituted for unbounded groups
pub const DEFAULT_LOOP_CAP: u32 = 99;

/// Expansion stops once a plan holds this many entries
pub const MAX_PLAN_ENTRIES: usize = 100_000;

/// One countdown of the flattened schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Repetition index of every enclosing group, outermost first
    pub step_path: Vec<u32>,
}

impl PlanEntry {
    /// Display form of the step path, e.g. `"2-1"`; empty outside any group
    pub fn step_label(&self) -> String {
        self.step_path
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// The flattened schedule for one declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    entries: Vec<PlanEntry>,
    /// Set when expansion stopped at [`MAX_PLAN_ENTRIES`]
    truncated: bool,
}

impl Plan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PlanEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the tree expands to more than [`MAX_PLAN_ENTRIES`] entries
    ///
    /// A truncated plan runs only its first entries, so its total is shorter
    /// than the tree's.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Sum of every entry's duration
    pub fn total_seconds(&self) -> u64 {
        self.entries.iter().fold(0u64, |acc, e| acc.saturating_add(e.seconds))
    }

    /// Whether moving into entry `index` is announced as a step
    ///
    /// Only transitions into a new repetition are steps: the entry must sit
    /// inside a group and its step path must differ from the previous entry's.
    /// The first entry is never a step.
    pub fn announces_step(&self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        match (self.entries.get(index - 1), self.entries.get(index)) {
            (Some(prev), Some(next)) => !next.step_path.is_empty() && next.step_path != prev.step_path,
            _ => false,
        }
    }
}

/// Compile a timer tree with the default loop cap
pub fn compile(ast: &[Node]) -> Plan {
    compile_with_cap(ast, DEFAULT_LOOP_CAP)
}

/// Compile a timer tree, repeating unbounded groups `cap` times
///
/// Expansion stops after [`MAX_PLAN_ENTRIES`] entries and the plan is marked
/// truncated; see [`Plan::is_truncated`].
pub fn compile_with_cap(ast: &[Node], cap: u32) -> Plan {
    let mut flattener = Flattener {
        cap,
        path: Vec::new(),
        entries: Vec::new(),
        truncated: false,
    };
    flattener.walk(ast);

    let Flattener { entries, truncated, .. } = flattener;
    if truncated {
        warn!(max = MAX_PLAN_ENTRIES, "compile_with_cap: plan truncated");
    }
    debug!(entry_count = entries.len(), cap, truncated, "compile_with_cap: compiled plan");
    Plan { entries, truncated }
}

struct Flattener {
    cap: u32,
    path: Vec<u32>,
    entries: Vec<PlanEntry>,
    truncated: bool,
}

impl Flattener {
    fn is_full(&self) -> bool {
        self.entries.len() >= MAX_PLAN_ENTRIES
    }

    fn repeats(&self, loop_count: u32) -> u32 {
        if loop_count == 0 { self.cap } else { loop_count }
    }

    fn walk(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Leaf { seconds, symbol } => {
                    if self.is_full() {
                        self.truncated = true;
                        return;
                    }
                    self.entries.push(PlanEntry {
                        seconds: *seconds,
                        symbol: symbol.clone(),
                        step_path: self.path.clone(),
                    });
                }
                Node::Group { loop_count, .. } if node.leaf_count() == 0 || self.repeats(*loop_count) == 0 => {}
                Node::Group { children, loop_count } => {
                    let repeats = self.repeats(*loop_count);
                    self.path.push(1);
                    for iteration in 1..=repeats {
                        if self.is_full() {
                            self.truncated = true;
                            break;
                        }
                        if let Some(last) = self.path.last_mut() {
                            *last = iteration;
                        }
                        self.walk(children);
                    }
                    self.path.pop();
                    if self.truncated {
                        return;
                    }
                }
            }
        }
    }
}
