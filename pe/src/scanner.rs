//! Text scanner - finds the active timer declaration in a document
//!
//! A declaration is a markdown task line carrying a bracketed DSL span:
//!
//! ```text
//!   - [ ] [-(25m 5m)4] write the report
//!   │ │   │ │         └─ label
//!   │ │   │ └─ DSL
//!   │ │   └─ pause marker (optional)
//!   │ └─ unchecked checkbox (optional)
//!   └─ bullet (optional)
//! ```
//!
//! Only brackets whose interior opens like a timer (`(`, `p<digit>` or a digit)
//! count, so checked items, `[TODO]` tags and empty brackets are passed over.
//! The first qualifying line wins. A qualifying line whose DSL yields no timers
//! makes the whole scan come back empty.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::syntax::{Node, SyntaxError, parse_syntax, try_parse_syntax};

static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*]\s)?(?:(?P<checkbox>\[ \])\s)?\[(?P<pause>-)?(?P<dsl>\s*(?:\(|p\d|\d)[^\]]*)\]\s*(?P<label>.*)$")
        .expect("task line pattern is valid")
});

/// A timer declaration extracted from one line of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Identity of the document the line came from
    pub document_id: String,
    /// 0-based line index
    pub line: usize,
    /// 0-based char column of the checkbox, 0 when the line has none
    pub column: usize,
    /// Whether the pause marker (`[-...]`) is present
    pub paused: bool,
    /// DSL text with whitespace runs collapsed to single spaces
    pub raw_syntax: String,
    /// Parsed timer tree
    pub ast: Vec<Node>,
    /// Free text after the bracket
    pub label: String,
}

impl Declaration {
    /// Whether `other` denotes the same timer in the same state
    ///
    /// Rescans produce fresh declarations on every keystroke; two declarations
    /// that are the same timer must not restart or reset anything.
    pub fn same_timer(&self, other: &Declaration) -> bool {
        self.same_content(other) && self.paused == other.paused
    }

    /// Whether `other` is the same timer, ignoring the pause marker
    pub fn same_content(&self, other: &Declaration) -> bool {
        self.document_id == other.document_id && self.raw_syntax == other.raw_syntax && self.label == other.label
    }

    /// Number of countdowns in the tree, ignoring repetition
    pub fn leaf_count(&self) -> usize {
        self.ast.iter().map(Node::leaf_count).sum()
    }
}

/// The first line whose bracket opens like a timer
struct Candidate<'a> {
    line: usize,
    column: usize,
    paused: bool,
    dsl: &'a str,
    label: &'a str,
}

fn find_candidate(text: &str) -> Option<Candidate<'_>> {
    for (index, line) in text.lines().enumerate() {
        let Some(caps) = TASK_LINE.captures(line) else {
            continue;
        };

        let column = caps
            .name("checkbox")
            .map_or(0, |m| line[..m.start()].chars().count());

        return Some(Candidate {
            line: index,
            column,
            paused: caps.name("pause").is_some(),
            dsl: caps.name("dsl").map_or("", |m| m.as_str()),
            label: caps.name("label").map_or("", |m| m.as_str().trim_end()),
        });
    }
    None
}

/// Scan a document for its active timer declaration
pub fn scan(text: &str, document_id: &str) -> Option<Declaration> {
    debug!(%document_id, len = text.len(), "scan: called");
    let candidate = find_candidate(text)?;

    let ast = parse_syntax(candidate.dsl);
    let declaration = Declaration {
        document_id: document_id.to_string(),
        line: candidate.line,
        column: candidate.column,
        paused: candidate.paused,
        raw_syntax: normalize(candidate.dsl),
        ast,
        label: candidate.label.to_string(),
    };

    if declaration.leaf_count() == 0 {
        debug!(%document_id, line = candidate.line, dsl = candidate.dsl, "scan: declaration has no timers");
        return None;
    }

    debug!(
        %document_id,
        line = declaration.line,
        raw_syntax = %declaration.raw_syntax,
        paused = declaration.paused,
        "scan: found declaration"
    );
    Some(declaration)
}

/// Explain why the candidate line of a document does not yield a declaration
///
/// Returns the 0-based line index and the error, or `None` when the document has
/// no candidate line or the candidate is valid.
pub fn diagnose(text: &str) -> Option<(usize, SyntaxError)> {
    let candidate = find_candidate(text)?;
    match try_parse_syntax(candidate.dsl) {
        Err(e) => Some((candidate.line, e)),
        Ok(nodes) if nodes.iter().map(Node::leaf_count).sum::<usize>() == 0 => {
            Some((candidate.line, SyntaxError::Empty))
        }
        Ok(_) => None,
    }
}

fn normalize(dsl: &str) -> String {
    dsl.split_whitespace().collect::<Vec<_>>().join(" ")
}
