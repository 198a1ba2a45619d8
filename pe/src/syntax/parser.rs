//! Parser - builds the timer tree from a token stream
//!
//! Groups nest arbitrarily (up to [`MAX_DEPTH`]). The top level is an implicit
//! sequence of sibling nodes. A malformed stream (unclosed group, stray `)`)
//! produces an empty tree from [`parse`] so it can never start a timer.

use serde::Serialize;
use tracing::debug;

use super::error::SyntaxError;
use super::token::{Token, try_tokenize};

/// Maximum group nesting accepted by the parser
pub const MAX_DEPTH: usize = 32;

/// A node of the timer tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// A single countdown
    Leaf {
        seconds: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
    },
    /// A repeated sub-sequence; `loop_count == 0` repeats up to the loop cap
    Group { children: Vec<Node>, loop_count: u32 },
}

impl Node {
    /// Number of countdowns in this node, ignoring repetition
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Group { children, .. } => children.iter().map(Node::leaf_count).sum(),
        }
    }

    /// Total countdown time with every group expanded (`0` counts as `cap`)
    pub fn total_seconds(&self, cap: u32) -> u64 {
        match self {
            Node::Leaf { seconds, .. } => *seconds,
            Node::Group { children, loop_count } => {
                let repeats = if *loop_count == 0 { cap } else { *loop_count };
                let once = children
                    .iter()
                    .fold(0u64, |acc, child| acc.saturating_add(child.total_seconds(cap)));
                once.saturating_mul(u64::from(repeats))
            }
        }
    }
}

/// Parse a token stream, returning an empty tree when it is malformed
pub fn parse(tokens: &[Token]) -> Vec<Node> {
    match try_parse(tokens) {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!(token_count = tokens.len(), error = %e, "parse: rejected token stream");
            Vec::new()
        }
    }
}

/// Parse a token stream, reporting why it was rejected
pub fn try_parse(tokens: &[Token]) -> Result<Vec<Node>, SyntaxError> {
    let mut cursor = 0;
    let (nodes, _) = parse_sequence(tokens, &mut cursor, None, 0)?;
    Ok(nodes)
}

/// Tokenize and parse in one go, returning an empty tree on any error
pub fn parse_syntax(input: &str) -> Vec<Node> {
    try_parse_syntax(input).unwrap_or_default()
}

/// Tokenize and parse in one go
pub fn try_parse_syntax(input: &str) -> Result<Vec<Node>, SyntaxError> {
    let tokens = try_tokenize(input)?;
    try_parse(&tokens)
}

/// Parse siblings until the stream ends (top level) or the group opened at
/// `opened_at` closes, returning the siblings and the close token's loop count
fn parse_sequence(
    tokens: &[Token],
    cursor: &mut usize,
    opened_at: Option<usize>,
    depth: usize,
) -> Result<(Vec<Node>, u32), SyntaxError> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.get(*cursor) {
        let index = *cursor;
        *cursor += 1;

        match token {
            Token::Time { seconds, symbol } => nodes.push(Node::Leaf {
                seconds: *seconds,
                symbol: symbol.clone(),
            }),
            Token::OpenGroup => {
                if depth + 1 > MAX_DEPTH {
                    return Err(SyntaxError::TooDeep { max: MAX_DEPTH });
                }
                let (children, loop_count) = parse_sequence(tokens, cursor, Some(index), depth + 1)?;
                nodes.push(Node::Group { children, loop_count });
            }
            Token::CloseGroup { loop_count } => {
                if opened_at.is_none() {
                    return Err(SyntaxError::UnexpectedClose { index });
                }
                return Ok((nodes, *loop_count));
            }
        }
    }

    match opened_at {
        Some(index) => Err(SyntaxError::UnclosedGroup { index }),
        None => Ok((nodes, 0)),
    }
}
