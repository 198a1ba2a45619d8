//! Syntax errors for the timer DSL

use thiserror::Error;

/// Why a DSL string was rejected
///
/// Offsets are byte offsets into the DSL string, indexes are token positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    InvalidCharacter { ch: char, offset: usize },

    #[error("Expected digits at offset {offset}")]
    MissingDigits { offset: usize },

    #[error("Expected a unit (h, m or s) at offset {offset}")]
    MissingUnit { offset: usize },

    #[error("Number too large at offset {offset}")]
    NumberOverflow { offset: usize },

    #[error("Group opened at token {index} is never closed")]
    UnclosedGroup { index: usize },

    #[error("Unexpected ')' at token {index}")]
    UnexpectedClose { index: usize },

    #[error("Groups nested deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("Declaration contains no timers")]
    Empty,
}
