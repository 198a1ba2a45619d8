//! Timer DSL tokenizer and parser
//!
//! The DSL lives inside the brackets of a task line:
//!
//! ```text
//! - [ ] [(25m🍅 5m☕)4 15m] write the report
//!       └──────────────────┘
//!            DSL
//! ```
//!
//! - `p<n>` is the legacy shorthand for `n` minutes
//! - `<n>h`, `<n>m`, `<n>s` are hours, minutes and seconds
//! - any non-space run right after a duration is a display symbol
//! - `( ... )<n>` repeats the group `n` times, `( ... )` repeats up to the loop cap

mod error;
mod parser;
mod token;

pub use error::SyntaxError;
pub use parser::{MAX_DEPTH, Node, parse, parse_syntax, try_parse, try_parse_syntax};
pub use token::{Token, tokenize, try_tokenize};
