//! Tokenizer - converts a DSL string into a flat token stream
//!
//! Scanning is left to right, one production at a time. The first character that
//! fits no production rejects the whole string: `tokenize` then returns an empty
//! list, which callers treat as "no valid declaration" rather than "empty schedule".

use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::error::SyntaxError;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * 60;

/// A single lexical unit of the timer DSL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    /// A countdown duration, optionally tagged with a display symbol
    Time {
        seconds: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
    },
    /// `(`
    OpenGroup,
    /// `)` with its trailing repetition count, 0 when no digits follow
    CloseGroup { loop_count: u32 },
}

impl Token {
    /// Shorthand for a time token without a symbol
    pub fn time(seconds: u64) -> Self {
        Token::Time { seconds, symbol: None }
    }

    /// Shorthand for a time token carrying a symbol
    pub fn time_with_symbol(seconds: u64, symbol: impl Into<String>) -> Self {
        Token::Time {
            seconds,
            symbol: Some(symbol.into()),
        }
    }
}

/// Tokenize a DSL string, returning an empty list when it is malformed
pub fn tokenize(input: &str) -> Vec<Token> {
    match try_tokenize(input) {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!(%input, error = %e, "tokenize: rejected input");
            Vec::new()
        }
    }
}

/// Tokenize a DSL string, reporting why it was rejected
pub fn try_tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut cursor = Cursor::new(input);
    let mut tokens = Vec::new();

    while let Some((offset, ch)) = cursor.peek() {
        match ch {
            c if c.is_whitespace() => cursor.bump(),
            '(' => {
                cursor.bump();
                tokens.push(Token::OpenGroup);
            }
            ')' => {
                cursor.bump();
                let loop_count = match cursor.digits() {
                    Some((start, digits)) => parse_number(digits, start)?,
                    None => 0,
                };
                tokens.push(Token::CloseGroup { loop_count });
            }
            'p' => {
                cursor.bump();
                let (start, digits) = cursor.digits().ok_or(SyntaxError::MissingDigits { offset: offset + 1 })?;
                let minutes: u64 = parse_number(digits, start)?;
                let seconds = minutes
                    .checked_mul(SECONDS_PER_MINUTE)
                    .ok_or(SyntaxError::NumberOverflow { offset: start })?;
                tokens.push(Token::Time {
                    seconds,
                    symbol: cursor.symbol(),
                });
            }
            c if c.is_ascii_digit() => {
                let (start, digits) = cursor.digits().ok_or(SyntaxError::MissingDigits { offset })?;
                let amount: u64 = parse_number(digits, start)?;
                let multiplier = match cursor.peek() {
                    Some((_, 'h')) => SECONDS_PER_HOUR,
                    Some((_, 'm')) => SECONDS_PER_MINUTE,
                    Some((_, 's')) => 1,
                    Some((unit_offset, _)) => return Err(SyntaxError::MissingUnit { offset: unit_offset }),
                    None => return Err(SyntaxError::MissingUnit { offset: input.len() }),
                };
                cursor.bump();
                let seconds = amount
                    .checked_mul(multiplier)
                    .ok_or(SyntaxError::NumberOverflow { offset: start })?;
                tokens.push(Token::Time {
                    seconds,
                    symbol: cursor.symbol(),
                });
            }
            other => return Err(SyntaxError::InvalidCharacter { ch: other, offset }),
        }
    }

    Ok(tokens)
}

fn parse_number<T: FromStr>(digits: &str, offset: usize) -> Result<T, SyntaxError> {
    // Digit runs only ever fail to parse by overflowing
    digits.parse().map_err(|_| SyntaxError::NumberOverflow { offset })
}

/// Byte-offset cursor over the DSL string
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<(usize, char)> {
        self.input[self.pos..].chars().next().map(|c| (self.pos, c))
    }

    fn bump(&mut self) {
        if let Some((_, c)) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Consume a run of chars matching `pred`, returning its start and text
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> Option<(usize, &'a str)> {
        let start = self.pos;
        while let Some((_, c)) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        (self.pos > start).then(|| (start, &self.input[start..self.pos]))
    }

    fn digits(&mut self) -> Option<(usize, &'a str)> {
        self.take_while(|c| c.is_ascii_digit())
    }

    /// Everything up to the next whitespace or `)`
    fn symbol(&mut self) -> Option<String> {
        self.take_while(|c| !c.is_whitespace() && c != ')')
            .map(|(_, text)| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_loop_syntax() {
        assert_eq!(
            tokenize("(p1 p2)2"),
            vec![
                Token::OpenGroup,
                Token::time(60),
                Token::time(120),
                Token::CloseGroup { loop_count: 2 },
            ]
        );
    }

    #[test]
    fn test_tokenize_unit_suffixes() {
        assert_eq!(
            tokenize("1h 25m 30s"),
            vec![Token::time(3600), Token::time(1500), Token::time(30)]
        );
    }

    #[test]
    fn test_tokenize_close_without_count_means_capped() {
        assert_eq!(
            tokenize("(p1)"),
            vec![Token::OpenGroup, Token::time(60), Token::CloseGroup { loop_count: 0 }]
        );
    }

    #[test]
    fn test_tokenize_symbols() {
        assert_eq!(
            tokenize("(25m🍅 5m☕)4"),
            vec![
                Token::OpenGroup,
                Token::time_with_symbol(1500, "🍅"),
                Token::time_with_symbol(300, "☕"),
                Token::CloseGroup { loop_count: 4 },
            ]
        );
    }

    #[test]
    fn test_tokenize_symbol_stops_at_close_paren() {
        assert_eq!(
            tokenize("(p1a)3"),
            vec![
                Token::OpenGroup,
                Token::time_with_symbol(60, "a"),
                Token::CloseGroup { loop_count: 3 },
            ]
        );
    }

    #[test]
    fn test_tokenize_extra_whitespace() {
        assert_eq!(tokenize("  p1\t  p2  "), vec![Token::time(60), Token::time(120)]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert_eq!(try_tokenize("   "), Ok(Vec::new()));
    }

    #[test]
    fn test_tokenize_invalid_syntax_returns_empty() {
        assert!(tokenize("(p1 pa)2").is_empty());
        assert!(tokenize("p1 (p1 pa)").is_empty());
        assert!(tokenize("x").is_empty());
    }

    #[test]
    fn test_try_tokenize_reports_missing_digits() {
        assert_eq!(try_tokenize("p1 pa"), Err(SyntaxError::MissingDigits { offset: 4 }));
    }

    #[test]
    fn test_try_tokenize_reports_missing_unit() {
        assert_eq!(try_tokenize("25"), Err(SyntaxError::MissingUnit { offset: 2 }));
        assert_eq!(try_tokenize("25d"), Err(SyntaxError::MissingUnit { offset: 2 }));
    }

    #[test]
    fn test_try_tokenize_reports_invalid_character() {
        assert_eq!(
            try_tokenize("p1 #"),
            Err(SyntaxError::InvalidCharacter { ch: '#', offset: 3 })
        );
    }

    #[test]
    fn test_try_tokenize_reports_overflow() {
        assert!(matches!(
            try_tokenize("p99999999999999999999"),
            Err(SyntaxError::NumberOverflow { .. })
        ));
        assert!(matches!(
            try_tokenize("(p1)99999999999"),
            Err(SyntaxError::NumberOverflow { .. })
        ));
    }

    #[test]
    fn test_token_serialization() {
        let json = serde_json::to_string(&Token::CloseGroup { loop_count: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"close_group","loop_count":2}"#);

        let json = serde_json::to_string(&Token::time(60)).unwrap();
        assert_eq!(json, r#"{"type":"time","seconds":60}"#);
    }
}
