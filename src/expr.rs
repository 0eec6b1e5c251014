//! Evaluation of operator-typed numeric literals.
//!
//! The monitor only understands hexadecimal literals with a two-character base
//! marker (`0x1a`, `0X80000000`). The marker is not part of the value; every
//! character after it must be a hex digit and the result must fit in a `u32`.

use regex::Regex;
use thiserror::Error;

/// Reasons a literal could not be turned into a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The token is long enough to carry a value but does not start with `0x`.
    #[error("expected a 0x-prefixed hex literal, got '{0}'")]
    MissingPrefix(String),
    /// A character after the base marker is not a hex digit.
    #[error("invalid hex digit '{ch}' at offset {offset}")]
    InvalidLiteral { ch: char, offset: usize },
    /// The value needs more than 32 bits.
    #[error("literal '{0}' does not fit in 32 bits")]
    Overflow(String),
}

/// Fold the digits after the first two characters of `token` into a `u32`.
///
/// The first two characters are skipped unconditionally, so a token of two
/// characters or fewer evaluates to 0. Upper- and lower-case digits are both
/// accepted. Leading zeros do not count towards the 32-bit width.
pub fn eval_hex(token: &str) -> Result<u32, ExprError> {
    let mut value: u32 = 0;
    for (offset, ch) in token.char_indices().skip(2) {
        let digit = ch
            .to_digit(16)
            .ok_or(ExprError::InvalidLiteral { ch, offset })?;
        value = value
            .checked_mul(16)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| ExprError::Overflow(token.to_string()))?;
    }
    Ok(value)
}

/// Literal evaluator with its shape rules compiled up front.
///
/// Building one is the pattern-compilation step of console start-up; the
/// console holds the result for the whole session.
#[derive(Debug, Clone)]
pub struct Evaluator {
    prefix: Regex,
}

impl Evaluator {
    /// Compile the literal rules.
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            prefix: Regex::new(r"^0[xX]")?,
        })
    }

    /// Evaluate `token` as a `0x`-prefixed hex literal.
    ///
    /// Tokens of two characters or fewer carry no digits and yield 0.
    pub fn eval(&self, token: &str) -> Result<u32, ExprError> {
        if token.chars().count() <= 2 {
            return Ok(0);
        }
        if !self.prefix.is_match(token) {
            return Err(ExprError::MissingPrefix(token.to_string()));
        }
        eval_hex(token)
    }
}
