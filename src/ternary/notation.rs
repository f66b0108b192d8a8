//! Numeric literal notations.
//!
//! Three radixes are used in assembly source, all balanced:
//! - `%` trits: `i` (or `T`/`-`), `0`, `1`
//! - `$` nonary, one digit per trit pair: `m k j i 0 1 2 3 4`
//!   (`④ ③ ② ①` are accepted for -4..-1)
//! - `&` base 27, one digit per three trits: `Z..N` for -13..-1, `0`,
//!   `A..M` for 1..13

use thiserror::Error;
use crate::ternary::Trit;

/// Errors from parsing a literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("empty {radix} literal")]
    Empty { radix: &'static str },

    #[error("invalid {radix} digit '{digit}'")]
    InvalidDigit { radix: &'static str, digit: char },

    #[error("{radix} literal '{text}' is too large")]
    Overflow { radix: &'static str, text: String },
}

const NONARY_NEG: [[char; 2]; 4] = [['i', '①'], ['j', '②'], ['k', '③'], ['m', '④']];

fn nonary_digit(c: char) -> Option<i32> {
    if let Some(d) = c.to_digit(10).filter(|d| *d <= 4) {
        return Some(d as i32);
    }
    NONARY_NEG
        .iter()
        .position(|alts| alts.contains(&c))
        .map(|i| -(i as i32) - 1)
}

fn base27_digit(c: char) -> Option<i32> {
    match c {
        '0' => Some(0),
        'A'..='M' => Some(c as i32 - 'A' as i32 + 1),
        'N'..='Z' => Some(-(c as i32 - 'N' as i32 + 1)),
        _ => None,
    }
}

fn parse_digits(
    text: &str,
    radix: &'static str,
    base: i64,
    digit: impl Fn(char) -> Option<i32>,
) -> Result<i32, NotationError> {
    if text.is_empty() {
        return Err(NotationError::Empty { radix });
    }

    let mut value: i64 = 0;
    for c in text.chars() {
        let d = digit(c).ok_or(NotationError::InvalidDigit { radix, digit: c })?;
        value = value
            .checked_mul(base)
            .and_then(|v| v.checked_add(d as i64))
            .filter(|v| i32::try_from(*v).is_ok())
            .ok_or_else(|| NotationError::Overflow { radix, text: text.to_string() })?;
    }
    Ok(value as i32)
}

/// Parse a balanced ternary literal, most significant trit first.
pub fn parse_trits(text: &str) -> Result<i32, NotationError> {
    parse_digits(text, "trit", 3, |c| Trit::from_char(c).map(Trit::to_i32))
}

/// Parse a balanced nonary literal.
pub fn parse_nonary(text: &str) -> Result<i32, NotationError> {
    parse_digits(text, "nonary", 9, nonary_digit)
}

/// Parse a balanced base-27 literal.
pub fn parse_base27(text: &str) -> Result<i32, NotationError> {
    parse_digits(text, "base-27", 27, base27_digit)
}

fn render(value: i32, base: i32, digit: impl Fn(i32) -> char) -> String {
    if value == 0 {
        return digit(0).to_string();
    }

    let half = base / 2;
    let mut digits = Vec::new();
    let mut rest = value;
    while rest != 0 {
        let mut d = rest.rem_euclid(base);
        if d > half {
            d -= base;
        }
        digits.push(digit(d));
        rest = (rest - d) / base;
    }
    digits.iter().rev().collect()
}

/// Render as balanced ternary with no leading zeros.
pub fn to_trits(value: i32) -> String {
    render(value, 3, |d| match d {
        -1 => 'i',
        0 => '0',
        _ => '1',
    })
}

/// Render as balanced nonary with no leading zeros.
pub fn to_nonary(value: i32) -> String {
    render(value, 9, |d| {
        if d < 0 {
            NONARY_NEG[(-d - 1) as usize][0]
        } else {
            char::from(b'0' + d as u8)
        }
    })
}

/// Render as balanced base 27 with no leading zeros.
pub fn to_base27(value: i32) -> String {
    render(value, 27, |d| match d {
        0 => '0',
        1..=13 => char::from(b'A' + (d - 1) as u8),
        _ => char::from(b'N' + (-d - 1) as u8),
    })
}
