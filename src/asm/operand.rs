//! Operand and value-expression syntax.
//!
//! ```text
//! A            accumulator
//! #expr        immediate
//! expr         absolute
//! expr,X       absolute indexed by X     expr,Y   by Y
//! (expr)       indirect
//! (expr,X)     indexed indirect          (expr),Y indirect indexed
//! ```
//!
//! An `expr` is an optional `<` (low tryte) or `>` (high tryte) selector
//! followed by a number or a symbol with an optional `+N`/`-N` offset.
//! Numbers are decimal, `%` trits, `$` nonary, `&` base 27 or a `'c`
//! character.

use thiserror::Error;
use crate::cpu::opcodes::AddrMode;
use crate::ternary::notation::{self, NotationError};
use crate::ternary::{arith, text, Word};

/// Errors from operand parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("empty operand")]
    Empty,

    #[error("malformed operand '{0}'")]
    Malformed(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error("invalid character literal '{0}'")]
    InvalidCharacter(String),

    #[error("offset from '{0}' overflows")]
    Overflow(String),

    #[error("{0} does not fit in a word")]
    WordRange(i32),
}

/// Which part of a value an expression selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Full,
    /// `<`: trits 0..5.
    Low,
    /// `>`: trits 5..10.
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Number(i32),
    Symbol { name: String, offset: i32 },
}

/// A value expression, possibly referring to a symbol not yet defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub selector: Selector,
    pub term: Term,
}

impl Expr {
    pub fn number(value: i32) -> Self {
        Self { selector: Selector::Full, term: Term::Number(value) }
    }

    /// The symbol this expression depends on, if any.
    pub fn symbol(&self) -> Option<&str> {
        match &self.term {
            Term::Symbol { name, .. } => Some(name),
            Term::Number(_) => None,
        }
    }

    /// Evaluate, looking symbols up with `lookup`. `Ok(None)` if a symbol
    /// is not yet known.
    ///
    /// A `<`/`>` selection needs a value that fits in a word.
    pub fn evaluate(
        &self,
        lookup: impl Fn(&str) -> Option<i32>,
    ) -> Result<Option<i32>, OperandError> {
        let value = match &self.term {
            Term::Number(n) => *n,
            Term::Symbol { name, offset } => match lookup(name) {
                Some(base) => base
                    .checked_add(*offset)
                    .ok_or_else(|| OperandError::Overflow(name.clone()))?,
                None => return Ok(None),
            },
        };
        let selected = match self.selector {
            Selector::Full => value,
            Selector::Low | Selector::High => {
                Word::new(value).map_err(|_| OperandError::WordRange(value))?;
                if self.selector == Selector::Low {
                    arith::low_tryte(value).to_i32()
                } else {
                    arith::high_tryte(value).to_i32()
                }
            }
        };
        Ok(Some(selected))
    }

    pub fn parse(text: &str) -> Result<Self, OperandError> {
        let text = text.trim();
        let (selector, rest) = match text.chars().next() {
            Some('<') => (Selector::Low, &text[1..]),
            Some('>') => (Selector::High, &text[1..]),
            Some(_) => (Selector::Full, text),
            None => return Err(OperandError::Empty),
        };
        Ok(Self { selector, term: parse_term(rest)? })
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Whether `name` is a valid label or `.equ` name.
pub fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_symbol_start) && chars.all(is_symbol_char)
}

fn parse_decimal(text: &str) -> Result<i32, OperandError> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(OperandError::InvalidNumber(text.to_string()));
    }
    text.trim_start_matches('+')
        .parse()
        .map_err(|_| OperandError::InvalidNumber(text.to_string()))
}

/// Resolve a backslash escape used in character and string literals.
pub fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        '0' => Some('\0'),
        '\\' | '\'' | '"' => Some(c),
        _ => None,
    }
}

fn parse_char(text: &str) -> Result<i32, OperandError> {
    let invalid = || OperandError::InvalidCharacter(text.to_string());
    let mut chars = text.chars();
    let c = match chars.next() {
        Some('\\') => chars.next().and_then(unescape).ok_or_else(invalid)?,
        Some(c) => c,
        None => return Err(invalid()),
    };
    if chars.next().is_some() {
        return Err(invalid());
    }
    text::encode(c).map(|t| t.to_i32()).ok_or_else(invalid)
}

fn parse_term(text: &str) -> Result<Term, OperandError> {
    let mut chars = text.chars();
    let value = match chars.next() {
        None => return Err(OperandError::Empty),
        Some('%') => notation::parse_trits(chars.as_str())?,
        Some('$') => notation::parse_nonary(chars.as_str())?,
        Some('&') => notation::parse_base27(chars.as_str())?,
        Some('\'') => parse_char(chars.as_str())?,
        Some(c) if is_symbol_start(c) => return parse_symbol(text),
        Some(_) => parse_decimal(text)?,
    };
    Ok(Term::Number(value))
}

fn parse_symbol(text: &str) -> Result<Term, OperandError> {
    let end = text.find(['+', '-']).unwrap_or(text.len());
    let (name, offset) = text.split_at(end);
    if !is_symbol(name) {
        return Err(OperandError::Malformed(text.to_string()));
    }
    let offset = if offset.is_empty() { 0 } else { parse_decimal(offset)? };
    Ok(Term::Symbol { name: name.to_string(), offset })
}

/// A parsed operand: its addressing mode and value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub mode: AddrMode,
    /// `None` for the accumulator.
    pub expr: Option<Expr>,
}

/// Parse operand text into a mode and expression.
pub fn parse_operand(text: &str) -> Result<Operand, OperandError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(OperandError::Empty);
    }
    if text == "A" {
        return Ok(Operand { mode: AddrMode::Accumulator, expr: None });
    }

    let upper = text.to_ascii_uppercase();
    let (mode, inner) = if let Some(rest) = text.strip_prefix('#') {
        (AddrMode::Immediate, rest)
    } else if text.starts_with('(') {
        if upper.ends_with("),Y") {
            (AddrMode::IndirectIndexedY, &text[1..text.len() - 3])
        } else if upper.ends_with(",X)") {
            (AddrMode::IndexedXIndirect, &text[1..text.len() - 3])
        } else if text.ends_with(')') {
            (AddrMode::Indirect, &text[1..text.len() - 1])
        } else {
            return Err(OperandError::Malformed(text.to_string()));
        }
    } else if upper.ends_with(",X") {
        (AddrMode::AbsoluteX, &text[..text.len() - 2])
    } else if upper.ends_with(",Y") {
        (AddrMode::AbsoluteY, &text[..text.len() - 2])
    } else {
        (AddrMode::Absolute, text)
    };

    let expr = Expr::parse(inner).map_err(|e| match e {
        OperandError::Empty => OperandError::Malformed(text.to_string()),
        other => other,
    })?;
    Ok(Operand { mode, expr: Some(expr) })
}
