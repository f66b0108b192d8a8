//! Single balanced ternary digit (trit).
//!
//! A trit can hold one of three values: -1, 0, or +1. Besides the usual
//! negation/min/max, this module carries the per-trit truth tables used by
//! the ALU's unary inverters and dyadic functions.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single balanced ternary digit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i8)]
pub enum Trit {
    /// Negative (-1), written `i`
    N = -1,
    /// Zero (0)
    O = 0,
    /// Positive (+1)
    P = 1,
}

impl Trit {
    /// All possible trit values in order: N, O, P
    pub const ALL: [Trit; 3] = [Trit::N, Trit::O, Trit::P];

    /// Create a trit from an integer value, or `None` outside {-1, 0, 1}.
    #[inline]
    pub const fn new(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Trit::N),
            0 => Some(Trit::O),
            1 => Some(Trit::P),
            _ => None,
        }
    }

    /// Create a trit from the sign of an integer.
    #[inline]
    pub const fn from_sign(value: i32) -> Self {
        if value < 0 {
            Trit::N
        } else if value > 0 {
            Trit::P
        } else {
            Trit::O
        }
    }

    /// Convert to integer value.
    #[inline]
    pub const fn to_i8(self) -> i8 {
        self as i8
    }

    /// Convert to a wider integer value.
    #[inline]
    pub const fn to_i32(self) -> i32 {
        self as i32
    }

    /// Negate the trit (flip N ↔ P, O stays O).
    ///
    /// This is also the simple ternary inverter (STI).
    #[inline]
    pub const fn neg(self) -> Self {
        match self {
            Trit::N => Trit::P,
            Trit::O => Trit::O,
            Trit::P => Trit::N,
        }
    }

    /// Negative ternary inverter: `i01 -> 1ii`.
    #[inline]
    pub const fn nti(self) -> Self {
        match self {
            Trit::N => Trit::P,
            Trit::O | Trit::P => Trit::N,
        }
    }

    /// Positive ternary inverter: `i01 -> 11i`.
    #[inline]
    pub const fn pti(self) -> Self {
        match self {
            Trit::N | Trit::O => Trit::P,
            Trit::P => Trit::N,
        }
    }

    /// Forward diode: `i01 -> 001`.
    #[inline]
    pub const fn forward_diode(self) -> Self {
        match self {
            Trit::P => Trit::P,
            _ => Trit::O,
        }
    }

    /// Reverse diode: `i01 -> i00`.
    #[inline]
    pub const fn reverse_diode(self) -> Self {
        match self {
            Trit::N => Trit::N,
            _ => Trit::O,
        }
    }

    /// Minimum (ternary AND) - returns the lesser value.
    #[inline]
    pub const fn min(self, other: Self) -> Self {
        if self.to_i8() <= other.to_i8() { self } else { other }
    }

    /// Maximum (ternary OR) - returns the greater value.
    #[inline]
    pub const fn max(self, other: Self) -> Self {
        if self.to_i8() >= other.to_i8() { self } else { other }
    }

    /// BUT: preference order 0, then -1, then 1.
    #[inline]
    pub const fn but(self, other: Self) -> Self {
        match (self, other) {
            (Trit::O, _) | (_, Trit::O) => Trit::O,
            (Trit::N, _) | (_, Trit::N) => Trit::N,
            (Trit::P, Trit::P) => Trit::P,
        }
    }

    /// Exclusive max: the maximum of two different trits, N when they match.
    #[inline]
    pub const fn exclusive_max(self, other: Self) -> Self {
        if self.to_i8() == other.to_i8() {
            Trit::N
        } else {
            self.max(other)
        }
    }

    /// Returns true if this trit is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self, Trit::O)
    }

    /// Character used in balanced ternary literals (`i`, `0`, `1`).
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Trit::N => 'i',
            Trit::O => '0',
            Trit::P => '1',
        }
    }

    /// Parse a balanced ternary digit. Accepts `i`/`T`/`-` for -1.
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'i' | 'I' | 'T' | 't' | '-' => Some(Trit::N),
            '0' => Some(Trit::O),
            '1' | '+' => Some(Trit::P),
            _ => None,
        }
    }
}

impl Default for Trit {
    fn default() -> Self {
        Trit::O
    }
}

impl fmt::Debug for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trit::N => write!(f, "N"),
            Trit::O => write!(f, "O"),
            Trit::P => write!(f, "P"),
        }
    }
}

impl fmt::Display for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl std::ops::Neg for Trit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Trit::neg(self)
    }
}

impl From<Trit> for i8 {
    fn from(trit: Trit) -> Self {
        trit.to_i8()
    }
}

impl From<Trit> for i32 {
    fn from(trit: Trit) -> Self {
        trit.to_i32()
    }
}
