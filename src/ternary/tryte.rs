//! Fixed-width balanced ternary values.
//!
//! This module provides the two widths used by the machine:
//! - `Tryte`: 5 trits, the addressable memory cell and register width
//! - `Word`: 10 trits (two trytes), used for addresses and vectors

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::ternary::Trit;
use crate::ternary::arith;

/// A value did not fit the requested ternary width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value {value} out of range [{min}, {max}]")]
pub struct OutOfRange {
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

/// A 5-trit tryte.
///
/// Used for:
/// - Memory cells
/// - Opcodes and 1-tryte operands
/// - The A, X and Y registers
///
/// Value range: -121 to +121
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Tryte(i8);

/// A 10-trit word, stored in memory as a low tryte followed by a high tryte.
///
/// Value range: -29,524 to +29,524
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Word(i16);

// ============================================================================
// Tryte Implementation
// ============================================================================

impl Tryte {
    /// Number of trits in a Tryte.
    pub const WIDTH: usize = 5;

    /// Maximum positive value: +121 (11111)
    pub const MAX: i32 = 121;

    /// Minimum negative value: -121 (iiiii)
    pub const MIN: i32 = -121;

    /// Number of distinct tryte values (3^5).
    pub const RADIX: i32 = 243;

    pub const ZERO: Tryte = Tryte(0);

    /// Create from an integer, failing outside [-121, 121].
    pub fn new(value: i32) -> Result<Self, OutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as i8))
        } else {
            Err(OutOfRange { value, min: Self::MIN, max: Self::MAX })
        }
    }

    /// Create from an integer known to be in range.
    ///
    /// # Panics
    /// Panics if value is outside the range [-121, +121].
    pub fn from_i32(value: i32) -> Self {
        assert!(
            (Self::MIN..=Self::MAX).contains(&value),
            "Value {} out of range for Tryte [{}, {}]",
            value, Self::MIN, Self::MAX
        );
        Self(value as i8)
    }

    /// Create a Tryte from an array of trits (LSB first).
    pub fn from_trits(trits: [Trit; 5]) -> Self {
        Self(arith::from_trits(&trits) as i8)
    }

    /// Get the trits, least significant first.
    pub fn trits(&self) -> [Trit; 5] {
        arith::to_trits(self.to_i32())
    }

    /// Get a single trit by index (0 = LSB).
    #[inline]
    pub fn trit(&self, index: usize) -> Trit {
        self.trits()[index]
    }

    #[inline]
    pub const fn to_i8(self) -> i8 {
        self.0
    }

    #[inline]
    pub const fn to_i32(self) -> i32 {
        self.0 as i32
    }

    /// Negate all trits.
    #[inline]
    pub const fn neg(self) -> Self {
        Self(-self.0)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The sign of this tryte, which is also its leading non-zero trit.
    #[inline]
    pub const fn sign(self) -> Trit {
        Trit::from_sign(self.0 as i32)
    }

    /// The least significant trit.
    #[inline]
    pub fn lst(self) -> Trit {
        self.trit(0)
    }

    /// Apply `f` to every trit.
    pub fn map_trits(self, f: impl Fn(Trit) -> Trit) -> Self {
        Self::from_trits(self.trits().map(f))
    }

    /// Combine two trytes trit by trit.
    pub fn zip_trits(self, other: Self, f: impl Fn(Trit, Trit) -> Trit) -> Self {
        let a = self.trits();
        let b = other.trits();
        let mut out = [Trit::O; 5];
        for i in 0..Self::WIDTH {
            out[i] = f(a[i], b[i]);
        }
        Self::from_trits(out)
    }
}

impl fmt::Debug for Tryte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tryte(%{} = {})", self, self.0)
    }
}

impl fmt::Display for Tryte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in self.trits().iter().rev() {
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

impl std::ops::Neg for Tryte {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Tryte::neg(self)
    }
}

impl TryFrom<i32> for Tryte {
    type Error = OutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Tryte::new(value)
    }
}

impl From<Tryte> for i32 {
    fn from(tryte: Tryte) -> Self {
        tryte.to_i32()
    }
}

impl From<Trit> for Tryte {
    fn from(trit: Trit) -> Self {
        Tryte(trit.to_i8())
    }
}

impl PartialEq<i32> for Tryte {
    fn eq(&self, other: &i32) -> bool {
        self.to_i32() == *other
    }
}

// ============================================================================
// Word Implementation
// ============================================================================

impl Word {
    /// Number of trits in a Word.
    pub const WIDTH: usize = 10;

    /// Maximum positive value: +29,524
    pub const MAX: i32 = 29_524;

    /// Minimum negative value: -29,524
    pub const MIN: i32 = -29_524;

    pub const ZERO: Word = Word(0);

    /// Create from an integer, failing outside [-29524, 29524].
    pub fn new(value: i32) -> Result<Self, OutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as i16))
        } else {
            Err(OutOfRange { value, min: Self::MIN, max: Self::MAX })
        }
    }

    /// Create from an integer known to be in range.
    ///
    /// # Panics
    /// Panics if value is outside the valid range.
    pub fn from_i32(value: i32) -> Self {
        assert!(
            (Self::MIN..=Self::MAX).contains(&value),
            "Value {} out of range for Word [{}, {}]",
            value, Self::MIN, Self::MAX
        );
        Self(value as i16)
    }

    /// Compose from two trytes.
    pub fn from_trytes(low: Tryte, high: Tryte) -> Self {
        Self(arith::word(high, low) as i16)
    }

    #[inline]
    pub const fn to_i32(self) -> i32 {
        self.0 as i32
    }

    /// Extract the low 5-trit half.
    pub fn low(self) -> Tryte {
        arith::low_tryte(self.to_i32())
    }

    /// Extract the high 5-trit half.
    pub fn high(self) -> Tryte {
        arith::high_tryte(self.to_i32())
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word(%{} {} = {})", self.high(), self.low(), self.0)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.high(), self.low())
    }
}

impl TryFrom<i32> for Word {
    type Error = OutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl From<Word> for i32 {
    fn from(word: Word) -> Self {
        word.to_i32()
    }
}

impl From<Tryte> for Word {
    fn from(tryte: Tryte) -> Self {
        Word(tryte.to_i32() as i16)
    }
}

// ============================================================================
// Tests
// ============================================================================
