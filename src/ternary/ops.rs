//! Tritwise logic.
//!
//! The dyadic functions apply a two-input truth table to each trit position;
//! the unary inverters and diodes apply a one-input table.

use crate::ternary::{Trit, Tryte};

/// Types that support tritwise logic functions.
pub trait TritOps: Sized {
    /// Apply a per-trit function to every position.
    fn map(self, f: fn(Trit) -> Trit) -> Self;

    /// Apply a per-trit-pair function to every position.
    fn zip(self, other: Self, f: fn(Trit, Trit) -> Trit) -> Self;

    /// Tritwise maximum (TOR).
    fn tor(self, other: Self) -> Self {
        self.zip(other, Trit::max)
    }

    /// Tritwise minimum (TAND).
    fn tand(self, other: Self) -> Self {
        self.zip(other, Trit::min)
    }

    /// Tritwise BUT: prefers 0, then -1, then 1.
    fn but(self, other: Self) -> Self {
        self.zip(other, Trit::but)
    }

    /// Tritwise exclusive maximum.
    fn xmax(self, other: Self) -> Self {
        self.zip(other, Trit::exclusive_max)
    }
}

impl TritOps for Trit {
    #[inline]
    fn map(self, f: fn(Trit) -> Trit) -> Trit {
        f(self)
    }

    #[inline]
    fn zip(self, other: Self, f: fn(Trit, Trit) -> Trit) -> Trit {
        f(self, other)
    }
}

impl TritOps for Tryte {
    fn map(self, f: fn(Trit) -> Trit) -> Tryte {
        self.map_trits(f)
    }

    fn zip(self, other: Self, f: fn(Trit, Trit) -> Trit) -> Tryte {
        self.zip_trits(other, f)
    }
}
