//! The packed 9-trit status register.
//!
//! ```text
//!  trit:   8 7 6 5 4 3 2 1 0
//!  flag:   R H U V S D C I L
//! ```
//!
//! Each flag is addressed by a signed offset in [-4, 4] (trit index minus
//! four). Branch instructions select their flag by that same offset.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::ternary::{arith, Trit, Tryte, Word};

/// A named status flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Flag {
    /// Least significant trit of the last result.
    L = -4,
    /// Interrupt mask level.
    I = -3,
    /// Carry.
    C = -2,
    /// Shift-in data trit.
    D = -1,
    /// Sign of the last result.
    S = 0,
    /// Overflow.
    V = 1,
    /// Unused.
    U = 2,
    /// Halt code.
    H = 3,
    /// Run direction; zero when halted.
    R = 4,
}

impl Flag {
    pub const ALL: [Flag; 9] = [
        Flag::L, Flag::I, Flag::C, Flag::D, Flag::S,
        Flag::V, Flag::U, Flag::H, Flag::R,
    ];

    #[inline]
    pub const fn offset(self) -> i32 {
        self as i32
    }

    #[inline]
    fn index(self) -> u32 {
        (self.offset() + 4) as u32
    }

    /// Look up a flag by its offset.
    pub fn from_offset(offset: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.offset() == offset)
    }

    pub fn letter(self) -> char {
        match self {
            Flag::L => 'L',
            Flag::I => 'I',
            Flag::C => 'C',
            Flag::D => 'D',
            Flag::S => 'S',
            Flag::V => 'V',
            Flag::U => 'U',
            Flag::H => 'H',
            Flag::R => 'R',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.letter() == c)
    }
}

/// The status register.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    value: i32,
}

impl Flags {
    /// Number of trits in the register.
    pub const WIDTH: usize = 9;

    /// All flags zero.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Power-on state: running forward with only vector 0 unmasked.
    pub fn reset() -> Self {
        let mut flags = Self::new();
        flags.set(Flag::R, Trit::P);
        flags.set(Flag::I, Trit::N);
        flags
    }

    /// Rebuild from a packed value. Trits above the ninth are discarded.
    pub fn from_value(value: i32) -> Self {
        Self { value: arith::slice_trits(value, 0, Self::WIDTH) }
    }

    /// The packed value.
    #[inline]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// The packed value as a word, for PHP.
    pub fn to_word(&self) -> Word {
        Word::from_i32(self.value)
    }

    pub fn get(&self, flag: Flag) -> Trit {
        arith::get_trit(self.value, flag.index() as usize)
    }

    pub fn set(&mut self, flag: Flag, trit: Trit) {
        let weight = 3i32.pow(flag.index());
        let old = self.get(flag).to_i32();
        self.value += (trit.to_i32() - old) * weight;
    }

    /// Record S and L from a result.
    pub fn update_sign(&mut self, result: Tryte) {
        self.set(Flag::S, result.sign());
        self.set(Flag::L, result.lst());
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.get(Flag::R).is_zero()
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({} = {})", self, self.value)
    }
}

/// Renders as `R=1 H=0 ... L=0` style pairs, most significant first.
impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in Flag::ALL.iter().rev().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", flag.letter(), self.get(*flag))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_packed() {
        let mut flags = Flags::new();
        assert_eq!(flags.get(Flag::L), Trit::O);

        flags.set(Flag::L, Trit::P);
        assert_eq!(flags.get(Flag::L), Trit::P);
        assert_eq!(flags.value(), 1);

        flags.set(Flag::L, Trit::N);
        assert_eq!(flags.value(), -1);

        flags.set(Flag::R, Trit::P);
        assert_eq!(flags.get(Flag::R), Trit::P);
        assert_eq!(flags.value(), 6560);
    }

    #[test]
    fn test_flags_independent() {
        let mut flags = Flags::new();
        for (i, flag) in Flag::ALL.into_iter().enumerate() {
            let t = Trit::ALL[i % 3];
            flags.set(flag, t);
        }
        for (i, flag) in Flag::ALL.into_iter().enumerate() {
            assert_eq!(flags.get(flag), Trit::ALL[i % 3], "{:?}", flag);
        }
    }

    #[test]
    fn test_reset_value() {
        let flags = Flags::reset();
        assert_eq!(flags.value(), 6558);
        assert_eq!(flags.get(Flag::I), Trit::N);
        assert!(!flags.is_halted());
    }

    #[test]
    fn test_update_sign() {
        let mut flags = Flags::new();
        flags.update_sign(Tryte::from_i32(100));
        assert_eq!(flags.get(Flag::S), Trit::P);
        assert_eq!(flags.get(Flag::L), Trit::P);
        flags.update_sign(Tryte::from_i32(-3));
        assert_eq!(flags.get(Flag::S), Trit::N);
        assert_eq!(flags.get(Flag::L), Trit::O);
    }

    #[test]
    fn test_from_value_truncates() {
        let flags = Flags::from_value(6640);
        assert_eq!(flags.value(), 6640);
        assert_eq!(Flags::from_value(19683 + 5).value(), 5);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(Flag::from_offset(0), Some(Flag::S));
        assert_eq!(Flag::from_offset(-4), Some(Flag::L));
        assert_eq!(Flag::from_offset(5), None);
        assert_eq!(Flag::from_letter('V'), Some(Flag::V));
    }
}
