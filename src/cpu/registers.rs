//! Architectural register state.
//!
//! - A (`accum`): 5-trit accumulator
//! - X (`index`), Y (`yindex`): 5-trit index registers
//! - `pc`: program counter, a word address
//! - `stackptr`: stack pointer, a word address
//! - `flags`: the packed status register
//!
//! `Registers` is `Copy`; an interrupt snapshot is a plain copy.

use serde::{Serialize, Deserialize};
use crate::cpu::flags::{Flag, Flags};
use crate::ternary::{Trit, Tryte};

/// The register file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub pc: i32,
    pub accum: Tryte,
    pub index: Tryte,
    pub yindex: Tryte,
    pub stackptr: i32,
    pub flags: Flags,
}

impl Registers {
    /// Power-on state: everything zero, flags reset.
    pub fn new() -> Self {
        Self {
            pc: 0,
            accum: Tryte::ZERO,
            index: Tryte::ZERO,
            yindex: Tryte::ZERO,
            stackptr: 0,
            flags: Flags::reset(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The run direction trit (R flag).
    #[inline]
    pub fn direction(&self) -> Trit {
        self.flags.get(Flag::R)
    }

    /// Address `steps` cells away from pc in the run direction.
    #[inline]
    pub fn pc_offset(&self, steps: i32) -> i32 {
        self.pc + steps * self.direction().to_i32()
    }

    /// Absolute address plus X.
    #[inline]
    pub fn indexed_x(&self, base: i32) -> i32 {
        base + self.index.to_i32()
    }

    /// Absolute address plus Y.
    #[inline]
    pub fn indexed_y(&self, base: i32) -> i32 {
        base + self.yindex.to_i32()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registers() {
        let regs = Registers::new();
        assert_eq!(regs.pc, 0);
        assert_eq!(regs.accum, 0);
        assert_eq!(regs.flags.value(), 6558);
        assert_eq!(regs.direction(), Trit::P);
    }

    #[test]
    fn test_pc_offset_follows_direction() {
        let mut regs = Registers::new();
        regs.pc = 10;
        assert_eq!(regs.pc_offset(2), 12);

        regs.flags.set(Flag::R, Trit::N);
        assert_eq!(regs.pc_offset(2), 8);

        regs.flags.set(Flag::R, Trit::O);
        assert_eq!(regs.pc_offset(2), 10);
    }

    #[test]
    fn test_indexed_addresses() {
        let mut regs = Registers::new();
        regs.index = Tryte::from_i32(2);
        regs.yindex = Tryte::from_i32(-1);
        assert_eq!(regs.indexed_x(3), 5);
        assert_eq!(regs.indexed_y(0), -1);
    }

    #[test]
    fn test_snapshot_is_copy() {
        let mut regs = Registers::new();
        let snapshot = regs;
        regs.accum = Tryte::from_i32(5);
        regs.flags.set(Flag::C, Trit::P);
        assert_eq!(snapshot.accum, 0);
        assert_eq!(snapshot.flags.get(Flag::C), Trit::O);
    }
}
