//! Arithmetic, logic and load/store execution.
//!
//! Every ALU operation works through an [`Operand`]: a register, a memory
//! address or an immediate literal. Immediates can be read but not written.

use tracing::trace;
use crate::cpu::decode::DecodedOperand;
use crate::cpu::execute::CpuError;
use crate::cpu::flags::Flag;
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::opcodes::{AddrMode, AluOp};
use crate::cpu::registers::Registers;
use crate::ternary::{arith, Trit, TritOps, Tryte};

/// A resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Accumulator,
    IndexX,
    IndexY,
    /// A memory cell.
    Address(i32),
    /// A literal from the instruction stream.
    Immediate(Tryte),
}

impl Operand {
    /// Compute the effective operand for a raw decoded operand.
    ///
    /// Indirect modes read their pointer word from memory, so this can
    /// trigger read traps.
    pub fn resolve(
        raw: DecodedOperand,
        regs: &Registers,
        mem: &mut Memory,
    ) -> Result<Self, MemoryError> {
        let value = raw.value;
        Ok(match raw.mode {
            AddrMode::Accumulator => Operand::Accumulator,
            AddrMode::Immediate => Operand::Immediate(Tryte::from_i32(value)),
            AddrMode::Absolute => Operand::Address(value),
            AddrMode::AbsoluteX => Operand::Address(regs.indexed_x(value)),
            AddrMode::AbsoluteY => Operand::Address(regs.indexed_y(value)),
            AddrMode::Indirect => Operand::Address(mem.read_word(value)?.to_i32()),
            AddrMode::IndexedXIndirect => {
                Operand::Address(mem.read_word(regs.indexed_x(value))?.to_i32())
            }
            AddrMode::IndirectIndexedY => {
                Operand::Address(regs.indexed_y(mem.read_word(value)?.to_i32()))
            }
        })
    }
}

/// What the CPU must do after an ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Continue,
    /// DNOP executed.
    DebugNop,
}

/// ALU bound to the register file and memory for one instruction.
pub struct Alu<'a> {
    regs: &'a mut Registers,
    mem: &'a mut Memory,
}

impl<'a> Alu<'a> {
    pub fn new(regs: &'a mut Registers, mem: &'a mut Memory) -> Self {
        Self { regs, mem }
    }

    /// Read an operand.
    pub fn read(&mut self, operand: Operand) -> Result<Tryte, CpuError> {
        Ok(match operand {
            Operand::Accumulator => self.regs.accum,
            Operand::IndexX => self.regs.index,
            Operand::IndexY => self.regs.yindex,
            Operand::Address(addr) => self.mem.read(addr)?,
            Operand::Immediate(value) => value,
        })
    }

    /// Write an operand. Immediates are read-only.
    pub fn write(&mut self, operand: Operand, value: Tryte) -> Result<(), CpuError> {
        match operand {
            Operand::Accumulator => self.regs.accum = value,
            Operand::IndexX => self.regs.index = value,
            Operand::IndexY => self.regs.yindex = value,
            Operand::Address(addr) => self.mem.write(addr, value)?,
            Operand::Immediate(literal) => {
                return Err(CpuError::OperandNotWritable(literal.to_i32()));
            }
        }
        Ok(())
    }

    /// Apply `f` to an operand in place and record S and L from the result.
    pub fn modify(
        &mut self,
        operand: Operand,
        f: impl FnOnce(Tryte) -> Tryte,
    ) -> Result<Tryte, CpuError> {
        let value = f(self.read(operand)?);
        self.write(operand, value)?;
        self.regs.flags.update_sign(value);
        Ok(value)
    }

    fn load(&mut self, target: Operand, source: Operand) -> Result<(), CpuError> {
        let value = self.read(source)?;
        self.write(target, value)?;
        self.regs.flags.update_sign(value);
        Ok(())
    }

    fn store(&mut self, source: Operand, target: Operand) -> Result<(), CpuError> {
        let value = self.read(source)?;
        self.write(target, value)
    }

    fn add_with_carry(&mut self, addend: Tryte) {
        let carry_in = self.regs.flags.get(Flag::C);
        let sum = arith::add(self.regs.accum, addend, carry_in);
        self.regs.accum = sum.result;
        self.regs.flags.set(Flag::C, sum.carry);
        self.regs.flags.set(Flag::V, sum.overflow);
        self.regs.flags.update_sign(sum.result);
    }

    fn compare(&mut self, register: Operand, operand: Operand) -> Result<(), CpuError> {
        let register = self.read(register)?;
        let value = self.read(operand)?;
        let difference = register.to_i32() - value.to_i32();
        let wrapped = arith::add(register, -value, Trit::O).result;
        self.regs.flags.set(Flag::S, Trit::from_sign(difference));
        self.regs.flags.set(Flag::L, wrapped.lst());
        Ok(())
    }

    fn logic(&mut self, operand: Operand, f: fn(Tryte, Tryte) -> Tryte) -> Result<(), CpuError> {
        let value = self.read(operand)?;
        let result = f(self.regs.accum, value);
        self.regs.accum = result;
        self.regs.flags.update_sign(result);
        Ok(())
    }

    /// Shift toward the most significant trit: D enters at trit 0 and the
    /// old top trit goes to C.
    fn shift_left(&mut self, operand: Operand) -> Result<(), CpuError> {
        let trits = self.read(operand)?.trits();
        let fill = self.regs.flags.get(Flag::D);
        let shifted = Tryte::from_trits([fill, trits[0], trits[1], trits[2], trits[3]]);
        self.write(operand, shifted)?;
        self.regs.flags.set(Flag::C, trits[4]);
        self.regs.flags.update_sign(shifted);
        Ok(())
    }

    /// Shift toward the least significant trit: C enters at the top and the
    /// old trit 0 goes to D.
    fn shift_right(&mut self, operand: Operand) -> Result<(), CpuError> {
        let trits = self.read(operand)?.trits();
        let fill = self.regs.flags.get(Flag::C);
        let shifted = Tryte::from_trits([trits[1], trits[2], trits[3], trits[4], fill]);
        self.write(operand, shifted)?;
        self.regs.flags.set(Flag::D, trits[0]);
        self.regs.flags.update_sign(shifted);
        Ok(())
    }

    /// Execute one ALU operation.
    pub fn execute(&mut self, op: AluOp, operand: Operand) -> Result<Effect, CpuError> {
        trace!(?op, ?operand, "alu");

        match op {
            AluOp::Lda => self.load(Operand::Accumulator, operand)?,
            AluOp::Ldx => self.load(Operand::IndexX, operand)?,
            AluOp::Ldy => self.load(Operand::IndexY, operand)?,
            AluOp::Sta => self.store(Operand::Accumulator, operand)?,
            AluOp::Stx => self.store(Operand::IndexX, operand)?,
            AluOp::Sty => self.store(Operand::IndexY, operand)?,

            AluOp::Adc => {
                let value = self.read(operand)?;
                self.add_with_carry(value);
            }
            AluOp::Sbc => {
                let value = self.read(operand)?;
                self.add_with_carry(-value);
            }
            AluOp::Inc => {
                self.modify(operand, arith::inc)?;
            }
            AluOp::Dec => {
                self.modify(operand, arith::dec)?;
            }

            AluOp::Cmp => self.compare(Operand::Accumulator, operand)?,
            AluOp::Cpx => self.compare(Operand::IndexX, operand)?,
            AluOp::Cpy => self.compare(Operand::IndexY, operand)?,

            AluOp::Nti => {
                self.modify(operand, |v| v.map_trits(Trit::nti))?;
            }
            AluOp::Sti => {
                self.modify(operand, |v| v.map_trits(Trit::neg))?;
            }
            AluOp::Pti => {
                self.modify(operand, |v| v.map_trits(Trit::pti))?;
            }
            AluOp::Fd => {
                self.modify(operand, |v| v.map_trits(Trit::forward_diode))?;
            }
            AluOp::Rd => {
                self.modify(operand, |v| v.map_trits(Trit::reverse_diode))?;
            }

            AluOp::Ora => self.logic(operand, <Tryte as TritOps>::tor)?,
            AluOp::And => self.logic(operand, <Tryte as TritOps>::tand)?,
            AluOp::But => self.logic(operand, <Tryte as TritOps>::but)?,
            AluOp::Eor => self.logic(operand, <Tryte as TritOps>::xmax)?,

            AluOp::Shl => self.shift_left(operand)?,
            AluOp::Shr => self.shift_right(operand)?,

            AluOp::Dnop => return Ok(Effect::DebugNop),
        }
        Ok(Effect::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ternary::notation::parse_trits;

    fn t(v: i32) -> Tryte {
        Tryte::from_i32(v)
    }

    fn bt(s: &str) -> Tryte {
        t(parse_trits(s).unwrap())
    }

    fn setup() -> (Registers, Memory) {
        (Registers::new(), Memory::new(243).unwrap())
    }

    #[test]
    fn test_load_sets_sign_and_lst() {
        let (mut regs, mut mem) = setup();
        let mut alu = Alu::new(&mut regs, &mut mem);
        alu.execute(AluOp::Lda, Operand::Immediate(t(-3))).unwrap();
        assert_eq!(regs.accum, -3);
        assert_eq!(regs.flags.get(Flag::S), Trit::N);
        assert_eq!(regs.flags.get(Flag::L), Trit::O);
    }

    #[test]
    fn test_store_leaves_flags() {
        let (mut regs, mut mem) = setup();
        regs.accum = t(42);
        let before = regs.flags;
        Alu::new(&mut regs, &mut mem).execute(AluOp::Sta, Operand::Address(-5)).unwrap();
        assert_eq!(mem.peek(-5).unwrap(), 42);
        assert_eq!(regs.flags, before);
    }

    #[test]
    fn test_write_immediate_fails() {
        let (mut regs, mut mem) = setup();
        let mut alu = Alu::new(&mut regs, &mut mem);
        assert!(matches!(
            alu.execute(AluOp::Sta, Operand::Immediate(t(7))),
            Err(CpuError::OperandNotWritable(7))
        ));
        assert!(matches!(
            alu.execute(AluOp::Inc, Operand::Immediate(t(7))),
            Err(CpuError::OperandNotWritable(7))
        ));
    }

    #[test]
    fn test_adc_overflow() {
        let (mut regs, mut mem) = setup();
        regs.accum = t(121);
        regs.flags.set(Flag::C, Trit::N);
        Alu::new(&mut regs, &mut mem).execute(AluOp::Adc, Operand::Immediate(t(121))).unwrap();
        assert_eq!(regs.accum, -2);
        assert_eq!(regs.flags.get(Flag::V), Trit::P);
        assert_eq!(regs.flags.get(Flag::C), Trit::P);
    }

    #[test]
    fn test_sbc_uses_carry() {
        let (mut regs, mut mem) = setup();
        regs.accum = t(10);
        regs.flags.set(Flag::C, Trit::P);
        Alu::new(&mut regs, &mut mem).execute(AluOp::Sbc, Operand::Immediate(t(3))).unwrap();
        assert_eq!(regs.accum, 8);
        assert_eq!(regs.flags.get(Flag::C), Trit::O);
    }

    #[test]
    fn test_inc_dec_in_place() {
        let (mut regs, mut mem) = setup();
        mem.write(3, t(121)).unwrap();
        let mut alu = Alu::new(&mut regs, &mut mem);
        alu.execute(AluOp::Inc, Operand::Address(3)).unwrap();
        alu.execute(AluOp::Dec, Operand::Accumulator).unwrap();
        assert_eq!(mem.peek(3).unwrap(), -121);
        assert_eq!(regs.accum, -1);
        assert_eq!(regs.flags.get(Flag::C), Trit::O);
    }

    #[test]
    fn test_compare_uses_true_difference() {
        let (mut regs, mut mem) = setup();
        regs.accum = t(100);
        Alu::new(&mut regs, &mut mem).execute(AluOp::Cmp, Operand::Immediate(t(-100))).unwrap();
        // 200 wraps to -43, but the sign follows the true difference
        assert_eq!(regs.flags.get(Flag::S), Trit::P);
        assert_eq!(regs.flags.get(Flag::L), t(-43).lst());
        assert_eq!(regs.accum, 100);

        regs.index = t(33);
        Alu::new(&mut regs, &mut mem).execute(AluOp::Cpx, Operand::Immediate(t(33))).unwrap();
        assert_eq!(regs.flags.get(Flag::S), Trit::O);
    }

    #[test]
    fn test_unary_maps() {
        let (mut regs, mut mem) = setup();
        regs.accum = bt("00i01");
        Alu::new(&mut regs, &mut mem).execute(AluOp::Pti, Operand::Accumulator).unwrap();
        assert_eq!(regs.accum, 119);

        regs.accum = bt("i01i0");
        Alu::new(&mut regs, &mut mem).execute(AluOp::Sti, Operand::Accumulator).unwrap();
        assert_eq!(regs.accum, bt("10i10"));

        Alu::new(&mut regs, &mut mem).execute(AluOp::Fd, Operand::Accumulator).unwrap();
        assert_eq!(regs.accum, bt("10010"));
    }

    #[test]
    fn test_dyadic_logic() {
        let (mut regs, mut mem) = setup();
        let cases = [
            (AluOp::Ora, "i010i", "iii11", "i0111"),
            (AluOp::Ora, "10i10", "00000", "10010"),
            (AluOp::And, "i010i", "111ii", "i01ii"),
            (AluOp::And, "i010i", "00000", "i000i"),
            (AluOp::But, "i010i", "00111", "0010i"),
            (AluOp::But, "i010i", "iiiii", "i0i0i"),
        ];
        for (op, a, m, expected) in cases {
            regs.accum = bt(a);
            Alu::new(&mut regs, &mut mem).execute(op, Operand::Immediate(bt(m))).unwrap();
            assert_eq!(regs.accum, bt(expected), "{:?} {} {}", op, a, m);
        }
    }

    #[test]
    fn test_shifts() {
        let (mut regs, mut mem) = setup();
        regs.accum = bt("001i1");
        regs.flags.set(Flag::C, Trit::N);
        Alu::new(&mut regs, &mut mem).execute(AluOp::Shr, Operand::Accumulator).unwrap();
        assert_eq!(regs.accum, bt("i001i"));
        assert_eq!(regs.flags.get(Flag::D), Trit::P);
        assert_eq!(regs.flags.get(Flag::L), Trit::N);

        regs.accum = bt("00iii");
        regs.flags.set(Flag::D, Trit::P);
        Alu::new(&mut regs, &mut mem).execute(AluOp::Shl, Operand::Accumulator).unwrap();
        assert_eq!(regs.accum, bt("0iii1"));
        assert_eq!(regs.flags.get(Flag::C), Trit::O);
    }

    #[test]
    fn test_resolve_indirect_modes() {
        let (mut regs, mut mem) = setup();
        regs.index = t(2);
        regs.yindex = t(1);
        mem.write_word(10, crate::ternary::Word::from_i32(50)).unwrap();
        mem.write_word(12, crate::ternary::Word::from_i32(-60)).unwrap();

        let raw = |mode, value| DecodedOperand { mode, value, consumed: 2 };
        let resolve = |mode, value, mem: &mut Memory| {
            Operand::resolve(raw(mode, value), &regs, mem).unwrap()
        };
        assert_eq!(resolve(AddrMode::AbsoluteX, 10, &mut mem), Operand::Address(12));
        assert_eq!(resolve(AddrMode::AbsoluteY, 10, &mut mem), Operand::Address(11));
        assert_eq!(resolve(AddrMode::Indirect, 10, &mut mem), Operand::Address(50));
        assert_eq!(resolve(AddrMode::IndexedXIndirect, 10, &mut mem), Operand::Address(-60));
        assert_eq!(resolve(AddrMode::IndirectIndexedY, 10, &mut mem), Operand::Address(51));
    }

    #[test]
    fn test_dnop_effect() {
        let (mut regs, mut mem) = setup();
        let effect = Alu::new(&mut regs, &mut mem).execute(AluOp::Dnop, Operand::Accumulator).unwrap();
        assert_eq!(effect, Effect::DebugNop);
    }
}
