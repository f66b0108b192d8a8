//! Extended operations: register transfers, flag control, stack and
//! subroutine handling, jumps, software interrupts and halts.

use tracing::{debug, trace};
use crate::cpu::alu::{Alu, Operand};
use crate::cpu::decode::DecodedOperand;
use crate::cpu::execute::{Cpu, CpuError, Flow};
use crate::cpu::flags::{Flag, Flags};
use crate::cpu::opcodes::XOp;
use crate::cpu::stack::Stack;
use crate::ternary::{arith, Trit, Tryte, Word};

impl Cpu {
    fn stack(&mut self) -> Stack<'_> {
        Stack::new(&mut self.mem, &mut self.regs.stackptr)
    }

    fn set_flag(&mut self, flag: Flag, value: Trit) {
        self.regs.flags.set(flag, value);
    }

    fn halt(&mut self, code: Trit) {
        self.set_flag(Flag::H, code);
        self.set_flag(Flag::R, Trit::O);
        debug!(pc = self.regs.pc, ?code, "halt instruction");
    }

    /// Copy a register through the ALU so S and L follow the value.
    fn transfer(&mut self, from: Operand, to: Operand) -> Result<(), CpuError> {
        let mut alu = Alu::new(&mut self.regs, &mut self.mem);
        let value = alu.read(from)?;
        alu.modify(to, |_| value)?;
        Ok(())
    }

    fn pull_into(&mut self, to: Operand) -> Result<(), CpuError> {
        let value = self.stack().pull()?;
        Alu::new(&mut self.regs, &mut self.mem).modify(to, |_| value)?;
        Ok(())
    }

    fn step_register(&mut self, register: Operand, f: fn(Tryte) -> Tryte) -> Result<(), CpuError> {
        Alu::new(&mut self.regs, &mut self.mem).modify(register, f)?;
        Ok(())
    }

    /// Execute an extended operation. `last` is the address of the final
    /// operand tryte (or the opcode itself when there is no operand).
    pub(super) fn execute_xop(
        &mut self,
        op: XOp,
        raw: DecodedOperand,
        last: i32,
    ) -> Result<Flow, CpuError> {
        trace!(?op, "xop");

        if let Some(alu_op) = op.alu_alias() {
            let operand = Operand::resolve(raw, &self.regs, &mut self.mem)?;
            Alu::new(&mut self.regs, &mut self.mem).execute(alu_op, operand)?;
            return Ok(Flow::Next);
        }

        match op {
            XOp::HaltN => self.halt(Trit::N),
            XOp::HaltZ => self.halt(Trit::O),
            XOp::HaltP => self.halt(Trit::P),

            XOp::Stz | XOp::StzX | XOp::StzY | XOp::StzIndY | XOp::StzXInd => {
                let operand = Operand::resolve(raw, &self.regs, &mut self.mem)?;
                Alu::new(&mut self.regs, &mut self.mem).write(operand, Tryte::ZERO)?;
            }

            XOp::Clc => self.set_flag(Flag::C, Trit::O),
            XOp::Secp => self.set_flag(Flag::C, Trit::P),
            XOp::Secn => self.set_flag(Flag::C, Trit::N),
            XOp::Clv => self.set_flag(Flag::V, Trit::O),
            XOp::Cli => self.set_flag(Flag::I, Trit::O),
            XOp::Sein => self.set_flag(Flag::I, Trit::N),
            XOp::Seip => self.set_flag(Flag::I, Trit::P),
            XOp::Cld => self.set_flag(Flag::D, Trit::O),
            XOp::Sedp => self.set_flag(Flag::D, Trit::P),
            XOp::Sedn => self.set_flag(Flag::D, Trit::N),

            XOp::IntN => {
                self.interrupt(Trit::N, None)?;
            }
            XOp::IntZ => {
                self.interrupt(Trit::O, None)?;
            }
            XOp::IntP => {
                self.interrupt(Trit::P, None)?;
            }

            XOp::Nop => {}

            XOp::Tax => self.transfer(Operand::Accumulator, Operand::IndexX)?,
            XOp::Tay => self.transfer(Operand::Accumulator, Operand::IndexY)?,
            XOp::Txa => self.transfer(Operand::IndexX, Operand::Accumulator)?,
            XOp::Tya => self.transfer(Operand::IndexY, Operand::Accumulator)?,

            XOp::Inx => self.step_register(Operand::IndexX, arith::inc)?,
            XOp::Iny => self.step_register(Operand::IndexY, arith::inc)?,
            XOp::Dex => self.step_register(Operand::IndexX, arith::dec)?,
            XOp::Dey => self.step_register(Operand::IndexY, arith::dec)?,

            XOp::Txys => {
                self.regs.stackptr = arith::word(self.regs.yindex, self.regs.index);
            }
            XOp::Tsxy => {
                self.regs.index = arith::low_tryte(self.regs.stackptr);
                self.regs.yindex = arith::high_tryte(self.regs.stackptr);
            }

            XOp::Pha => {
                let value = self.regs.accum;
                self.stack().push(value)?;
            }
            XOp::Phx => {
                let value = self.regs.index;
                self.stack().push(value)?;
            }
            XOp::Phy => {
                let value = self.regs.yindex;
                self.stack().push(value)?;
            }
            XOp::Php => {
                let flags = self.regs.flags.to_word();
                self.stack().push_word(flags)?;
            }
            XOp::Pla => self.pull_into(Operand::Accumulator)?,
            XOp::Plx => self.pull_into(Operand::IndexX)?,
            XOp::Ply => self.pull_into(Operand::IndexY)?,
            XOp::Plp => {
                let word = self.stack().pull_word()?;
                self.regs.flags = Flags::from_value(word.to_i32());
            }

            XOp::Jsr => {
                self.stack().push_word(Word::from_i32(last))?;
                return Ok(Flow::Jump(raw.value));
            }
            XOp::Jmp => return Ok(Flow::Jump(raw.value)),
            XOp::JmpInd => {
                let target = self.mem.read_word(raw.value)?;
                return Ok(Flow::Jump(target.to_i32()));
            }
            XOp::Rts => {
                let from = self.stack().pull_word()?;
                return Ok(Flow::Jump(from.to_i32() + self.regs.direction().to_i32()));
            }

            // ALU aliases are handled above
            XOp::LdaIndY | XOp::LdaX | XOp::LdaY | XOp::LdaXInd
            | XOp::StaIndY | XOp::StaX | XOp::StaY | XOp::StaXInd
            | XOp::CmpIndY | XOp::CmpX | XOp::CmpY
            | XOp::LdxY | XOp::LdyX | XOp::StxY | XOp::StyX => {}
        }

        Ok(Flow::Next)
    }
}
