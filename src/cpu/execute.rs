//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle, branch evaluation and
//! interrupt dispatch. The run direction flag R drives everything: operand
//! trytes are fetched at `pc + R` and `pc + 2R`, sequential instructions
//! continue at `last + R`, and R = 0 means halted.

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, trace};
use crate::asm::Program;
use crate::cpu::alu::{Alu, Effect, Operand};
use crate::cpu::decode::{self, DecodeError, DecodedOperand, Instruction};
use crate::cpu::flags::Flag;
use crate::cpu::memory::{Memory, MemoryError, DEFAULT_TRYTE_COUNT};
use crate::cpu::opcodes::AddrMode;
use crate::cpu::registers::Registers;
use crate::ternary::{Trit, Tryte, Word};

/// CPU execution state, derived from the R flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// R = 1.
    RunningForward,
    /// R = -1.
    RunningBackward,
    /// R = 0, after a HALT instruction.
    Halted,
}

impl CpuState {
    pub fn from_direction(direction: Trit) -> Self {
        match direction {
            Trit::P => CpuState::RunningForward,
            Trit::N => CpuState::RunningBackward,
            Trit::O => CpuState::Halted,
        }
    }
}

/// Construction options, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuOptions {
    /// Number of memory cells; must be odd.
    pub tryte_count: usize,
    /// Make DNOP fail with [`CpuError::DebugTrap`] instead of logging.
    pub dnop_traps: bool,
}

impl Default for CpuOptions {
    fn default() -> Self {
        Self {
            tryte_count: DEFAULT_TRYTE_COUNT,
            dnop_traps: false,
        }
    }
}

impl CpuOptions {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Where execution continues after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue at the cell after the last operand, in the run direction.
    Next,
    /// Continue at an absolute address.
    Jump(i32),
}

/// The CPU: register file, memory and run bookkeeping.
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    pub options: CpuOptions,
    /// Instruction count, including those run by nested interrupts.
    pub cycles: u64,
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a CPU with default options and full-size memory.
    pub fn new() -> Self {
        Self::with_memory(Memory::default())
    }

    /// Create a CPU from options.
    pub fn with_options(options: CpuOptions) -> Result<Self, CpuError> {
        let mem = Memory::new(options.tryte_count)?;
        let mut cpu = Self::with_memory(mem);
        cpu.options = options;
        Ok(cpu)
    }

    /// Create a CPU around an already configured memory (with maps).
    pub fn with_memory(mem: Memory) -> Self {
        let options = CpuOptions {
            tryte_count: mem.len(),
            ..CpuOptions::default()
        };
        Self {
            regs: Registers::new(),
            mem,
            options,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset registers and clear memory. Memory maps stay registered.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.cycles = 0;
        self.last_instr = None;
    }

    pub fn state(&self) -> CpuState {
        CpuState::from_direction(self.regs.direction())
    }

    pub fn is_halted(&self) -> bool {
        self.regs.flags.is_halted()
    }

    /// The most recently executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Copy a program into memory at its origin.
    pub fn load(&mut self, program: &Program) -> Result<(), CpuError> {
        self.mem.peek(program.origin)?;
        self.mem.write_array(program.origin, &program.code)?;
        debug!(origin = program.origin, len = program.code.len(), "program loaded");
        Ok(())
    }

    /// Load a program, point the start vector at its origin and run it.
    ///
    /// The start vector is entered directly, so an origin of 0 is allowed.
    pub fn boot(&mut self, program: &Program) -> Result<(), CpuError> {
        self.load(program)?;
        let origin = Word::from_i32(program.origin);
        self.mem.write_word(self.vector_address(Trit::O), origin)?;
        self.dispatch(Trit::O, None, program.origin)
    }

    /// Address of the vector word for an interrupt number.
    pub fn vector_address(&self, number: Trit) -> i32 {
        self.mem.min_address() + 2 * (number.to_i32() + 1)
    }

    /// Whether the I flag masks an interrupt number.
    pub fn is_masked(&self, number: Trit) -> bool {
        match self.regs.flags.get(Flag::I) {
            Trit::N => number != Trit::O,
            Trit::O => false,
            Trit::P => number == Trit::P,
        }
    }

    /// Request an interrupt. Returns whether it was accepted.
    ///
    /// An accepted interrupt runs its handler to completion before
    /// returning. Registers are restored afterwards, except for the start
    /// vector 0.
    pub fn interrupt(&mut self, number: Trit, value: Option<Tryte>) -> Result<bool, CpuError> {
        if self.is_masked(number) {
            debug!(?number, mask = ?self.regs.flags.get(Flag::I), "interrupt masked");
            return Ok(false);
        }

        let vector = self.mem.read_word(self.vector_address(number))?;
        if vector.is_zero() {
            return Err(CpuError::UnsetVector(number.to_i32()));
        }
        self.dispatch(number, value, vector.to_i32())?;
        Ok(true)
    }

    fn dispatch(
        &mut self,
        number: Trit,
        value: Option<Tryte>,
        vector: i32,
    ) -> Result<(), CpuError> {
        debug!(?number, vector, "interrupt accepted");
        let snapshot = self.regs;

        if let Some(value) = value {
            self.regs.accum = value;
        }
        self.regs.pc = vector;
        self.regs.flags.set(Flag::R, Trit::P);
        self.run()?;

        if number != Trit::O {
            self.regs = snapshot;
        }
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.is_halted() {
            return Err(CpuError::NotRunning(self.state()));
        }

        let pc = self.regs.pc;
        let opcode = self.mem.read(pc)?;
        let instr = decode::decode(opcode).map_err(|source| CpuError::Decode { pc, source })?;

        let regs = &self.regs;
        let mem = &mut self.mem;
        let mode = instr.mode().unwrap_or(AddrMode::Accumulator);
        let raw = decode::decode_operand(mode, |k| mem.read(regs.pc_offset(k)))?;
        let last = self.regs.pc_offset(raw.consumed as i32);

        trace!(pc, ?instr, operand = raw.value, "step");

        match self.execute(instr, raw, last)? {
            Flow::Next => self.regs.pc = last + self.regs.direction().to_i32(),
            Flow::Jump(target) => self.regs.pc = target,
        }

        self.cycles += 1;
        self.last_instr = Some(instr);
        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while !self.is_halted() {
            self.step()?;
        }

        debug!(halt_code = ?self.regs.flags.get(Flag::H), pc = self.regs.pc, "halted");
        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_steps` top-level instructions.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        for _ in 0..max_steps {
            if self.is_halted() {
                break;
            }
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(
        &mut self,
        instr: Instruction,
        raw: DecodedOperand,
        last: i32,
    ) -> Result<Flow, CpuError> {
        match instr {
            Instruction::Alu { op, .. } => {
                let operand = Operand::resolve(raw, &self.regs, &mut self.mem)?;
                let effect = Alu::new(&mut self.regs, &mut self.mem).execute(op, operand)?;
                if effect == Effect::DebugNop {
                    self.debug_nop(operand)?;
                }
                Ok(Flow::Next)
            }

            Instruction::Branch { flag, direction, compare } => {
                let value = self.regs.flags.get(flag);
                if direction.test(value, compare) {
                    let target = last + self.regs.direction().to_i32() + raw.value;
                    trace!(?flag, ?direction, ?compare, target, "branch taken");
                    Ok(Flow::Jump(target))
                } else {
                    Ok(Flow::Next)
                }
            }

            Instruction::Extended { op } => self.execute_xop(op, raw, last),
        }
    }

    fn debug_nop(&mut self, operand: Operand) -> Result<(), CpuError> {
        if self.options.dnop_traps {
            return Err(CpuError::DebugTrap { pc: self.regs.pc });
        }
        debug!(pc = self.regs.pc, ?operand, regs = ?self.regs, "DNOP");
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state())
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("decode error at {pc}: {source}")]
    Decode { pc: i32, source: DecodeError },

    #[error("cannot write to immediate operand {0}")]
    OperandNotWritable(i32),

    #[error("interrupt vector {0} is not set")]
    UnsetVector(i32),

    #[error("debug trap (DNOP) at {pc}")]
    DebugTrap { pc: i32 },
}
