//! CPU emulation.
//!
//! - 5-trit accumulator and X/Y index registers
//! - word-wide program counter and stack pointer
//! - a 9-trit packed flag register whose R flag sets the run direction
//! - balanced-address tryte memory with memory-mapped I/O traps
//! - three opcode families: ALU, branch and extended

pub mod flags;
pub mod memory;
pub mod registers;
pub mod stack;
pub mod opcodes;
pub mod decode;
pub mod alu;
mod xop;
pub mod execute;

pub use flags::{Flag, Flags};
pub use memory::{Memory, MemoryError, MemoryMap};
pub use registers::Registers;
pub use opcodes::{AddrMode, AluOp, Direction, XOp};
pub use decode::{Instruction, DecodeError};
pub use execute::{Cpu, CpuError, CpuOptions, CpuState};
