//! Assembler and disassembler.
//!
//! This module provides:
//! - A two-pass assembler (source text → [`Program`])
//! - A disassembler that emits source the assembler accepts back
//! - TROM image files for saving and loading assembled programs

pub mod operand;
pub mod assembler;
pub mod disasm;
pub mod trom;

pub use assembler::{assemble, AssemblerError, Program};
pub use disasm::{disasm, disasm1, disassemble};
pub use operand::{parse_operand, OperandError};
pub use trom::{format_trom, load_trom, parse_trom, save_trom, TromError};
