//! # trit-cpu
//!
//! An emulator for a small balanced ternary CPU, with a two-pass assembler
//! that targets it.
//!
//! Every digit is a trit in {-1, 0, 1}. Registers and memory cells are
//! 5-trit trytes (-121..=121); addresses and the program counter are
//! 10-trit words (-29524..=29524). Memory is addressed around zero.
//!
//! ```
//! use tritcpu::{assemble, Cpu};
//!
//! let program = assemble("LDA #42\nSTA 0\nHALTZ").unwrap();
//! let mut cpu = Cpu::new();
//! cpu.load(&program).unwrap();
//! cpu.run().unwrap();
//! assert_eq!(cpu.mem.peek(0).unwrap(), 42);
//! ```

pub mod ternary;
pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use ternary::{Trit, Tryte, Word};
pub use cpu::{Cpu, CpuError, CpuOptions, CpuState, Flag, Flags, Instruction, Memory, MemoryMap, Registers};
pub use asm::{assemble, disasm, disassemble, AssemblerError, Program, load_trom, save_trom};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
