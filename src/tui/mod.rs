//! TUI debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and flag view with trit coloring
//! - Memory view around any address
//! - Step/run/breakpoint controls
//! - Disassembly from the program counter

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
