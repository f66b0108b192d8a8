//! WebAssembly bindings.
//!
//! This module provides JavaScript-friendly wrappers around the CPU and the
//! assembler.

use wasm_bindgen::prelude::*;
use crate::asm::{assemble, disasm, disasm1, Program};
use crate::cpu::{Cpu, CpuOptions};
use crate::ternary::{Trit, Tryte};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    options: CpuOptions,
    program: Program,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a CPU. `options_json` is an optional `CpuOptions` object.
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<WasmCpu, JsError> {
        let options = match options_json {
            Some(text) => CpuOptions::from_json(&text).map_err(js_error)?,
            None => CpuOptions::default(),
        };
        let cpu = Cpu::with_options(options.clone()).map_err(js_error)?;
        Ok(Self { cpu, options, program: Program::default() })
    }

    /// Assemble and load a program. Returns its length in trytes.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        self.program = assemble(source).map_err(js_error)?;
        self.reset()?;
        Ok(self.program.len())
    }

    /// Step one instruction. Returns its disassembly.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let pc = self.cpu.regs.pc;
        let window: Vec<Tryte> = (0..3)
            .map_while(|k| self.cpu.mem.peek(pc + k).ok())
            .collect();
        self.cpu.step().map_err(js_error)?;
        Ok(disasm1(&window, 0).map(|(text, _)| text).unwrap_or_default())
    }

    /// Run for at most `max_steps` instructions. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(max_steps as u64).map_err(js_error)?;
        Ok(self.cpu.cycles)
    }

    /// Raise interrupt -1, 0 or 1, optionally passing a value in A.
    #[wasm_bindgen]
    pub fn interrupt(&mut self, number: i32, value: Option<i32>) -> Result<bool, JsError> {
        let number = Trit::new(number)
            .ok_or_else(|| JsError::new(&format!("invalid interrupt number {}", number)))?;
        let value = value.map(Tryte::new).transpose().map_err(js_error)?;
        self.cpu.interrupt(number, value).map_err(js_error)
    }

    /// Reset the CPU and reload the current program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.cpu = Cpu::with_options(self.options.clone()).map_err(js_error)?;
        self.cpu.load(&self.program).map_err(js_error)?;
        self.cpu.regs.pc = self.program.origin;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> i32 {
        self.cpu.regs.pc
    }

    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state())
    }

    /// Memory cell at a balanced address, or 0 outside memory.
    #[wasm_bindgen]
    pub fn memory_at(&self, address: i32) -> i32 {
        self.cpu.mem.peek(address).map(|t| t.to_i32()).unwrap_or(0)
    }

    /// Memory cell as a 5-trit string.
    #[wasm_bindgen]
    pub fn memory_ternary_at(&self, address: i32) -> String {
        self.cpu.mem.peek(address).map(|t| t.to_string()).unwrap_or_default()
    }

    /// Memory from `start` to `end` (exclusive) as a typed array.
    #[wasm_bindgen]
    pub fn memory_range(&self, start: i32, end: i32) -> Result<js_sys::Int8Array, JsError> {
        let cells = self.cpu.mem.subarray(start, end).map_err(js_error)?;
        let bytes: Vec<i8> = cells.iter().map(|t| t.to_i8()).collect();
        Ok(js_sys::Int8Array::from(bytes.as_slice()))
    }

    /// Register file as JSON.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.regs).map_err(js_error)
    }
}

/// Assemble source and return the program as JSON (`{origin, code}`).
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<String, JsError> {
    let program = assemble(source).map_err(js_error)?;
    serde_json::to_string(&program).map_err(js_error)
}

/// Disassemble trytes into one line per instruction.
#[wasm_bindgen]
pub fn wasm_disassemble(code: &[i8]) -> Result<Vec<String>, JsError> {
    let code = code
        .iter()
        .map(|&v| Tryte::new(v as i32))
        .collect::<Result<Vec<_>, _>>()
        .map_err(js_error)?;
    Ok(disasm(&code))
}
