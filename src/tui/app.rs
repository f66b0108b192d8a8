//! Debugger application state and logic.

use std::collections::HashSet;
use crate::asm::{disasm1, Program};
use crate::cpu::{Cpu, CpuOptions};
use crate::ternary::Tryte;

/// Instructions executed per UI tick while running.
const STEPS_PER_TICK: usize = 64;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Loaded program, kept for reset.
    pub program: Program,
    options: CpuOptions,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<i32>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// First address shown in the memory view.
    pub mem_scroll: i32,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Program, options: CpuOptions) -> Self {
        let mut app = Self {
            cpu: Cpu::new(),
            mem_scroll: program.origin,
            program,
            options,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
        };
        app.reset();
        app.status = "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into();
        app
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if self.cpu.is_halted() {
            self.status = format!("CPU halted: {:?}", self.cpu.state());
            self.running = false;
            return;
        }

        let pc = self.cpu.regs.pc;
        let text = self.disassemble_at(pc).0;
        match self.cpu.step() {
            Ok(_) => self.status = format!("PC={}: {}", pc, text),
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one batch of continuous execution.
    pub fn tick(&mut self) {
        for _ in 0..STEPS_PER_TICK {
            if !self.running {
                return;
            }

            if self.cpu.is_halted() {
                self.running = false;
                self.status = format!("Halted after {} cycles", self.cpu.cycles);
                return;
            }

            let pc = self.cpu.regs.pc;
            if self.breakpoints.contains(&pc) {
                self.running = false;
                self.status = format!("Breakpoint at PC={}", pc);
                return;
            }

            self.step();
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset CPU to initial state and reload the program.
    pub fn reset(&mut self) {
        self.cpu = match Cpu::with_options(self.options.clone()) {
            Ok(cpu) => cpu,
            Err(e) => {
                self.status = format!("Error: {}", e);
                Cpu::new()
            }
        };
        self.running = false;
        match self.cpu.load(&self.program) {
            Ok(()) => {
                self.cpu.regs.pc = self.program.origin;
                self.status = "Reset. Ready.".into();
            }
            Err(e) => self.status = format!("Error: {}", e),
        }
    }

    pub fn scroll_memory(&mut self, delta: i32) {
        let mem = &self.cpu.mem;
        self.mem_scroll = (self.mem_scroll + delta).clamp(mem.min_address(), mem.max_address());
    }

    /// Disassemble the instruction at `address`, reading memory without
    /// triggering traps.
    fn disassemble_at(&self, address: i32) -> (String, usize) {
        let window: Vec<Tryte> = (0..3)
            .map_while(|k| self.cpu.mem.peek(address + k).ok())
            .collect();
        match disasm1(&window, 0) {
            Ok(decoded) => decoded,
            Err(_) => match window.first() {
                Some(t) => (format!(".tryte {}", t.to_i32()), 1),
                None => ("<out of range>".into(), 1),
            },
        }
    }

    /// Disassembly from the current PC onwards.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(i32, String, bool)> {
        let pc = self.cpu.regs.pc;
        let mut address = pc;
        let mut out = Vec::with_capacity(lines);

        while out.len() < lines && address <= self.cpu.mem.max_address() {
            let (text, len) = self.disassemble_at(address);
            out.push((address, text, address == pc));
            address += len as i32;
        }
        out
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Program, options: CpuOptions) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, options);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(-1),
                        KeyCode::Down => app.scroll_memory(1),
                        KeyCode::PageUp => app.scroll_memory(-16),
                        KeyCode::PageDown => app.scroll_memory(16),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn app(source: &str) -> DebuggerApp {
        DebuggerApp::new(assemble(source).unwrap(), CpuOptions::default())
    }

    #[test]
    fn test_step_and_halt() {
        let mut app = app(".org 10\nLDA #5\nHALTZ");
        assert_eq!(app.cpu.regs.pc, 10);
        app.step();
        assert_eq!(app.status, "PC=10: LDA #%1ii");
        app.step();
        app.step();
        assert!(app.status.starts_with("CPU halted"));
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app("NOP\nNOP\nNOP\nHALTZ");
        app.cpu.regs.pc = 2;
        app.toggle_breakpoint();
        app.cpu.regs.pc = 0;
        app.run();
        app.tick();
        assert!(!app.running);
        assert_eq!(app.cpu.regs.pc, 2);
        assert_eq!(app.status, "Breakpoint at PC=2");
    }

    #[test]
    fn test_reset_reloads_program() {
        let mut app = app("LDA #7\nSTA 0\nHALTZ");
        app.run();
        app.tick();
        assert!(app.cpu.is_halted());
        app.reset();
        assert!(!app.cpu.is_halted());
        assert_eq!(app.cpu.regs.pc, 0);
        assert_eq!(app.cpu.cycles, 0);
    }

    #[test]
    fn test_disassembly_listing() {
        let app = app("JMP 4444\nHALTZ");
        let lines = app.get_disassembly(2);
        assert_eq!(lines[0], (0, "JMP 4444".to_string(), true));
        assert_eq!(lines[1], (3, "HALTZ".to_string(), false));
    }
}
