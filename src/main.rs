//! trit-cpu - CLI Entry Point
//!
//! Commands:
//! - `trit-cpu run <program>` - Run an ASM or TROM file
//! - `trit-cpu debug <program>` - Interactive debugger
//! - `trit-cpu asm <source>` - Assemble to TROM
//! - `trit-cpu disasm <trom>` - Disassemble TROM

use std::fmt::Display;
use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tritcpu::{assemble, disassemble, load_trom, save_trom, Cpu, CpuOptions, Flag, Program};

#[derive(Parser)]
#[command(name = "trit-cpu")]
#[command(version)]
#[command(about = "Emulator and assembler for a 5-trit balanced ternary CPU")]
struct Cli {
    /// JSON file with CPU options (`tryte_count`, `dnop_traps`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every executed instruction (overridden by RUST_LOG)
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the ASM or TROM file to execute
        program: PathBuf,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "1000000")]
        max_cycles: u64,
        /// Start through interrupt vector 0 instead of jumping to the origin
        #[arg(long)]
        boot: bool,
        /// Print memory cells START:END (end exclusive) after the run
        #[arg(long, value_parser = parse_range)]
        dump: Option<(i32, i32)>,
    },
    /// Interactive debugger
    Debug {
        /// Path to the ASM or TROM file to debug
        program: PathBuf,
    },
    /// Assemble source to TROM
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output TROM file (defaults to the source with a .trom extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble TROM to readable text
    Disasm {
        /// Path to the TROM file
        trom: PathBuf,
    },
}

fn parse_range(text: &str) -> Result<(i32, i32), String> {
    let (start, end) = text
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{}'", text))?;
    let parse = |s: &str| s.trim().parse::<i32>().map_err(|e| format!("'{}': {}", s, e));
    Ok((parse(start)?, parse(end)?))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.trace);
    let options = load_options(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run { program, max_cycles, boot, dump }) => {
            run_program(&program, options, max_cycles, boot, dump);
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program, options);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { trom }) => {
            disassemble_file(&trom);
        }
        None => {
            println!("trit-cpu v{}", env!("CARGO_PKG_VERSION"));
            println!("A balanced ternary CPU emulator and assembler");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_tracing(trace: bool) {
    let default = if trace { "tritcpu=trace" } else { "tritcpu=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, error: impl Display) -> ! {
    eprintln!("❌ {}: {}", context, error);
    std::process::exit(1);
}

fn load_options(path: Option<&Path>) -> CpuOptions {
    let Some(path) = path else {
        return CpuOptions::default();
    };
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(&format!("Failed to read {}", path.display()), e));
    CpuOptions::from_json(&text).unwrap_or_else(|e| fail("Invalid config", e))
}

/// Load a program, assembling `.asm` files and reading anything else as TROM.
fn load_program(path: &Path) -> Program {
    let program = if path.extension().is_some_and(|ext| ext == "asm") {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail("Failed to read file", e));
        let program = assemble(&source).unwrap_or_else(|e| fail("Assembly error", e));
        println!("📝 Assembled {} trytes", program.len());
        program
    } else {
        let program = load_trom(path).unwrap_or_else(|e| fail("Failed to load TROM", e));
        println!("📂 Loaded {} trytes", program.len());
        program
    };

    if program.is_empty() {
        fail("Nothing to execute", path.display());
    }
    program
}

fn run_program(
    path: &Path,
    options: CpuOptions,
    max_cycles: u64,
    boot: bool,
    dump: Option<(i32, i32)>,
) {
    println!("🔧 Running: {}", path.display());
    let program = load_program(path);

    let mut cpu = Cpu::with_options(options).unwrap_or_else(|e| fail("Invalid CPU options", e));

    let result = if boot {
        cpu.boot(&program)
    } else {
        cpu.load(&program)
            .and_then(|()| {
                cpu.regs.pc = program.origin;
                cpu.run_limited(max_cycles)
            })
            .map(|_| ())
    };
    if let Err(e) = result {
        fail(&format!("CPU error at PC={}", cpu.regs.pc), e);
    }
    info!(cycles = cpu.cycles, "run finished");

    let regs = &cpu.regs;
    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("State:  {:?}", cpu.state());
    println!("PC: {}   SP: {}", regs.pc, regs.stackptr);
    println!("A: {} ({})", regs.accum, regs.accum.to_i32());
    println!("X: {} ({})", regs.index, regs.index.to_i32());
    println!("Y: {} ({})", regs.yindex, regs.yindex.to_i32());
    let flags: Vec<String> = Flag::ALL
        .iter()
        .rev()
        .map(|f| format!("{}={}", f.letter(), regs.flags.get(*f).to_i32()))
        .collect();
    println!("Flags: {}", flags.join(" "));

    if let Some((start, end)) = dump {
        match cpu.mem.subarray(start, end) {
            Ok(cells) => {
                println!();
                for (offset, cell) in cells.iter().enumerate() {
                    println!("{:>6}: {} = {}", start + offset as i32, cell, cell.to_i32());
                }
            }
            Err(e) => fail("Invalid dump range", e),
        }
    }

    if !cpu.is_halted() {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path, options: CpuOptions) {
    use tritcpu::tui::run_debugger;

    println!("🔍 Loading: {}", path.display());
    let program = load_program(path);

    println!("🚀 Launching debugger...");
    if let Err(e) = run_debugger(program, options) {
        fail("Debugger error", e);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &Path, _options: CpuOptions) {
    fail("Debugger unavailable", "built without the `tui` feature");
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>) {
    let out_path = output.unwrap_or_else(|| source_path.with_extension("trom"));

    println!("📝 Assembling: {} → {}", source_path.display(), out_path.display());

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail("Failed to read file", e));
    let program = assemble(&source).unwrap_or_else(|e| fail("Assembly error", e));

    println!("✓ Assembled {} trytes at origin {}", program.len(), program.origin);

    if let Err(e) = save_trom(&out_path, &program) {
        fail("Failed to save TROM", e);
    }

    println!("✓ Saved to {}", out_path.display());
}

fn disassemble_file(trom_path: &Path) {
    let program = load_trom(trom_path).unwrap_or_else(|e| fail("Failed to load TROM", e));
    print!("{}", disassemble(&program));
}
