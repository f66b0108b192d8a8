//! TROM (tryte ROM) image files.
//!
//! A plain text format:
//! - One tryte per line, written as 5 balanced-ternary digits (`i`, `0`, `1`)
//! - Anything after `;` on a tryte line is a comment
//! - Lines starting with `;` are comments; `; origin N` sets the load address
//! - Blank lines are ignored

use std::path::Path;
use thiserror::Error;
use crate::asm::disasm::disasm1;
use crate::asm::Program;
use crate::ternary::{notation, Tryte, Word};

/// Parse TROM text into a program.
pub fn parse_trom(text: &str) -> Result<Program, TromError> {
    let mut program = Program::default();

    for (index, line) in text.lines().enumerate() {
        let line_num = index + 1;
        let trimmed = line.trim();

        if let Some(comment) = trimmed.strip_prefix(';') {
            if let Some(origin) = comment.trim().strip_prefix("origin") {
                program.origin = origin
                    .trim()
                    .parse()
                    .ok()
                    .and_then(|v| Word::new(v).ok())
                    .map(Word::to_i32)
                    .ok_or_else(|| TromError::ParseError {
                        line: line_num,
                        message: format!("invalid origin '{}'", origin.trim()),
                    })?;
            }
            continue;
        }

        let digits = trimmed.split(';').next().unwrap_or_default().trim();
        if digits.is_empty() {
            continue;
        }
        if digits.chars().count() != Tryte::WIDTH {
            return Err(TromError::ParseError {
                line: line_num,
                message: format!("expected {} trits, found '{}'", Tryte::WIDTH, digits),
            });
        }

        let tryte = notation::parse_trits(digits)
            .ok()
            .and_then(|v| Tryte::new(v).ok())
            .ok_or_else(|| TromError::ParseError {
                line: line_num,
                message: format!("invalid trits '{}'", digits),
            })?;
        program.code.push(tryte);
    }

    Ok(program)
}

/// Render a program as TROM text, annotating instruction starts with their
/// disassembly.
pub fn format_trom(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("; trit-cpu TROM image\n");
    out.push_str(&format!("; origin {}\n", program.origin));
    out.push_str(&format!("; {} trytes\n\n", program.len()));

    let mut next_instr = 0;
    for (offset, tryte) in program.code.iter().enumerate() {
        let address = program.origin + offset as i32;
        if offset == next_instr {
            match disasm1(&program.code, offset) {
                Ok((text, len)) => {
                    out.push_str(&format!("{} ; {:>6}  {}\n", tryte, address, text));
                    next_instr += len;
                    continue;
                }
                Err(_) => next_instr += 1,
            }
        }
        out.push_str(&format!("{} ; {:>6}\n", tryte, address));
    }

    out
}

/// Load a TROM file from disk.
pub fn load_trom<P: AsRef<Path>>(path: P) -> Result<Program, TromError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| TromError::IoError(e.to_string()))?;
    parse_trom(&text)
}

/// Save a program to a TROM file.
pub fn save_trom<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), TromError> {
    std::fs::write(path.as_ref(), format_trom(program))
        .map_err(|e| TromError::IoError(e.to_string()))
}

/// Errors that can occur during TROM operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TromError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}
