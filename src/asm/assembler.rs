//! Two-pass assembler.
//!
//! Syntax:
//! ```text
//! ; comment
//! label:              ; bind label to the current address
//!     LDA #%ii1i0     ; ALU op, immediate
//!     STA table,X     ; extended alias for an indexed mode
//!     BNE label       ; branch, absolute target encoded as relative
//!     BRDEZ #-3       ; branch with an explicit displacement
//!     LDA #<label     ; low tryte of a value, `>` for the high tryte
//!     .org 100        ; set origin, or pad forward
//!     .equ -100 buf   ; define buf, buf.low and buf.high
//!     .word label+1   ; 2-tryte value, low first
//!     .tryte 'a       ; 1-tryte value
//!     .data "text"    ; one tryte per character
//! ```
//!
//! Pass 1 emits code, binding symbols as they appear and recording a patch
//! for every value whose symbol is not known yet. Pass 2 fills the patches.

use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;
use crate::asm::operand::{self, parse_operand, Expr, OperandError};
use crate::cpu::decode::{encode, Instruction};
use crate::cpu::flags::Flag;
use crate::cpu::opcodes::{
    branch_alias_target, compare_from_letter, AddrMode, AluOp, Direction, XOp,
};
use crate::ternary::{arith, text, Trit, Tryte, Word};

/// An assembled program: code to be loaded at `origin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub origin: i32,
    pub code: Vec<Tryte>,
}

impl Program {
    pub fn new(origin: i32, code: Vec<Tryte>) -> Self {
        Self { origin, code }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Address one past the last tryte.
    pub fn end(&self) -> i32 {
        self.origin + self.code.len() as i32
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("unknown directive on line {line}: {directive}")]
    UnknownDirective { line: usize, directive: String },

    #[error("symbol redefined on line {line}: {name}")]
    DuplicateSymbol { line: usize, name: String },

    #[error("unresolved symbol on line {line}: {name}")]
    UnresolvedSymbol { line: usize, name: String },

    #[error("value out of range on line {line}: {value} (limit ±{limit})")]
    LiteralOutOfRange { line: usize, value: i32, limit: i32 },

    #[error("branch target out of range on line {line}: displacement {displacement}")]
    BranchOutOfRange { line: usize, displacement: i32 },

    #[error("bad operand on line {line}: {source}")]
    Operand { line: usize, source: OperandError },

    #[error("{mnemonic} on line {line} requires an operand")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} takes no operand")]
    UnexpectedOperand { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} does not support {mode:?} addressing")]
    UnsupportedMode { line: usize, mnemonic: String, mode: AddrMode },

    #[error(".org on line {line} moves backwards from {current} to {target}")]
    OrgBackwards { line: usize, current: i32, target: i32 },

    #[error("character {ch:?} on line {line} has no tryte encoding")]
    UnencodableChar { line: usize, ch: char },
}

impl AssemblerError {
    /// Source line (1-based) the error was reported on.
    pub fn line(&self) -> usize {
        match *self {
            AssemblerError::Syntax { line, .. }
            | AssemblerError::UnknownMnemonic { line, .. }
            | AssemblerError::UnknownDirective { line, .. }
            | AssemblerError::DuplicateSymbol { line, .. }
            | AssemblerError::UnresolvedSymbol { line, .. }
            | AssemblerError::LiteralOutOfRange { line, .. }
            | AssemblerError::BranchOutOfRange { line, .. }
            | AssemblerError::Operand { line, .. }
            | AssemblerError::MissingOperand { line, .. }
            | AssemblerError::UnexpectedOperand { line, .. }
            | AssemblerError::UnsupportedMode { line, .. }
            | AssemblerError::OrgBackwards { line, .. }
            | AssemblerError::UnencodableChar { line, .. } => line,
        }
    }
}

/// Assemble source text into a program.
pub fn assemble(source: &str) -> Result<Program, AssemblerError> {
    let mut asm = Assembler::new();
    for (index, line) in source.lines().enumerate() {
        asm.process_line(line, index + 1)?;
    }
    asm.resolve_patches()?;

    debug!(
        lines = source.lines().count(),
        trytes = asm.code.len(),
        symbols = asm.symbols.len(),
        origin = asm.origin(),
        "assembled program"
    );
    Ok(Program { origin: asm.origin(), code: asm.code })
}

/// How a value is stored in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// One tryte.
    Tryte,
    /// Two trytes, low first.
    Word,
    /// One tryte holding a branch displacement to an absolute target.
    Relative,
}

/// A value that referred to a symbol not yet defined.
#[derive(Debug)]
struct Patch {
    offset: usize,
    expr: Expr,
    kind: ValueKind,
    line: usize,
}

struct Assembler {
    /// Set by the first `.org` before any code.
    origin: Option<i32>,
    code: Vec<Tryte>,
    symbols: HashMap<String, i32>,
    /// Labels bound before any code or origin; moved by the first `.org`.
    floating: Vec<String>,
    patches: Vec<Patch>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            origin: None,
            code: Vec::new(),
            symbols: HashMap::new(),
            floating: Vec::new(),
            patches: Vec::new(),
        }
    }

    fn origin(&self) -> i32 {
        self.origin.unwrap_or(0)
    }

    /// Address of the next emitted tryte.
    fn address(&self) -> i32 {
        self.origin() + self.code.len() as i32
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let mut rest = strip_comment(line, line_num)?.trim();

        // label, optionally followed by an instruction
        if let Some(first) = rest.split_whitespace().next() {
            if let Some(label) = first.strip_suffix(':') {
                if !operand::is_symbol(label) {
                    return Err(AssemblerError::Syntax {
                        line: line_num,
                        message: format!("invalid label '{}'", label),
                    });
                }
                let address = self.address();
                self.define(label, address, line_num)?;
                if self.origin.is_none() && self.code.is_empty() {
                    self.floating.push(label.to_string());
                }
                rest = rest[first.len()..].trim();
            }
        }

        if rest.is_empty() {
            return Ok(());
        }

        let (mnemonic, operand) = match rest.split_once(char::is_whitespace) {
            Some((m, o)) => (m, o.trim()),
            None => (rest, ""),
        };

        if let Some(directive) = mnemonic.strip_prefix('.') {
            self.process_directive(&directive.to_ascii_lowercase(), operand, line_num)
        } else {
            self.process_instruction(&mnemonic.to_ascii_uppercase(), operand, line_num)
        }
    }

    fn define(&mut self, name: &str, value: i32, line_num: usize) -> Result<(), AssemblerError> {
        if self.symbols.contains_key(name) {
            return Err(AssemblerError::DuplicateSymbol { line: line_num, name: name.to_string() });
        }
        self.symbols.insert(name.to_string(), value);
        Ok(())
    }

    fn process_directive(
        &mut self,
        directive: &str,
        args: &str,
        line_num: usize,
    ) -> Result<(), AssemblerError> {
        let missing = || AssemblerError::MissingOperand {
            line: line_num,
            mnemonic: format!(".{}", directive),
        };

        match directive {
            "org" => {
                let target = self.evaluate_now(args, line_num)?;
                Word::new(target).map_err(|_| AssemblerError::LiteralOutOfRange {
                    line: line_num,
                    value: target,
                    limit: Word::MAX,
                })?;
                let origin = self.origin;
                match origin {
                    None if self.code.is_empty() => {
                        self.origin = Some(target);
                        for name in std::mem::take(&mut self.floating) {
                            self.symbols.insert(name, target);
                        }
                    }
                    _ => {
                        let current = self.address();
                        if target < current {
                            return Err(AssemblerError::OrgBackwards { line: line_num, current, target });
                        }
                        for _ in current..target {
                            self.code.push(Tryte::ZERO);
                        }
                    }
                }
            }

            "equ" => {
                let mut parts = args.split_whitespace();
                let (value, name) = match (parts.next(), parts.next(), parts.next()) {
                    (Some(value), Some(name), None) => (value, name),
                    (None, _, _) | (Some(_), None, _) => return Err(missing()),
                    _ => {
                        return Err(AssemblerError::Syntax {
                            line: line_num,
                            message: ".equ takes a value and a name".into(),
                        })
                    }
                };
                if !operand::is_symbol(name) {
                    return Err(AssemblerError::Syntax {
                        line: line_num,
                        message: format!("invalid symbol name '{}'", name),
                    });
                }
                let value = self.evaluate_now(value, line_num)?;
                Word::new(value).map_err(|_| AssemblerError::LiteralOutOfRange {
                    line: line_num,
                    value,
                    limit: Word::MAX,
                })?;
                self.define(name, value, line_num)?;
                self.define(&format!("{}.low", name), arith::low_tryte(value).to_i32(), line_num)?;
                self.define(&format!("{}.high", name), arith::high_tryte(value).to_i32(), line_num)?;
            }

            "word" | "tryte" => {
                if args.is_empty() {
                    return Err(missing());
                }
                let expr = Expr::parse(args)
                    .map_err(|source| AssemblerError::Operand { line: line_num, source })?;
                let kind = if directive == "word" { ValueKind::Word } else { ValueKind::Tryte };
                self.emit_value(expr, kind, line_num)?;
            }

            "data" => {
                if args.is_empty() {
                    return Err(missing());
                }
                for ch in parse_string(args, line_num)? {
                    let tryte = text::encode(ch)
                        .ok_or(AssemblerError::UnencodableChar { line: line_num, ch })?;
                    self.code.push(tryte);
                }
            }

            _ => {
                return Err(AssemblerError::UnknownDirective {
                    line: line_num,
                    directive: format!(".{}", directive),
                })
            }
        }
        Ok(())
    }

    /// Evaluate a directive argument whose symbols must already be defined.
    fn evaluate_now(&self, text: &str, line_num: usize) -> Result<i32, AssemblerError> {
        if text.is_empty() {
            return Err(AssemblerError::Syntax {
                line: line_num,
                message: "missing value".into(),
            });
        }
        let expr = Expr::parse(text)
            .map_err(|source| AssemblerError::Operand { line: line_num, source })?;
        expr.evaluate(|name| self.symbols.get(name).copied())
            .map_err(|source| AssemblerError::Operand { line: line_num, source })?
            .ok_or_else(|| AssemblerError::UnresolvedSymbol {
                line: line_num,
                name: expr.symbol().unwrap_or_default().to_string(),
            })
    }

    fn process_instruction(
        &mut self,
        mnemonic: &str,
        operand_text: &str,
        line_num: usize,
    ) -> Result<(), AssemblerError> {
        let operand = if operand_text.is_empty() {
            None
        } else {
            Some(parse_operand(operand_text)
                .map_err(|source| AssemblerError::Operand { line: line_num, source })?)
        };
        let unsupported = |mode: AddrMode| AssemblerError::UnsupportedMode {
            line: line_num,
            mnemonic: mnemonic.to_string(),
            mode,
        };
        let missing = || AssemblerError::MissingOperand {
            line: line_num,
            mnemonic: mnemonic.to_string(),
        };

        if let Some((flag, direction, compare)) = parse_branch(mnemonic) {
            let operand = operand.ok_or_else(missing)?;
            let kind = match operand.mode {
                AddrMode::Immediate => ValueKind::Tryte,
                AddrMode::Absolute => ValueKind::Relative,
                mode => return Err(unsupported(mode)),
            };
            self.emit_opcode(Instruction::Branch { flag, direction, compare });
            if let Some(expr) = operand.expr {
                self.emit_value(expr, kind, line_num)?;
            }
            return Ok(());
        }

        if let Some(op) = AluOp::from_mnemonic(mnemonic) {
            let operand = operand.ok_or_else(missing)?;
            if operand.mode.alu_trit().is_some() {
                self.emit_opcode(Instruction::Alu { op, mode: operand.mode });
            } else {
                // indexed and indirect forms exist only as extended aliases
                let xop = XOp::ALL
                    .iter()
                    .copied()
                    .find(|x| x.alu_alias() == Some(op) && x.fixed_mode() == Some(operand.mode))
                    .ok_or_else(|| unsupported(operand.mode))?;
                self.emit_opcode(Instruction::Extended { op: xop });
            }
            return self.emit_operand(operand.mode, operand.expr, line_num);
        }

        if XOp::is_mnemonic(mnemonic) {
            let mode = operand.as_ref().map(|o| o.mode);
            let Some(op) = XOp::find(mnemonic, mode) else {
                return Err(match mode {
                    Some(_) if XOp::find(mnemonic, None).is_some() => AssemblerError::UnexpectedOperand {
                        line: line_num,
                        mnemonic: mnemonic.to_string(),
                    },
                    Some(mode) => unsupported(mode),
                    None => missing(),
                });
            };
            self.emit_opcode(Instruction::Extended { op });
            return match operand {
                Some(operand) => self.emit_operand(operand.mode, operand.expr, line_num),
                None => Ok(()),
            };
        }

        Err(AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.to_string() })
    }

    fn emit_opcode(&mut self, instr: Instruction) {
        self.code.push(encode(&instr));
    }

    fn emit_operand(
        &mut self,
        mode: AddrMode,
        expr: Option<Expr>,
        line_num: usize,
    ) -> Result<(), AssemblerError> {
        let kind = match mode.operand_size() {
            0 => return Ok(()),
            1 => ValueKind::Tryte,
            _ => ValueKind::Word,
        };
        match expr {
            Some(expr) => self.emit_value(expr, kind, line_num),
            None => Ok(()),
        }
    }

    /// Emit a value, or placeholders plus a patch if its symbol is unknown.
    fn emit_value(&mut self, expr: Expr, kind: ValueKind, line_num: usize) -> Result<(), AssemblerError> {
        let offset = self.code.len();
        let size = if kind == ValueKind::Word { 2 } else { 1 };
        self.code.extend(std::iter::repeat(Tryte::ZERO).take(size));

        let value = expr
            .evaluate(|name| self.symbols.get(name).copied())
            .map_err(|source| AssemblerError::Operand { line: line_num, source })?;
        match value {
            Some(value) => self.store(offset, value, kind, line_num),
            None => {
                self.patches.push(Patch { offset, expr, kind, line: line_num });
                Ok(())
            }
        }
    }

    fn store(&mut self, offset: usize, value: i32, kind: ValueKind, line_num: usize) -> Result<(), AssemblerError> {
        let out_of_range = |limit: i32| AssemblerError::LiteralOutOfRange { line: line_num, value, limit };
        match kind {
            ValueKind::Tryte => {
                self.code[offset] = Tryte::new(value).map_err(|_| out_of_range(Tryte::MAX))?;
            }
            ValueKind::Word => {
                let word = Word::new(value).map_err(|_| out_of_range(Word::MAX))?;
                self.code[offset] = word.low();
                self.code[offset + 1] = word.high();
            }
            ValueKind::Relative => {
                // displacement is taken from the address after the operand
                let displacement = value
                    .saturating_sub(self.origin() + offset as i32)
                    .saturating_sub(1);
                self.code[offset] = Tryte::new(displacement)
                    .map_err(|_| AssemblerError::BranchOutOfRange { line: line_num, displacement })?;
            }
        }
        Ok(())
    }

    fn resolve_patches(&mut self) -> Result<(), AssemblerError> {
        for patch in std::mem::take(&mut self.patches) {
            let value = patch
                .expr
                .evaluate(|name| self.symbols.get(name).copied())
                .map_err(|source| AssemblerError::Operand { line: patch.line, source })?
                .ok_or_else(|| AssemblerError::UnresolvedSymbol {
                    line: patch.line,
                    name: patch.expr.symbol().unwrap_or_default().to_string(),
                })?;
            self.store(patch.offset, value, patch.kind, patch.line)?;
        }
        Ok(())
    }
}

/// Cut a trailing comment. `;` starts a comment only at the start of the
/// line or after whitespace, outside string and character literals.
fn strip_comment(line: &str, line_num: usize) -> Result<&str, AssemblerError> {
    let mut in_string = false;
    let mut after_space = true;
    let mut chars = line.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => in_string = !in_string,
            '\\' if in_string => {
                chars.next();
            }
            '\'' if !in_string => {
                if let Some((_, '\\')) = chars.next() {
                    chars.next();
                }
            }
            ';' if !in_string => {
                if after_space {
                    return Ok(&line[..i]);
                }
                return Err(AssemblerError::Syntax {
                    line: line_num,
                    message: "';' must be preceded by whitespace".into(),
                });
            }
            _ => {}
        }
        after_space = c.is_whitespace();
    }
    Ok(line)
}

/// Parse a double-quoted string literal with backslash escapes.
fn parse_string(text: &str, line_num: usize) -> Result<Vec<char>, AssemblerError> {
    let syntax = |message: &str| AssemblerError::Syntax { line: line_num, message: message.into() };
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| syntax("expected a quoted string"))?;

    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars.next().and_then(operand::unescape)
                .ok_or_else(|| syntax("invalid escape in string"))?;
            out.push(escaped);
        } else if c == '"' {
            return Err(syntax("unescaped quote in string"));
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Parse a branch mnemonic or alias into (flag, direction, compare).
fn parse_branch(mnemonic: &str) -> Option<(Flag, Direction, Trit)> {
    let canonical = branch_alias_target(mnemonic).unwrap_or(mnemonic);
    let rest = canonical.strip_prefix("BR")?;
    let mut chars = rest.chars();
    let (flag, direction, compare) = (chars.next()?, chars.next()?, chars.next()?);
    if chars.next().is_some() {
        return None;
    }
    Some((
        Flag::from_letter(flag)?,
        Direction::from_letter(direction)?,
        compare_from_letter(compare)?,
    ))
}
