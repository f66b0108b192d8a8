//! Disassembler.
//!
//! Produces text the assembler accepts back: disassembling canonical
//! source and reassembling it gives the same trytes.

use crate::asm::Program;
use crate::cpu::decode::{decode, decode_operand_at, DecodeError, Instruction};
use crate::cpu::opcodes::{branch_alias_for, compare_letter, AddrMode};
use crate::ternary::{notation, Tryte};

/// Disassemble the instruction at `offset`.
///
/// Returns the text and the number of trytes it occupies.
pub fn disasm1(code: &[Tryte], offset: usize) -> Result<(String, usize), DecodeError> {
    let opcode = *code.get(offset).ok_or(DecodeError::Truncated { needed: 1 })?;
    let instr = decode(opcode)?;
    let mode = instr.mode().unwrap_or(AddrMode::Accumulator);
    let operand = decode_operand_at(mode, code, offset)?;

    let text = match instr {
        Instruction::Alu { op, mode } => {
            format!("{} {}", op.mnemonic(), format_operand(mode, operand.value))
        }
        Instruction::Branch { flag, direction, compare } => {
            let canonical = format!(
                "BR{}{}{}",
                flag.letter(),
                direction.letter(),
                compare_letter(compare)
            );
            let mnemonic = branch_alias_for(&canonical).map_or(canonical, str::to_string);
            let displacement = operand.value;
            if displacement > 0 {
                format!("{} #+{}", mnemonic, displacement)
            } else {
                format!("{} #{}", mnemonic, displacement)
            }
        }
        Instruction::Extended { op } => match op.fixed_mode() {
            Some(mode) => format!("{} {}", op.mnemonic(), format_operand(mode, operand.value)),
            None => op.mnemonic().to_string(),
        },
    };

    Ok((text, instr.len()))
}

fn format_operand(mode: AddrMode, value: i32) -> String {
    match mode {
        AddrMode::Accumulator => "A".to_string(),
        AddrMode::Immediate => format!("#%{}", notation::to_trits(value)),
        AddrMode::Absolute => value.to_string(),
        AddrMode::AbsoluteX => format!("{},X", value),
        AddrMode::AbsoluteY => format!("{},Y", value),
        AddrMode::Indirect => format!("({})", value),
        AddrMode::IndexedXIndirect => format!("({},X)", value),
        AddrMode::IndirectIndexedY => format!("({}),Y", value),
    }
}

/// Disassemble a whole block, one line per instruction. Trytes that do not
/// decode come out as `.tryte` directives.
pub fn disasm(code: &[Tryte]) -> Vec<String> {
    lines(code).into_iter().map(|(_, _, text)| text).collect()
}

/// (offset, length, text) for each instruction in `code`.
fn lines(code: &[Tryte]) -> Vec<(usize, usize, String)> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let (text, len) = disasm1(code, offset)
            .unwrap_or_else(|_| (format!(".tryte {}", code[offset].to_i32()), 1));
        out.push((offset, len, text));
        offset += len;
    }
    out
}

/// Render a program as a listing with addresses and raw trytes.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();
    output.push_str("; trit-cpu disassembly\n");
    output.push_str(&format!("; origin {}, {} trytes\n\n", program.origin, program.len()));

    for (offset, len, text) in lines(&program.code) {
        let raw: Vec<String> = program.code[offset..offset + len]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let address = program.origin + offset as i32;
        output.push_str(&format!("{:>6}: {:<20} ; {}\n", address, text, raw.join(" ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn trytes(values: &[i32]) -> Vec<Tryte> {
        values.iter().copied().map(Tryte::from_i32).collect()
    }

    #[test]
    fn test_disasm1_forms() {
        let code = trytes(&[48, -102]);
        assert_eq!(disasm1(&code, 0).unwrap(), ("LDA #%ii1i0".to_string(), 2));

        let code = trytes(&[10, -1, 1, 2, -118]);
        assert_eq!(disasm1(&code, 0).unwrap().0, "BNE #-1");
        assert_eq!(disasm1(&code, 2).unwrap().0, "BEQ #+2");
        assert_eq!(disasm1(&code, 4).unwrap(), ("HALTZ".to_string(), 1));
    }

    #[test]
    fn test_disasm1_zero_immediate() {
        let code = trytes(&[48, 0]);
        assert_eq!(disasm1(&code, 0).unwrap().0, "LDA #%0");
    }

    #[test]
    fn test_disasm1_truncated() {
        let code = trytes(&[101, 4]);
        assert_eq!(disasm1(&code, 0), Err(DecodeError::Truncated { needed: 2 }));
    }

    #[test]
    fn test_disasm_falls_back_to_tryte() {
        let code = trytes(&[18, -118, 101]);
        assert_eq!(disasm(&code), vec![".tryte 18", "HALTZ", ".tryte 101"]);
    }

    #[test]
    fn test_listing() {
        let program = assemble(".org 100\nJMP 4444\nHALTZ").unwrap();
        let listing = disassemble(&program);
        assert!(listing.starts_with("; trit-cpu disassembly\n; origin 100, 4 trytes\n\n"));
        assert!(listing.ends_with("HALTZ                ; iii0i\n"));
        assert!(listing.contains("   100: JMP 4444"));
        assert!(listing.contains("   103: HALTZ"));
    }
}
