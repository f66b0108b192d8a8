//! Instruction decoder.
//!
//! Turns an opcode tryte into an [`Instruction`] and reads its operand
//! trytes. [`encode`] is the exact inverse of [`decode`].

use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::cpu::flags::Flag;
use crate::cpu::opcodes::{AddrMode, AluOp, Direction, XOp};
use crate::ternary::{arith, Trit, Tryte};

/// A decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// ALU operation with a mode from its mode trit.
    Alu { op: AluOp, mode: AddrMode },

    /// Relative branch taken when `flag <direction> compare` holds.
    Branch { flag: Flag, direction: Direction, compare: Trit },

    /// Extended operation.
    Extended { op: XOp },
}

impl Instruction {
    /// Addressing mode of the operand, if the instruction takes one.
    ///
    /// Branches carry a 1-tryte displacement and report `Immediate`.
    pub fn mode(&self) -> Option<AddrMode> {
        match self {
            Instruction::Alu { mode, .. } => Some(*mode),
            Instruction::Branch { .. } => Some(AddrMode::Immediate),
            Instruction::Extended { op } => op.fixed_mode(),
        }
    }

    /// Number of operand trytes after the opcode.
    pub fn operand_size(&self) -> usize {
        self.mode().map_or(0, AddrMode::operand_size)
    }

    /// Total encoded length in trytes.
    pub fn len(&self) -> usize {
        1 + self.operand_size()
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("undefined ALU operation {op} in opcode {opcode}")]
    UndefinedAlu { opcode: i32, op: i32 },

    #[error("undefined extended operation {op} in opcode {opcode}")]
    UndefinedExtended { opcode: i32, op: i32 },

    #[error("undefined branch flag {flag} in opcode {opcode}")]
    UndefinedFlag { opcode: i32, flag: i32 },

    #[error("instruction truncated: needs {needed} operand trytes")]
    Truncated { needed: usize },
}

/// Decode an opcode tryte.
pub fn decode(opcode: Tryte) -> Result<Instruction, DecodeError> {
    let value = opcode.to_i32();

    match opcode.lst() {
        Trit::O => {
            let op = arith::slice_trits(value, 2, 5);
            let mode = AddrMode::from_alu_trit(opcode.trit(1));
            let op = AluOp::from_code(op)
                .ok_or(DecodeError::UndefinedAlu { opcode: value, op })?;
            Ok(Instruction::Alu { op, mode })
        }
        Trit::P => {
            let flag = arith::slice_trits(value, 3, 5);
            let flag = Flag::from_offset(flag)
                .ok_or(DecodeError::UndefinedFlag { opcode: value, flag })?;
            Ok(Instruction::Branch {
                flag,
                direction: Direction::from_trit(opcode.trit(2)),
                compare: opcode.trit(1),
            })
        }
        Trit::N => {
            let op = arith::slice_trits(value, 1, 5);
            let op = XOp::from_code(op)
                .ok_or(DecodeError::UndefinedExtended { opcode: value, op })?;
            Ok(Instruction::Extended { op })
        }
    }
}

/// Encode an instruction to its opcode tryte.
///
/// ALU instructions must use one of the three ALU modes; other modes are
/// reached through extended opcodes.
pub fn encode(instr: &Instruction) -> Tryte {
    let value = match *instr {
        Instruction::Alu { op, mode } => {
            let trit = mode.alu_trit().unwrap_or(Trit::O);
            op.opcode(trit)
        }
        Instruction::Branch { flag, direction, compare } => {
            flag.offset() * 27 + direction.to_trit().to_i32() * 9 + compare.to_i32() * 3 + 1
        }
        Instruction::Extended { op } => op.opcode(),
    };
    Tryte::from_i32(value)
}

/// A raw operand read after an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedOperand {
    pub mode: AddrMode,
    /// Literal (Immediate), address (2-tryte modes) or 0 (Accumulator).
    pub value: i32,
    /// Trytes consumed.
    pub consumed: usize,
}

/// Read the operand for `mode`.
///
/// `fetch(k)` returns the k-th tryte after the opcode (k = 1, 2). Two-tryte
/// operands are stored low tryte first.
pub fn decode_operand<E>(
    mode: AddrMode,
    mut fetch: impl FnMut(i32) -> Result<Tryte, E>,
) -> Result<DecodedOperand, E> {
    let value = match mode.operand_size() {
        0 => 0,
        1 => fetch(1)?.to_i32(),
        _ => {
            let low = fetch(1)?;
            let high = fetch(2)?;
            arith::word(high, low)
        }
    };
    Ok(DecodedOperand { mode, value, consumed: mode.operand_size() })
}

/// Read an operand from a code slice, with the opcode at `offset`.
pub fn decode_operand_at(
    mode: AddrMode,
    code: &[Tryte],
    offset: usize,
) -> Result<DecodedOperand, DecodeError> {
    decode_operand(mode, |k| {
        code.get(offset + k as usize)
            .copied()
            .ok_or(DecodeError::Truncated { needed: mode.operand_size() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: i32) -> Tryte {
        Tryte::from_i32(v)
    }

    #[test]
    fn test_decode_families() {
        assert_eq!(
            decode(t(AluOp::Lda.opcode(Trit::P))).unwrap(),
            Instruction::Alu { op: AluOp::Lda, mode: AddrMode::Immediate }
        );
        assert_eq!(
            decode(t(-118)).unwrap(),
            Instruction::Extended { op: XOp::HaltZ }
        );
        assert_eq!(
            decode(t(10)).unwrap(),
            Instruction::Branch { flag: Flag::S, direction: Direction::NotEqual, compare: Trit::O }
        );
    }

    #[test]
    fn test_decode_undefined() {
        assert_eq!(
            decode(t(2 * 9)),
            Err(DecodeError::UndefinedAlu { opcode: 18, op: 2 })
        );
        assert!(matches!(
            decode(t(13 * 9 + 3)),
            Err(DecodeError::UndefinedAlu { op: 13, .. })
        ));
        assert!(matches!(
            decode(t(-17 * 3 - 1)),
            Err(DecodeError::UndefinedExtended { op: -17, .. })
        ));
    }

    #[test]
    fn test_encode_decode_all_opcodes() {
        // every tryte either fails to decode or re-encodes to itself
        let mut decoded = 0;
        for v in Tryte::MIN..=Tryte::MAX {
            if let Ok(instr) = decode(t(v)) {
                assert_eq!(encode(&instr), t(v), "{:?}", instr);
                decoded += 1;
            }
        }
        // 81 ALU slots minus 2 undefined ops x 3 modes, all 81 branch slots
        assert_eq!(decoded, (27 - 2) * 3 + 81 + XOp::ALL.len());
    }

    #[test]
    fn test_instruction_lengths() {
        assert_eq!(Instruction::Extended { op: XOp::Tax }.len(), 1);
        assert_eq!(Instruction::Extended { op: XOp::Jmp }.len(), 3);
        assert_eq!(Instruction::Alu { op: AluOp::Inc, mode: AddrMode::Accumulator }.len(), 1);
        assert_eq!(Instruction::Alu { op: AluOp::Lda, mode: AddrMode::Immediate }.len(), 2);
        assert_eq!(
            Instruction::Branch { flag: Flag::S, direction: Direction::Equal, compare: Trit::O }.len(),
            2
        );
    }

    #[test]
    fn test_decode_operand_low_first() {
        let code = [t(33), t(-121), t(121)];
        let op = decode_operand_at(AddrMode::Absolute, &code, 0).unwrap();
        assert_eq!(op, DecodedOperand { mode: AddrMode::Absolute, value: 29282, consumed: 2 });

        let op = decode_operand_at(AddrMode::Immediate, &code, 1).unwrap();
        assert_eq!(op.value, 121);

        assert_eq!(
            decode_operand_at(AddrMode::Absolute, &code, 1),
            Err(DecodeError::Truncated { needed: 2 })
        );
    }
}
