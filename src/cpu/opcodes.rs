//! Opcode tables shared by the decoder, the executor and the assembler.
//!
//! Every opcode is one tryte; its least significant trit selects the family:
//!
//! ```text
//!  43210
//!  aaab0   ALU:      aaa = operation, b = addressing mode
//!  aabc1   Branch:   aa = flag, b = direction, c = compare trit
//!  aaaai   Extended: aaaa = operation
//! ```

use serde::{Serialize, Deserialize};
use crate::ternary::Trit;

/// Operand addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrMode {
    /// `A`: the accumulator, no operand trytes.
    Accumulator,
    /// `#v`: a 1-tryte literal.
    Immediate,
    /// `a`: a word address.
    Absolute,
    /// `a,X`
    AbsoluteX,
    /// `a,Y`
    AbsoluteY,
    /// `(a)`: address stored at `a`.
    Indirect,
    /// `(a,X)`: address stored at `a + X`.
    IndexedXIndirect,
    /// `(a),Y`: address stored at `a`, plus Y.
    IndirectIndexedY,
}

impl AddrMode {
    /// Number of operand trytes following the opcode.
    pub const fn operand_size(self) -> usize {
        match self {
            AddrMode::Accumulator => 0,
            AddrMode::Immediate => 1,
            _ => 2,
        }
    }

    /// The mode trit of an ALU opcode, if this mode fits in it.
    pub const fn alu_trit(self) -> Option<Trit> {
        match self {
            AddrMode::Absolute => Some(Trit::N),
            AddrMode::Accumulator => Some(Trit::O),
            AddrMode::Immediate => Some(Trit::P),
            _ => None,
        }
    }

    pub const fn from_alu_trit(trit: Trit) -> Self {
        match trit {
            Trit::N => AddrMode::Absolute,
            Trit::O => AddrMode::Accumulator,
            Trit::P => AddrMode::Immediate,
        }
    }
}

/// Defines an opcode enum with its numeric code and mnemonic.
macro_rules! opcode_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = $code:literal, $mnemonic:literal, $mode:expr, $alias:expr; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            /// Numeric code within the family's opcode field.
            pub const fn code(self) -> i32 {
                match self {
                    $( $name::$variant => $code, )*
                }
            }

            /// Assembly mnemonic.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( $name::$variant => $mnemonic, )*
                }
            }

            /// The addressing mode fixed by this opcode, if any.
            pub const fn fixed_mode(self) -> Option<AddrMode> {
                match self {
                    $( $name::$variant => $mode, )*
                }
            }

            /// The ALU operation this opcode performs with its fixed mode.
            pub const fn alu_alias(self) -> Option<AluOp> {
                match self {
                    $( $name::$variant => $alias, )*
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                Self::ALL.iter().copied().find(|op| op.code() == code)
            }
        }
    };
}

opcode_enum! {
    /// ALU operations (3-trit field).
    pub enum AluOp {
        Shl = -13, "SHL", None, None;
        Ldy = -12, "LDY", None, None;
        Sty = -11, "STY", None, None;
        Shr = -10, "SHR", None, None;
        Stx = -9, "STX", None, None;
        Ldx = -8, "LDX", None, None;
        But = -7, "BUT", None, None;
        Ora = -6, "ORA", None, None;
        And = -5, "AND", None, None;
        Eor = -4, "EOR", None, None;
        Cpx = -3, "CPX", None, None;
        Cpy = -2, "CPY", None, None;
        Dec = -1, "DEC", None, None;
        Dnop = 0, "DNOP", None, None;
        Inc = 1, "INC", None, None;
        Adc = 3, "ADC", None, None;
        Sta = 4, "STA", None, None;
        Lda = 5, "LDA", None, None;
        Cmp = 6, "CMP", None, None;
        Sbc = 7, "SBC", None, None;
        Nti = 8, "NTI", None, None;
        Sti = 9, "STI", None, None;
        Pti = 10, "PTI", None, None;
        Fd = 11, "FD", None, None;
        Rd = 12, "RD", None, None;
    }
}

impl AluOp {
    /// Look up by mnemonic. `TOR` and `TAND` name ORA and AND.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        match mnemonic {
            "TOR" => Some(AluOp::Ora),
            "TAND" => Some(AluOp::And),
            _ => Self::ALL.iter().copied().find(|op| op.mnemonic() == mnemonic),
        }
    }

    /// Opcode tryte value for this operation in the given ALU mode.
    pub fn opcode(self, mode_trit: Trit) -> i32 {
        self.code() * 9 + mode_trit.to_i32() * 3
    }
}

use AddrMode::*;

opcode_enum! {
    /// Extended operations (4-trit field).
    pub enum XOp {
        HaltN = -40, "HALTN", None, None;
        HaltZ = -39, "HALTZ", None, None;
        HaltP = -38, "HALTP", None, None;
        LdaIndY = -37, "LDA", Some(IndirectIndexedY), Some(AluOp::Lda);
        LdaX = -36, "LDA", Some(AbsoluteX), Some(AluOp::Lda);
        LdaY = -35, "LDA", Some(AbsoluteY), Some(AluOp::Lda);
        LdaXInd = -34, "LDA", Some(IndexedXIndirect), Some(AluOp::Lda);
        StaIndY = -33, "STA", Some(IndirectIndexedY), Some(AluOp::Sta);
        StaX = -32, "STA", Some(AbsoluteX), Some(AluOp::Sta);
        StaY = -31, "STA", Some(AbsoluteY), Some(AluOp::Sta);
        StaXInd = -30, "STA", Some(IndexedXIndirect), Some(AluOp::Sta);
        CmpIndY = -29, "CMP", Some(IndirectIndexedY), Some(AluOp::Cmp);
        CmpX = -28, "CMP", Some(AbsoluteX), Some(AluOp::Cmp);
        CmpY = -27, "CMP", Some(AbsoluteY), Some(AluOp::Cmp);
        LdxY = -26, "LDX", Some(AbsoluteY), Some(AluOp::Ldx);
        LdyX = -25, "LDY", Some(AbsoluteX), Some(AluOp::Ldy);
        StxY = -24, "STX", Some(AbsoluteY), Some(AluOp::Stx);
        StyX = -23, "STY", Some(AbsoluteX), Some(AluOp::Sty);
        Stz = -22, "STZ", Some(Absolute), None;
        StzX = -21, "STZ", Some(AbsoluteX), None;
        StzY = -20, "STZ", Some(AbsoluteY), None;
        StzIndY = -19, "STZ", Some(IndirectIndexedY), None;
        StzXInd = -18, "STZ", Some(IndexedXIndirect), None;
        Clc = -16, "CLC", None, None;
        Secp = -15, "SECP", None, None;
        Secn = -14, "SECN", None, None;
        Clv = -13, "CLV", None, None;
        Cli = -12, "CLI", None, None;
        Sein = -11, "SEIN", None, None;
        Seip = -10, "SEIP", None, None;
        Cld = -9, "CLD", None, None;
        Sedp = -8, "SEDP", None, None;
        Sedn = -7, "SEDN", None, None;
        IntN = -6, "INTN", None, None;
        IntZ = -5, "INTZ", None, None;
        IntP = -4, "INTP", None, None;
        Nop = 0, "NOP", None, None;
        Tax = 1, "TAX", None, None;
        Tay = 2, "TAY", None, None;
        Txa = 3, "TXA", None, None;
        Tya = 4, "TYA", None, None;
        Inx = 5, "INX", None, None;
        Iny = 6, "INY", None, None;
        Dex = 7, "DEX", None, None;
        Dey = 8, "DEY", None, None;
        Txys = 9, "TXYS", None, None;
        Tsxy = 10, "TSXY", None, None;
        Pha = 11, "PHA", None, None;
        Phx = 12, "PHX", None, None;
        Phy = 13, "PHY", None, None;
        Php = 14, "PHP", None, None;
        Pla = 15, "PLA", None, None;
        Plx = 16, "PLX", None, None;
        Ply = 17, "PLY", None, None;
        Plp = 18, "PLP", None, None;
        Jsr = 33, "JSR", Some(Absolute), None;
        Jmp = 34, "JMP", Some(Absolute), None;
        JmpInd = 35, "JMP", Some(Indirect), None;
        Rts = 36, "RTS", None, None;
    }
}

impl XOp {
    /// Look up by mnemonic and the addressing mode of the written operand.
    pub fn find(mnemonic: &str, mode: Option<AddrMode>) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == mnemonic && op.fixed_mode() == mode)
    }

    /// Whether any extended op uses this mnemonic.
    pub fn is_mnemonic(mnemonic: &str) -> bool {
        Self::ALL.iter().any(|op| op.mnemonic() == mnemonic)
    }

    /// Opcode tryte value.
    pub fn opcode(self) -> i32 {
        self.code() * 3 - 1
    }
}

/// Branch comparison relation, selected by the direction trit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Flag less than compare trit.
    Less,
    /// Flag equal to compare trit.
    Equal,
    /// Flag not equal to compare trit.
    NotEqual,
}

impl Direction {
    pub const fn from_trit(trit: Trit) -> Self {
        match trit {
            Trit::N => Direction::Less,
            Trit::O => Direction::Equal,
            Trit::P => Direction::NotEqual,
        }
    }

    pub const fn to_trit(self) -> Trit {
        match self {
            Direction::Less => Trit::N,
            Direction::Equal => Trit::O,
            Direction::NotEqual => Trit::P,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Direction::Less => 'L',
            Direction::Equal => 'E',
            Direction::NotEqual => 'N',
        }
    }

    /// Accepts `L`/`<`, `E`/`=`, `N`/`!`.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'L' | '<' => Some(Direction::Less),
            'E' | '=' => Some(Direction::Equal),
            'N' | '!' => Some(Direction::NotEqual),
            _ => None,
        }
    }

    /// Evaluate `flag <relation> compare`.
    pub fn test(self, flag: Trit, compare: Trit) -> bool {
        match self {
            Direction::Less => flag < compare,
            Direction::Equal => flag == compare,
            Direction::NotEqual => flag != compare,
        }
    }
}

/// Compare-trit letters used in branch mnemonics.
pub fn compare_letter(trit: Trit) -> char {
    match trit {
        Trit::N => 'N',
        Trit::O => 'Z',
        Trit::P => 'P',
    }
}

pub fn compare_from_letter(c: char) -> Option<Trit> {
    match c {
        'N' => Some(Trit::N),
        'Z' => Some(Trit::O),
        'P' => Some(Trit::P),
        _ => None,
    }
}

/// Short names for common branch forms: (alias, canonical).
pub const BRANCH_ALIASES: &[(&str, &str)] = &[
    ("BEQ", "BRSEZ"),
    ("BNE", "BRSNZ"),
    ("BMI", "BRSEN"),
    ("BPL", "BRSEP"),
    ("BVC", "BRVEZ"),
    ("BVS", "BRVNZ"),
    ("BCC", "BRCEZ"),
    ("BCS", "BRCNZ"),
    ("BRA", "BRRNZ"),
];

/// Canonical `BRfdc` form of an alias.
pub fn branch_alias_target(alias: &str) -> Option<&'static str> {
    BRANCH_ALIASES.iter().find(|(a, _)| *a == alias).map(|(_, c)| *c)
}

/// Alias for a canonical `BRfdc` form.
pub fn branch_alias_for(canonical: &str) -> Option<&'static str> {
    BRANCH_ALIASES.iter().find(|(_, c)| *c == canonical).map(|(a, _)| *a)
}
