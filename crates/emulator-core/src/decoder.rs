//! Instruction decoder for the supported RV32I subset.
//!
//! Decoding is total: every 32-bit word maps to a [`DecodedInstruction`].
//! Words whose opcode is outside the nine supported classes decode to
//! [`DecodedInstruction::Unknown`], and undefined `funct3`/`funct7`
//! combinations keep their raw selector fields so the executor can report
//! them. Immediates are fully assembled and sign-extended here.

use crate::encoding::{
    classify_opcode, funct3, funct7, imm_b, imm_i, imm_j, imm_s, imm_u, opcode, rd, rs1, rs2,
    OpcodeClass,
};
use crate::state::Register;

/// Comparison selected by a conditional branch's `funct3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCondition {
    /// `BEQ`: equal.
    Eq,
    /// `BNE`: not equal.
    Ne,
    /// `BLT`: signed less-than.
    Lt,
    /// `BGE`: signed greater-or-equal.
    Ge,
    /// `BLTU`: unsigned less-than.
    Ltu,
    /// `BGEU`: unsigned greater-or-equal.
    Geu,
}

impl BranchCondition {
    /// Maps a branch `funct3` to its condition; `None` for 2 and 3.
    #[must_use]
    pub const fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 {
            0b000 => Some(Self::Eq),
            0b001 => Some(Self::Ne),
            0b100 => Some(Self::Lt),
            0b101 => Some(Self::Ge),
            0b110 => Some(Self::Ltu),
            0b111 => Some(Self::Geu),
            _ => None,
        }
    }

    /// Evaluates the condition over two register values.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Ltu => (lhs as u32) < (rhs as u32),
            Self::Geu => (lhs as u32) >= (rhs as u32),
        }
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Eq => "beq",
            Self::Ne => "bne",
            Self::Lt => "blt",
            Self::Ge => "bge",
            Self::Ltu => "bltu",
            Self::Geu => "bgeu",
        }
    }
}

/// Access width and extension selected by a load's `funct3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadWidth {
    /// `LB`: sign-extended byte.
    Byte,
    /// `LH`: sign-extended halfword.
    Half,
    /// `LW`: word.
    Word,
    /// `LBU`: zero-extended byte.
    ByteUnsigned,
    /// `LHU`: zero-extended halfword.
    HalfUnsigned,
}

impl LoadWidth {
    /// Maps a load `funct3` to its width; `None` for 3, 6 and 7.
    #[must_use]
    pub const fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 {
            0b000 => Some(Self::Byte),
            0b001 => Some(Self::Half),
            0b010 => Some(Self::Word),
            0b100 => Some(Self::ByteUnsigned),
            0b101 => Some(Self::HalfUnsigned),
            _ => None,
        }
    }

    /// Number of bytes transferred.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte | Self::ByteUnsigned => 1,
            Self::Half | Self::HalfUnsigned => 2,
            Self::Word => 4,
        }
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Byte => "lb",
            Self::Half => "lh",
            Self::Word => "lw",
            Self::ByteUnsigned => "lbu",
            Self::HalfUnsigned => "lhu",
        }
    }
}

/// Access width selected by a store's `funct3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreWidth {
    /// `SB`: low byte of `rs2`.
    Byte,
    /// `SH`: low halfword of `rs2`.
    Half,
    /// `SW`: full word.
    Word,
}

impl StoreWidth {
    /// Maps a store `funct3` to its width; `None` above 2.
    #[must_use]
    pub const fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 {
            0b000 => Some(Self::Byte),
            0b001 => Some(Self::Half),
            0b010 => Some(Self::Word),
            _ => None,
        }
    }

    /// Number of bytes transferred.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Byte => "sb",
            Self::Half => "sh",
            Self::Word => "sw",
        }
    }
}

/// Integer operation shared by the register and immediate ALU classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AluOperation {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

const FUNCT7_BASE: u8 = 0b000_0000;
const FUNCT7_ALT: u8 = 0b010_0000;

impl AluOperation {
    /// Resolves an `OP-IMM` selector. Shifts also check `funct7`; there is no
    /// immediate subtract.
    #[must_use]
    pub const fn from_immediate(funct3: u8, funct7: u8) -> Option<Self> {
        match (funct3, funct7) {
            (0b000, _) => Some(Self::Add),
            (0b010, _) => Some(Self::Slt),
            (0b011, _) => Some(Self::Sltu),
            (0b100, _) => Some(Self::Xor),
            (0b110, _) => Some(Self::Or),
            (0b111, _) => Some(Self::And),
            (0b001, FUNCT7_BASE) => Some(Self::Sll),
            (0b101, FUNCT7_BASE) => Some(Self::Srl),
            (0b101, FUNCT7_ALT) => Some(Self::Sra),
            _ => None,
        }
    }

    /// Resolves an `OP` selector.
    #[must_use]
    pub const fn from_register(funct3: u8, funct7: u8) -> Option<Self> {
        match (funct3, funct7) {
            (0b000, FUNCT7_BASE) => Some(Self::Add),
            (0b000, FUNCT7_ALT) => Some(Self::Sub),
            (0b001, FUNCT7_BASE) => Some(Self::Sll),
            (0b010, FUNCT7_BASE) => Some(Self::Slt),
            (0b011, FUNCT7_BASE) => Some(Self::Sltu),
            (0b100, FUNCT7_BASE) => Some(Self::Xor),
            (0b101, FUNCT7_BASE) => Some(Self::Srl),
            (0b101, FUNCT7_ALT) => Some(Self::Sra),
            (0b110, FUNCT7_BASE) => Some(Self::Or),
            (0b111, FUNCT7_BASE) => Some(Self::And),
            _ => None,
        }
    }

    /// Returns `true` for the three shift operations.
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::Sll | Self::Srl | Self::Sra)
    }

    /// Assembly mnemonic of the register form.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Sll => "sll",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Xor => "xor",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Or => "or",
            Self::And => "and",
        }
    }
}

/// Decoded instruction, one variant per opcode class.
///
/// Offsets and immediates are already sign-extended. Classes with several
/// operations keep their raw `funct3`/`funct7` selectors; use the
/// `from_*` constructors on [`BranchCondition`], [`LoadWidth`],
/// [`StoreWidth`] and [`AluOperation`] to resolve them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DecodedInstruction {
    /// Load upper immediate; `imm` has its low 12 bits clear.
    Lui { rd: Register, imm: i32 },
    /// Add upper immediate to the instruction address.
    Auipc { rd: Register, imm: i32 },
    /// Jump and link, pc-relative.
    Jal { rd: Register, offset: i32 },
    /// Jump and link, register-relative.
    Jalr {
        rd: Register,
        rs1: Register,
        funct3: u8,
        imm: i32,
    },
    /// Conditional pc-relative branch.
    Branch {
        funct3: u8,
        rs1: Register,
        rs2: Register,
        offset: i32,
    },
    /// Memory load into `rd`.
    Load {
        funct3: u8,
        rd: Register,
        rs1: Register,
        offset: i32,
    },
    /// Memory store from `rs2`.
    Store {
        funct3: u8,
        rs1: Register,
        rs2: Register,
        offset: i32,
    },
    /// Register-immediate ALU operation.
    AluImmediate {
        funct3: u8,
        funct7: u8,
        rd: Register,
        rs1: Register,
        imm: i32,
    },
    /// Register-register ALU operation.
    AluRegister {
        funct3: u8,
        funct7: u8,
        rd: Register,
        rs1: Register,
        rs2: Register,
    },
    /// Opcode outside the supported classes.
    Unknown { word: u32 },
}

impl DecodedInstruction {
    /// Returns the opcode class, or `None` for unknown words.
    #[must_use]
    pub const fn class(&self) -> Option<OpcodeClass> {
        match self {
            Self::Lui { .. } => Some(OpcodeClass::Lui),
            Self::Auipc { .. } => Some(OpcodeClass::Auipc),
            Self::Jal { .. } => Some(OpcodeClass::Jal),
            Self::Jalr { .. } => Some(OpcodeClass::Jalr),
            Self::Branch { .. } => Some(OpcodeClass::Branch),
            Self::Load { .. } => Some(OpcodeClass::Load),
            Self::Store { .. } => Some(OpcodeClass::Store),
            Self::AluImmediate { .. } => Some(OpcodeClass::AluImmediate),
            Self::AluRegister { .. } => Some(OpcodeClass::AluRegister),
            Self::Unknown { .. } => None,
        }
    }
}

/// Decodes a 32-bit instruction word.
#[must_use]
pub fn decode(word: u32) -> DecodedInstruction {
    let Some(class) = classify_opcode(opcode(word)) else {
        return DecodedInstruction::Unknown { word };
    };

    let rd = Register::from_u5(rd(word));
    let rs1 = Register::from_u5(rs1(word));
    let rs2 = Register::from_u5(rs2(word));
    let funct3 = funct3(word);

    match class {
        OpcodeClass::Lui => DecodedInstruction::Lui {
            rd,
            imm: imm_u(word),
        },
        OpcodeClass::Auipc => DecodedInstruction::Auipc {
            rd,
            imm: imm_u(word),
        },
        OpcodeClass::Jal => DecodedInstruction::Jal {
            rd,
            offset: imm_j(word),
        },
        OpcodeClass::Jalr => DecodedInstruction::Jalr {
            rd,
            rs1,
            funct3,
            imm: imm_i(word),
        },
        OpcodeClass::Branch => DecodedInstruction::Branch {
            funct3,
            rs1,
            rs2,
            offset: imm_b(word),
        },
        OpcodeClass::Load => DecodedInstruction::Load {
            funct3,
            rd,
            rs1,
            offset: imm_i(word),
        },
        OpcodeClass::Store => DecodedInstruction::Store {
            funct3,
            rs1,
            rs2,
            offset: imm_s(word),
        },
        OpcodeClass::AluImmediate => DecodedInstruction::AluImmediate {
            funct3,
            funct7: funct7(word),
            rd,
            rs1,
            imm: imm_i(word),
        },
        OpcodeClass::AluRegister => DecodedInstruction::AluRegister {
            funct3,
            funct7: funct7(word),
            rd,
            rs1,
            rs2,
        },
    }
}
