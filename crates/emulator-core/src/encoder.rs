//! Instruction word construction.
//!
//! The inverse of [`crate::decoder::decode`] for the nine opcode classes.
//! Offsets passed to branch and jump helpers are byte offsets relative to the
//! instruction itself; immediates are truncated to their field width.

#![allow(clippy::cast_sign_loss, clippy::cast_lossless)]

use crate::encoding::{OpcodeClass, HALT_WORD};
use crate::state::Register;

const fn reg(r: Register) -> u32 {
    r.number() as u32
}

/// Encodes an R-type word.
#[must_use]
pub const fn encode_r(
    class: OpcodeClass,
    rd: Register,
    funct3: u8,
    rs1: Register,
    rs2: Register,
    funct7: u8,
) -> u32 {
    ((funct7 as u32 & 0x7F) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | (reg(rd) << 7)
        | class.opcode() as u32
}

/// Encodes an I-type word. `imm` keeps its low 12 bits.
#[must_use]
pub const fn encode_i(
    class: OpcodeClass,
    rd: Register,
    funct3: u8,
    rs1: Register,
    imm: i32,
) -> u32 {
    (((imm as u32) & 0xFFF) << 20)
        | (reg(rs1) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | (reg(rd) << 7)
        | class.opcode() as u32
}

/// Encodes an S-type word.
#[must_use]
pub const fn encode_s(
    class: OpcodeClass,
    funct3: u8,
    rs1: Register,
    rs2: Register,
    imm: i32,
) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7F) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | ((imm & 0x1F) << 7)
        | class.opcode() as u32
}

/// Encodes a B-type word. Bit 0 of `offset` is dropped.
#[must_use]
pub const fn encode_b(funct3: u8, rs1: Register, rs2: Register, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3F) << 25)
        | (reg(rs2) << 20)
        | (reg(rs1) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | (((imm >> 1) & 0xF) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | OpcodeClass::Branch.opcode() as u32
}

/// Encodes a U-type word. The low 12 bits of `imm` are dropped.
#[must_use]
pub const fn encode_u(class: OpcodeClass, rd: Register, imm: i32) -> u32 {
    ((imm as u32) & 0xFFFF_F000) | (reg(rd) << 7) | class.opcode() as u32
}

/// Encodes a J-type word. Bit 0 of `offset` is dropped.
#[must_use]
pub const fn encode_j(rd: Register, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xFF) << 12)
        | (reg(rd) << 7)
        | OpcodeClass::Jal.opcode() as u32
}

/// `lui rd, imm` where `imm` is the full upper value (low 12 bits zero).
#[must_use]
pub const fn lui(rd: Register, imm: i32) -> u32 {
    encode_u(OpcodeClass::Lui, rd, imm)
}

/// `auipc rd, imm`.
#[must_use]
pub const fn auipc(rd: Register, imm: i32) -> u32 {
    encode_u(OpcodeClass::Auipc, rd, imm)
}

/// `jal rd, offset`.
#[must_use]
pub const fn jal(rd: Register, offset: i32) -> u32 {
    encode_j(rd, offset)
}

/// `jalr rd, imm(rs1)`.
#[must_use]
pub const fn jalr(rd: Register, rs1: Register, imm: i32) -> u32 {
    encode_i(OpcodeClass::Jalr, rd, 0, rs1, imm)
}

macro_rules! branch_helpers {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $name(rs1: Register, rs2: Register, offset: i32) -> u32 {
                encode_b($funct3, rs1, rs2, offset)
            }
        )*
    };
}

branch_helpers! {
    /// `beq rs1, rs2, offset`.
    beq => 0b000;
    /// `bne rs1, rs2, offset`.
    bne => 0b001;
    /// `blt rs1, rs2, offset`.
    blt => 0b100;
    /// `bge rs1, rs2, offset`.
    bge => 0b101;
    /// `bltu rs1, rs2, offset`.
    bltu => 0b110;
    /// `bgeu rs1, rs2, offset`.
    bgeu => 0b111;
}

macro_rules! load_helpers {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $name(rd: Register, rs1: Register, offset: i32) -> u32 {
                encode_i(OpcodeClass::Load, rd, $funct3, rs1, offset)
            }
        )*
    };
}

load_helpers! {
    /// `lb rd, offset(rs1)`.
    lb => 0b000;
    /// `lh rd, offset(rs1)`.
    lh => 0b001;
    /// `lw rd, offset(rs1)`.
    lw => 0b010;
    /// `lbu rd, offset(rs1)`.
    lbu => 0b100;
    /// `lhu rd, offset(rs1)`.
    lhu => 0b101;
}

macro_rules! store_helpers {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $name(rs2: Register, rs1: Register, offset: i32) -> u32 {
                encode_s(OpcodeClass::Store, $funct3, rs1, rs2, offset)
            }
        )*
    };
}

store_helpers! {
    /// `sb rs2, offset(rs1)`.
    sb => 0b000;
    /// `sh rs2, offset(rs1)`.
    sh => 0b001;
    /// `sw rs2, offset(rs1)`.
    sw => 0b010;
}

macro_rules! immediate_helpers {
    ($($(#[$doc:meta])* $name:ident => $funct3:expr;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $name(rd: Register, rs1: Register, imm: i32) -> u32 {
                encode_i(OpcodeClass::AluImmediate, rd, $funct3, rs1, imm)
            }
        )*
    };
}

immediate_helpers! {
    /// `addi rd, rs1, imm`.
    addi => 0b000;
    /// `slti rd, rs1, imm`.
    slti => 0b010;
    /// `sltiu rd, rs1, imm`.
    sltiu => 0b011;
    /// `xori rd, rs1, imm`.
    xori => 0b100;
    /// `ori rd, rs1, imm`.
    ori => 0b110;
    /// `andi rd, rs1, imm`.
    andi => 0b111;
}

/// `slli rd, rs1, shamt`.
#[must_use]
pub const fn slli(rd: Register, rs1: Register, shamt: u8) -> u32 {
    encode_i(OpcodeClass::AluImmediate, rd, 0b001, rs1, (shamt & 0x1F) as i32)
}

/// `srli rd, rs1, shamt`.
#[must_use]
pub const fn srli(rd: Register, rs1: Register, shamt: u8) -> u32 {
    encode_i(OpcodeClass::AluImmediate, rd, 0b101, rs1, (shamt & 0x1F) as i32)
}

/// `srai rd, rs1, shamt`.
#[must_use]
pub const fn srai(rd: Register, rs1: Register, shamt: u8) -> u32 {
    encode_i(OpcodeClass::AluImmediate, rd, 0b101, rs1, 0x400 | (shamt & 0x1F) as i32)
}

macro_rules! register_helpers {
    ($($(#[$doc:meta])* $name:ident => ($funct3:expr, $funct7:expr);)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $name(rd: Register, rs1: Register, rs2: Register) -> u32 {
                encode_r(OpcodeClass::AluRegister, rd, $funct3, rs1, rs2, $funct7)
            }
        )*
    };
}

register_helpers! {
    /// `add rd, rs1, rs2`.
    add => (0b000, 0x00);
    /// `sub rd, rs1, rs2`.
    sub => (0b000, 0x20);
    /// `sll rd, rs1, rs2`.
    sll => (0b001, 0x00);
    /// `slt rd, rs1, rs2`.
    slt => (0b010, 0x00);
    /// `sltu rd, rs1, rs2`.
    sltu => (0b011, 0x00);
    /// `xor rd, rs1, rs2`.
    xor => (0b100, 0x00);
    /// `srl rd, rs1, rs2`.
    srl => (0b101, 0x00);
    /// `sra rd, rs1, rs2`.
    sra => (0b101, 0x20);
    /// `or rd, rs1, rs2`.
    or => (0b110, 0x00);
    /// `and rd, rs1, rs2`.
    and => (0b111, 0x00);
}

/// The halt sentinel, `jal x0, 0`.
#[must_use]
pub const fn halt() -> u32 {
    HALT_WORD
}

/// Shorthand for register `xN`. `n` is masked to five bits.
#[must_use]
pub const fn x(n: u8) -> Register {
    Register::from_u5(n)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::decoder::{decode, DecodedInstruction};
    use crate::disasm::disassemble;

    #[rstest]
    #[case(addi(x(1), x(0), 5), 0x0050_0093)]
    #[case(add(x(3), x(1), x(2)), 0x0020_81B3)]
    #[case(sub(x(1), x(2), x(3)), 0x4031_00B3)]
    #[case(lui(x(13), 0x80000), 0x0008_06B7)]
    #[case(lw(x(3), x(1), 0), 0x0000_A183)]
    #[case(sw(x(14), x(13), 20), 0x00E6_AA23)]
    #[case(blt(x(10), x(12), 16), 0x00C5_4863)]
    #[case(jal(x(0), -16), 0xFF1F_F06F)]
    #[case(jalr(x(1), x(1), 0), 0x0000_80E7)]
    #[case(srai(x(1), x(1), 3), 0x4030_D093)]
    #[case(jal(x(0), 0), HALT_WORD)]
    fn matches_reference_encodings(#[case] word: u32, #[case] expected: u32) {
        assert_eq!(word, expected);
    }

    #[test]
    fn negative_offsets_decode_back() {
        assert_eq!(
            decode(bne(x(5), x(0), -4096)),
            DecodedInstruction::Branch {
                funct3: 1,
                rs1: x(5),
                rs2: x(0),
                offset: -4096
            }
        );
        assert_eq!(
            decode(jal(x(1), -1_048_576)),
            DecodedInstruction::Jal {
                rd: x(1),
                offset: -1_048_576
            }
        );
        assert_eq!(
            decode(sb(x(2), x(3), -1)),
            DecodedInstruction::Store {
                funct3: 0,
                rs1: x(3),
                rs2: x(2),
                offset: -1
            }
        );
    }

    #[test]
    fn helpers_disassemble_to_their_names() {
        assert_eq!(disassemble(sltiu(x(4), x(5), -1)), "sltiu x4, x5, -1");
        assert_eq!(disassemble(lhu(x(6), x(7), 2)), "lhu x6, 2(x7)");
        assert_eq!(disassemble(sra(x(8), x(9), x(10))), "sra x8, x9, x10");
        assert_eq!(disassemble(bgeu(x(1), x(2), -8)), "bgeu x1, x2, -8");
        assert_eq!(disassemble(auipc(x(5), 0x1000)), "auipc x5, 0x1");
    }
}
