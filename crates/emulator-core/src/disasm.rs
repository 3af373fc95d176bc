//! Instruction disassembly for the RV32I subset.
//!
//! Renders raw words as RISC-V assembly text for traces and listings.
//! Branch and jump offsets are printed relative to the instruction, as the
//! assembler accepts them.

use crate::bus::Bus;
use crate::decoder::{
    decode, AluOperation, BranchCondition, DecodedInstruction, LoadWidth, StoreWidth,
};
use crate::encoding::{HALT_WORD, INTERRUPT_RETURN_WORD};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction.
    pub addr: u32,
    /// Raw instruction word.
    pub raw_word: u32,
    /// Mnemonic (e.g. `addi`, `sw`), or `.word` for data.
    pub mnemonic: String,
    /// Formatted operands (e.g. `x1, x0, 5`).
    pub operands: String,
    /// Whether the word is outside the executable subset.
    pub is_illegal: bool,
}

impl std::fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.operands.is_empty() {
            f.write_str(&self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

/// Disassembles one word into `mnemonic operands` text.
#[must_use]
pub fn disassemble(word: u32) -> String {
    disassemble_row(0, word).to_string()
}

/// Disassembles one word at `addr` into a structured row.
#[must_use]
pub fn disassemble_row(addr: u32, word: u32) -> DisassemblyRow {
    let (mnemonic, operands) = format_instruction(word).map_or_else(
        || {
            let note = if word == INTERRUPT_RETURN_WORD {
                "interrupt return"
            } else {
                "illegal"
            };
            (".word".to_owned(), format!("{word:#010x} ; {note}"))
        },
        |(mnemonic, operands)| (mnemonic.to_owned(), operands),
    );
    let is_illegal = mnemonic == ".word" && word != INTERRUPT_RETURN_WORD;
    let operands = if word == HALT_WORD {
        format!("{operands} ; halt")
    } else {
        operands
    };

    DisassemblyRow {
        addr,
        raw_word: word,
        mnemonic,
        operands,
        is_illegal,
    }
}

/// Disassembles `before` words ahead of `center_pc`, the word at it, and
/// `after` words following it.
///
/// Leading rows stop at address zero. Rows whose address falls outside the
/// backing store are omitted.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn disassemble_window(
    center_pc: u32,
    before: usize,
    after: usize,
    bus: &Bus,
) -> Vec<DisassemblyRow> {
    let center = center_pc & !3;
    let leading = before.min((center / 4) as usize);
    let start = center - (leading as u32) * 4;
    let count = leading.saturating_add(after).saturating_add(1);

    (0..count)
        .filter_map(|index| {
            let offset = u32::try_from(index).ok()?.checked_mul(4)?;
            let addr = start.checked_add(offset)?;
            bus.peek32(addr).map(|word| disassemble_row(addr, word))
        })
        .collect()
}

fn format_instruction(word: u32) -> Option<(&'static str, String)> {
    let text = match decode(word) {
        DecodedInstruction::Lui { rd, imm } => ("lui", format!("{rd}, {:#x}", upper(imm))),
        DecodedInstruction::Auipc { rd, imm } => ("auipc", format!("{rd}, {:#x}", upper(imm))),
        DecodedInstruction::Jal { rd, offset } => ("jal", format!("{rd}, {offset}")),
        DecodedInstruction::Jalr {
            rd,
            rs1,
            funct3: 0,
            imm,
        } => ("jalr", format!("{rd}, {imm}({rs1})")),
        DecodedInstruction::Branch {
            funct3,
            rs1,
            rs2,
            offset,
        } => {
            let condition = BranchCondition::from_funct3(funct3)?;
            (condition.mnemonic(), format!("{rs1}, {rs2}, {offset}"))
        }
        DecodedInstruction::Load {
            funct3,
            rd,
            rs1,
            offset,
        } => {
            let width = LoadWidth::from_funct3(funct3)?;
            (width.mnemonic(), format!("{rd}, {offset}({rs1})"))
        }
        DecodedInstruction::Store {
            funct3,
            rs1,
            rs2,
            offset,
        } => {
            let width = StoreWidth::from_funct3(funct3)?;
            (width.mnemonic(), format!("{rs2}, {offset}({rs1})"))
        }
        DecodedInstruction::AluImmediate {
            funct3,
            funct7,
            rd,
            rs1,
            imm,
        } => {
            let op = AluOperation::from_immediate(funct3, funct7)?;
            let imm = if op.is_shift() { imm & 0x1F } else { imm };
            (immediate_mnemonic(op), format!("{rd}, {rs1}, {imm}"))
        }
        DecodedInstruction::AluRegister {
            funct3,
            funct7,
            rd,
            rs1,
            rs2,
        } => {
            let op = AluOperation::from_register(funct3, funct7)?;
            (op.mnemonic(), format!("{rd}, {rs1}, {rs2}"))
        }
        DecodedInstruction::Jalr { .. } | DecodedInstruction::Unknown { .. } => return None,
    };
    Some(text)
}

#[allow(clippy::cast_sign_loss)]
const fn upper(imm: i32) -> u32 {
    (imm as u32) >> 12
}

const fn immediate_mnemonic(op: AluOperation) -> &'static str {
    match op {
        AluOperation::Add | AluOperation::Sub => "addi",
        AluOperation::Slt => "slti",
        AluOperation::Sltu => "sltiu",
        AluOperation::Xor => "xori",
        AluOperation::Or => "ori",
        AluOperation::And => "andi",
        AluOperation::Sll => "slli",
        AluOperation::Srl => "srli",
        AluOperation::Sra => "srai",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0x0050_0093, "addi x1, x0, 5")]
    #[case(0xFFF6_0613, "addi x12, x12, -1")]
    #[case(0x0020_81B3, "add x3, x1, x2")]
    #[case(0x4031_00B3, "sub x1, x2, x3")]
    #[case(0x0008_06B7, "lui x13, 0x80")]
    #[case(0x0000_1297, "auipc x5, 0x1")]
    #[case(0x0000_A183, "lw x3, 0(x1)")]
    #[case(0x00E6_AA23, "sw x14, 20(x13)")]
    #[case(0x00C5_4863, "blt x10, x12, 16")]
    #[case(0xFF1F_F06F, "jal x0, -16")]
    #[case(0x0000_80E7, "jalr x1, 0(x1)")]
    #[case(0x4030_D093, "srai x1, x1, 3")]
    #[case(0x0010_C103, "lbu x2, 1(x1)")]
    fn renders_known_words(#[case] word: u32, #[case] text: &str) {
        assert_eq!(disassemble(word), text);
    }

    #[test]
    fn sentinels_are_annotated() {
        assert_eq!(disassemble(HALT_WORD), "jal x0, 0 ; halt");
        let row = disassemble_row(0x1000, INTERRUPT_RETURN_WORD);
        assert_eq!(row.mnemonic, ".word");
        assert_eq!(row.operands, "0xffffffff ; interrupt return");
        assert!(!row.is_illegal);
    }

    #[test]
    fn illegal_words_render_as_data() {
        let row = disassemble_row(0x40, 0x0000_0073);
        assert!(row.is_illegal);
        assert_eq!(row.to_string(), ".word 0x00000073 ; illegal");
        // defined class, undefined selector
        assert!(disassemble_row(0, 0x0000_2063).is_illegal);
    }

    #[test]
    fn window_reads_around_center() {
        let mut bus = Bus::default();
        bus.load_words(0, &[0x0050_0093, 0x0030_0113, 0x0020_81B3, HALT_WORD])
            .unwrap();

        let rows = disassemble_window(0x8, 1, 1, &bus);
        let addrs: Vec<u32> = rows.iter().map(|r| r.addr).collect();
        assert_eq!(addrs, vec![0x4, 0x8, 0xC]);
        assert_eq!(rows[1].to_string(), "add x3, x1, x2");

        // clipped at address zero
        let rows = disassemble_window(0, 2, 0, &bus);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].addr, 0);
    }

    #[test]
    fn clipped_window_keeps_the_requested_tail() {
        let mut bus = Bus::default();
        bus.load_words(0, &[0x0050_0093, 0x0030_0113, 0x0020_81B3, HALT_WORD])
            .unwrap();

        let addrs: Vec<u32> = disassemble_window(0x4, 3, 1, &bus)
            .iter()
            .map(|r| r.addr)
            .collect();
        assert_eq!(addrs, vec![0x0, 0x4, 0x8]);
    }

    #[test]
    fn window_omits_rows_past_the_store() {
        let bus = Bus::default();
        let rows = disassemble_window(0x9_FFFC, 0, 3, &bus);
        assert_eq!(rows.len(), 1);
    }
}
