/// Canonical self-jump (`JAL x0, 0`) used by programs as the halt/idle marker.
pub const HALT_WORD: u32 = 0x0000_006F;

/// Reserved all-ones word that returns from the active interrupt diversion.
pub const INTERRUPT_RETURN_WORD: u32 = 0xFFFF_FFFF;

/// Opcode classes of the supported RV32I subset with their 7-bit opcode values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum OpcodeClass {
    Lui = 0b011_0111,
    Auipc = 0b001_0111,
    Jal = 0b110_1111,
    Jalr = 0b110_0111,
    Branch = 0b110_0011,
    Load = 0b000_0011,
    Store = 0b010_0011,
    AluImmediate = 0b001_0011,
    AluRegister = 0b011_0011,
}

/// Base encoding formats that determine how immediates are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum InstructionFormat {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl OpcodeClass {
    /// Returns the 7-bit opcode value for this class.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        self as u8
    }

    /// Returns the base encoding format used by this class.
    #[must_use]
    pub const fn format(self) -> InstructionFormat {
        match self {
            Self::Lui | Self::Auipc => InstructionFormat::U,
            Self::Jal => InstructionFormat::J,
            Self::Jalr | Self::Load | Self::AluImmediate => InstructionFormat::I,
            Self::Branch => InstructionFormat::B,
            Self::Store => InstructionFormat::S,
            Self::AluRegister => InstructionFormat::R,
        }
    }
}

/// Single source-of-truth opcode table for the nine supported classes.
///
/// Any opcode not present here decodes to an unknown instruction.
pub const OPCODE_CLASS_TABLE: [(u8, OpcodeClass); 9] = [
    (0b011_0111, OpcodeClass::Lui),
    (0b001_0111, OpcodeClass::Auipc),
    (0b110_1111, OpcodeClass::Jal),
    (0b110_0111, OpcodeClass::Jalr),
    (0b110_0011, OpcodeClass::Branch),
    (0b000_0011, OpcodeClass::Load),
    (0b010_0011, OpcodeClass::Store),
    (0b001_0011, OpcodeClass::AluImmediate),
    (0b011_0011, OpcodeClass::AluRegister),
];

/// Returns the opcode class for a 7-bit opcode value.
///
/// `None` means the opcode is outside the supported subset.
#[must_use]
pub fn classify_opcode(opcode: u8) -> Option<OpcodeClass> {
    OPCODE_CLASS_TABLE
        .iter()
        .find_map(|(value, class)| (*value == opcode).then_some(*class))
}

/// Extracts the inclusive bit range `hi..=lo` of `word`, right-aligned.
#[must_use]
pub const fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    (word >> lo) & (u32::MAX >> (31 - (hi - lo)))
}

/// Sign-extends the low `width` bits of `value` into a full `i32`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn sign_extend(value: u32, width: u32) -> i32 {
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}

/// Opcode field (bits 6..0).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn opcode(word: u32) -> u8 {
    bits(word, 6, 0) as u8
}

/// Destination register field (bits 11..7).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rd(word: u32) -> u8 {
    bits(word, 11, 7) as u8
}

/// `funct3` field (bits 14..12).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn funct3(word: u32) -> u8 {
    bits(word, 14, 12) as u8
}

/// First source register field (bits 19..15).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rs1(word: u32) -> u8 {
    bits(word, 19, 15) as u8
}

/// Second source register field (bits 24..20).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn rs2(word: u32) -> u8 {
    bits(word, 24, 20) as u8
}

/// `funct7` field (bits 31..25).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn funct7(word: u32) -> u8 {
    bits(word, 31, 25) as u8
}

/// I-type immediate: 12 bits from 31..20, sign-extended.
#[must_use]
pub const fn imm_i(word: u32) -> i32 {
    sign_extend(bits(word, 31, 20), 12)
}

/// S-type immediate: 31..25 and 11..7, sign-extended.
#[must_use]
pub const fn imm_s(word: u32) -> i32 {
    sign_extend((bits(word, 31, 25) << 5) | bits(word, 11, 7), 12)
}

/// B-type immediate: 31, 7, 30..25 and 11..8 with an implicit zero bit 0.
#[must_use]
pub const fn imm_b(word: u32) -> i32 {
    let raw = (bits(word, 31, 31) << 12)
        | (bits(word, 7, 7) << 11)
        | (bits(word, 30, 25) << 5)
        | (bits(word, 11, 8) << 1);
    sign_extend(raw, 13)
}

/// U-type immediate: bits 31..12 in place, low 12 bits zero.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn imm_u(word: u32) -> i32 {
    (word & 0xFFFF_F000) as i32
}

/// J-type immediate: 31, 19..12, 20 and 30..21 with an implicit zero bit 0.
#[must_use]
pub const fn imm_j(word: u32) -> i32 {
    let raw = (bits(word, 31, 31) << 20)
        | (bits(word, 19, 12) << 12)
        | (bits(word, 20, 20) << 11)
        | (bits(word, 30, 21) << 1);
    sign_extend(raw, 21)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn table_contains_unique_opcodes_and_classes() {
        let opcodes: HashSet<_> = OPCODE_CLASS_TABLE.iter().map(|(op, _)| *op).collect();
        let classes: HashSet<_> = OPCODE_CLASS_TABLE.iter().map(|(_, c)| *c).collect();
        assert_eq!(opcodes.len(), OPCODE_CLASS_TABLE.len());
        assert_eq!(classes.len(), OPCODE_CLASS_TABLE.len());
    }

    #[test]
    fn table_entries_agree_with_enum_discriminants() {
        for (value, class) in OPCODE_CLASS_TABLE {
            assert_eq!(class.opcode(), value);
            assert_eq!(classify_opcode(value), Some(class));
        }
    }

    #[test]
    fn unsupported_opcodes_classify_as_none() {
        assert_eq!(classify_opcode(0x00), None);
        assert_eq!(classify_opcode(0x7F), None);
        assert_eq!(classify_opcode(0b111_0011), None);
    }

    #[test]
    fn sign_extend_replicates_sign_bit() {
        assert_eq!(sign_extend(0x800, 12), -2048);
        assert_eq!(sign_extend(0x7FF, 12), 2047);
        assert_eq!(sign_extend(0xFFF, 12), -1);
        assert_eq!(sign_extend(0x1000, 13), -4096);
        assert_eq!(sign_extend(0x0010_0000, 21), -1_048_576);
    }

    #[test]
    fn field_extraction_matches_base_layout() {
        // add x3, x1, x2
        let word = 0x0020_81B3;
        assert_eq!(opcode(word), 0x33);
        assert_eq!(rd(word), 3);
        assert_eq!(funct3(word), 0);
        assert_eq!(rs1(word), 1);
        assert_eq!(rs2(word), 2);
        assert_eq!(funct7(word), 0);
    }

    #[test]
    fn immediates_match_known_encodings() {
        // addi x10, x0, 5
        assert_eq!(imm_i(0x0050_0513), 5);
        // addi x1, x0, -1
        assert_eq!(imm_i(0xFFF0_0093), -1);
        // sw x14, 20(x13)
        assert_eq!(imm_s(0x00E6_AA23), 20);
        // blt x10, x12, +16
        assert_eq!(imm_b(0x00C5_4863), 16);
        // jal x0, -16
        assert_eq!(imm_j(0xFF1F_F06F), -16);
        // lui x13, 0x80
        assert_eq!(imm_u(0x0008_06B7), 0x0008_0000);
        assert_eq!(imm_j(HALT_WORD), 0);
    }
}
