//! Integer ALU shared by the register and immediate instruction classes.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::decoder::AluOperation;

/// Applies `op` to two register-width operands.
///
/// Shift amounts use the low five bits of `rhs`.
#[must_use]
pub fn apply(op: AluOperation, lhs: i32, rhs: i32) -> i32 {
    let shamt = (rhs as u32) & 0x1F;
    match op {
        AluOperation::Add => lhs.wrapping_add(rhs),
        AluOperation::Sub => lhs.wrapping_sub(rhs),
        AluOperation::Sll => ((lhs as u32) << shamt) as i32,
        AluOperation::Slt => i32::from(lhs < rhs),
        AluOperation::Sltu => i32::from((lhs as u32) < (rhs as u32)),
        AluOperation::Xor => lhs ^ rhs,
        AluOperation::Srl => ((lhs as u32) >> shamt) as i32,
        AluOperation::Sra => lhs >> shamt,
        AluOperation::Or => lhs | rhs,
        AluOperation::And => lhs & rhs,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::apply;
    use crate::decoder::AluOperation;

    #[rstest]
    #[case(AluOperation::Add, 5, 3, 8)]
    #[case(AluOperation::Add, i32::MAX, 1, i32::MIN)]
    #[case(AluOperation::Sub, 3, 5, -2)]
    #[case(AluOperation::Sll, 1, 31, i32::MIN)]
    #[case(AluOperation::Sll, 1, 33, 2)]
    #[case(AluOperation::Slt, -1, 0, 1)]
    #[case(AluOperation::Sltu, -1, 0, 0)]
    #[case(AluOperation::Xor, 0b1100, 0b1010, 0b0110)]
    #[case(AluOperation::Srl, -8, 1, 0x7FFF_FFFC)]
    #[case(AluOperation::Sra, -8, 1, -4)]
    #[case(AluOperation::Or, 0b1100, 0b1010, 0b1110)]
    #[case(AluOperation::And, 0b1100, 0b1010, 0b1000)]
    fn alu_table(#[case] op: AluOperation, #[case] lhs: i32, #[case] rhs: i32, #[case] out: i32) {
        assert_eq!(apply(op, lhs, rhs), out);
    }

    #[test]
    fn srai_immediate_with_funct7_bits_shifts_by_low_five() {
        // SRAI encodes 0x400 | shamt in the immediate
        assert_eq!(apply(AluOperation::Sra, -64, 0x403), -8);
    }
}
