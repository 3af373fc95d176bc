//! Address arithmetic and load extension helpers for instruction execution.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::decoder::{LoadWidth, StoreWidth};
use crate::memory::AccessWidth;

/// Adds a signed offset to an address with 32-bit wrap-around.
#[must_use]
pub const fn offset_address(base: u32, offset: i32) -> u32 {
    base.wrapping_add_signed(offset)
}

/// `JALR` target: `(rs1 + imm) & !1`.
#[must_use]
pub const fn jalr_target(base: i32, imm: i32) -> u32 {
    (base.wrapping_add(imm) as u32) & !1
}

/// Sign- or zero-extends a raw loaded value to register width.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn extend_load(raw: u32, width: LoadWidth) -> i32 {
    match width {
        LoadWidth::Byte => raw as u8 as i8 as i32,
        LoadWidth::Half => raw as u16 as i16 as i32,
        LoadWidth::Word => raw as i32,
        LoadWidth::ByteUnsigned => (raw & 0xFF) as i32,
        LoadWidth::HalfUnsigned => (raw & 0xFFFF) as i32,
    }
}

/// Bus access width for a load.
#[must_use]
pub const fn load_access_width(width: LoadWidth) -> AccessWidth {
    match width {
        LoadWidth::Byte | LoadWidth::ByteUnsigned => AccessWidth::Byte,
        LoadWidth::Half | LoadWidth::HalfUnsigned => AccessWidth::Half,
        LoadWidth::Word => AccessWidth::Word,
    }
}

/// Bus access width for a store.
#[must_use]
pub const fn store_access_width(width: StoreWidth) -> AccessWidth {
    match width {
        StoreWidth::Byte => AccessWidth::Byte,
        StoreWidth::Half => AccessWidth::Half,
        StoreWidth::Word => AccessWidth::Word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_wrap_in_both_directions() {
        assert_eq!(offset_address(0x10, -16), 0);
        assert_eq!(offset_address(0, -4), 0xFFFF_FFFC);
        assert_eq!(offset_address(0xFFFF_FFFC, 8), 4);
    }

    #[test]
    fn jalr_clears_the_low_bit() {
        assert_eq!(jalr_target(0x101, 0), 0x100);
        assert_eq!(jalr_target(0x100, 3), 0x102);
        assert_eq!(jalr_target(-4, 0), 0xFFFF_FFFC);
    }

    #[test]
    fn loads_extend_by_width() {
        assert_eq!(extend_load(0x80, LoadWidth::Byte), -128);
        assert_eq!(extend_load(0x80, LoadWidth::ByteUnsigned), 0x80);
        assert_eq!(extend_load(0xFFFF, LoadWidth::Half), -1);
        assert_eq!(extend_load(0xFFFF, LoadWidth::HalfUnsigned), 0xFFFF);
        assert_eq!(extend_load(0xDEAD_BEEF, LoadWidth::Word), 0xDEAD_BEEF_u32 as i32);
    }
}
