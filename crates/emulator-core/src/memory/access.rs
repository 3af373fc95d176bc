//! Alignment and range policy for data accesses.

use crate::fault::FaultCode;
use crate::memory::map::ADDRESS_SPACE_BYTES;

/// Byte width of a data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessWidth {
    /// One byte.
    Byte,
    /// Two bytes.
    Half,
    /// Four bytes.
    Word,
}

impl AccessWidth {
    /// Number of bytes transferred.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Maps a byte count back to a width.
    #[must_use]
    pub const fn from_bytes(bytes: u32) -> Option<Self> {
        match bytes {
            1 => Some(Self::Byte),
            2 => Some(Self::Half),
            4 => Some(Self::Word),
            _ => None,
        }
    }
}

/// Rounds `addr` down to a multiple of `width`.
#[must_use]
pub const fn align_down(addr: u32, width: AccessWidth) -> u32 {
    addr & !(width.bytes() - 1)
}

/// Validates natural alignment for `width`.
///
/// # Errors
///
/// Returns [`FaultCode::MisalignedAddress`] when `addr` is not a multiple of
/// the access width.
pub const fn validate_alignment(addr: u32, width: AccessWidth) -> Result<(), FaultCode> {
    if addr & (width.bytes() - 1) == 0 {
        Ok(())
    } else {
        Err(FaultCode::MisalignedAddress)
    }
}

/// Validates that `addr..addr + width` lies inside the backing store and
/// returns the starting index.
///
/// # Errors
///
/// Returns [`FaultCode::OutOfRangeAddress`] when the last byte of the access
/// falls outside the store or the range wraps.
pub const fn validate_range(addr: u32, width: AccessWidth) -> Result<usize, FaultCode> {
    match addr.checked_add(width.bytes() - 1) {
        Some(last) if (last as usize) < ADDRESS_SPACE_BYTES => Ok(addr as usize),
        _ => Err(FaultCode::OutOfRangeAddress),
    }
}

/// Bit offset of the byte lane `addr` selects inside its containing word.
#[must_use]
pub const fn lane_shift(addr: u32, width: AccessWidth) -> u32 {
    (align_down(addr, width) & 3) * 8
}

/// Extracts the `width`-sized lane at `addr` from the containing `word`,
/// zero-extended.
#[must_use]
pub const fn extract_lane(word: u32, addr: u32, width: AccessWidth) -> u32 {
    match width {
        AccessWidth::Word => word,
        AccessWidth::Half => (word >> lane_shift(addr, width)) & 0xFFFF,
        AccessWidth::Byte => (word >> lane_shift(addr, width)) & 0xFF,
    }
}

/// Replaces the `width`-sized lane at `addr` inside `word` with the low bits
/// of `value`, preserving the other bytes.
#[must_use]
pub const fn merge_lane(word: u32, addr: u32, width: AccessWidth, value: u32) -> u32 {
    let mask = match width {
        AccessWidth::Word => return value,
        AccessWidth::Half => 0xFFFF_u32,
        AccessWidth::Byte => 0xFF_u32,
    };
    let shift = lane_shift(addr, width);
    (word & !(mask << shift)) | ((value & mask) << shift)
}
