//! Fixed memory-region map and address decoder.

/// Inclusive start address of the RAM region.
pub const RAM_START: u32 = 0x0_0000;
/// Inclusive end address of the RAM region.
pub const RAM_END: u32 = 0x7_FFFF;
/// Inclusive start address of the video memory region.
pub const VRAM_START: u32 = 0x8_0000;
/// Inclusive end address of the video memory region.
pub const VRAM_END: u32 = 0x8_FFFF;
/// Inclusive start address of the expansion region.
pub const EXPANSION_START: u32 = 0x9_0000;
/// Inclusive end address of the expansion region.
pub const EXPANSION_END: u32 = 0x9_FBFF;
/// Inclusive start address of the memory-mapped I/O region.
pub const IO_START: u32 = 0x9_FC00;
/// Inclusive end address of the memory-mapped I/O region.
pub const IO_END: u32 = 0x9_FFFF;

/// Address of the write-only serial output register.
pub const SERIAL_ADDRESS: u32 = IO_START;

/// Region descriptor for the fixed memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u32,
    /// Inclusive end address.
    pub end: u32,
}

impl RegionDescriptor {
    /// Size of the region in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Regions are never empty; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Region classification for addresses inside the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryRegion {
    /// General-purpose RAM (`0x00000..=0x7FFFF`).
    Ram,
    /// Video memory consumed by the presentation layer (`0x80000..=0x8FFFF`).
    Vram,
    /// Expansion window; reads 0, ignores writes (`0x90000..=0x9FBFF`).
    Expansion,
    /// Memory-mapped peripherals (`0x9FC00..=0x9FFFF`).
    Io,
}

impl MemoryRegion {
    /// Returns the inclusive bounds for this region.
    #[must_use]
    pub const fn bounds(self) -> (u32, u32) {
        match self {
            Self::Ram => (RAM_START, RAM_END),
            Self::Vram => (VRAM_START, VRAM_END),
            Self::Expansion => (EXPANSION_START, EXPANSION_END),
            Self::Io => (IO_START, IO_END),
        }
    }

    /// Returns `true` when `addr` belongs to this region.
    #[must_use]
    pub const fn contains(self, addr: u32) -> bool {
        let (start, end) = self.bounds();
        addr >= start && addr <= end
    }

    /// Returns the descriptor for this region.
    #[must_use]
    pub const fn descriptor(self) -> RegionDescriptor {
        let (start, end) = self.bounds();
        RegionDescriptor {
            region: self,
            start,
            end,
        }
    }

    /// Lower-case display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Vram => "vram",
            Self::Expansion => "expansion",
            Self::Io => "io",
        }
    }
}

/// Fixed region layout in ascending address order.
pub const FIXED_MEMORY_REGIONS: [RegionDescriptor; 4] = [
    MemoryRegion::Ram.descriptor(),
    MemoryRegion::Vram.descriptor(),
    MemoryRegion::Expansion.descriptor(),
    MemoryRegion::Io.descriptor(),
];

/// Size in bytes of the backing store covered by [`FIXED_MEMORY_REGIONS`].
pub const ADDRESS_SPACE_BYTES: usize = IO_END as usize + 1;

const _: () = assert_fixed_region_layout();

const fn assert_fixed_region_layout() {
    assert!(
        FIXED_MEMORY_REGIONS[0].start == RAM_START && FIXED_MEMORY_REGIONS[0].end == RAM_END,
        "ram bounds mismatch"
    );
    assert!(
        FIXED_MEMORY_REGIONS[1].start == VRAM_START && FIXED_MEMORY_REGIONS[1].end == VRAM_END,
        "vram bounds mismatch"
    );
    assert!(
        FIXED_MEMORY_REGIONS[2].start == EXPANSION_START
            && FIXED_MEMORY_REGIONS[2].end == EXPANSION_END,
        "expansion bounds mismatch"
    );
    assert!(
        FIXED_MEMORY_REGIONS[3].start == IO_START && FIXED_MEMORY_REGIONS[3].end == IO_END,
        "io bounds mismatch"
    );

    let mut index = 0;
    while index < FIXED_MEMORY_REGIONS.len() {
        let descriptor = FIXED_MEMORY_REGIONS[index];
        assert!(
            descriptor.start <= descriptor.end,
            "region start cannot be greater than end"
        );

        if index > 0 {
            let previous = FIXED_MEMORY_REGIONS[index - 1];
            assert!(
                previous.end + 1 == descriptor.start,
                "fixed regions must be contiguous"
            );
        }

        index += 1;
    }

    assert!(
        FIXED_MEMORY_REGIONS[0].start == 0 && ADDRESS_SPACE_BYTES == 0xA_0000,
        "regions must cover the 640 KiB backing store"
    );
}

/// Decodes an address into its fixed memory region.
///
/// Returns `None` past the end of the backing store.
#[must_use]
pub const fn decode_memory_region(addr: u32) -> Option<MemoryRegion> {
    match addr {
        RAM_START..=RAM_END => Some(MemoryRegion::Ram),
        VRAM_START..=VRAM_END => Some(MemoryRegion::Vram),
        EXPANSION_START..=EXPANSION_END => Some(MemoryRegion::Expansion),
        IO_START..=IO_END => Some(MemoryRegion::Io),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_memory_region, MemoryRegion, ADDRESS_SPACE_BYTES, EXPANSION_END, EXPANSION_START,
        FIXED_MEMORY_REGIONS, IO_END, IO_START, RAM_END, RAM_START, SERIAL_ADDRESS, VRAM_END,
        VRAM_START,
    };

    #[test]
    fn region_decode_is_correct_at_boundaries() {
        assert_eq!(decode_memory_region(RAM_START), Some(MemoryRegion::Ram));
        assert_eq!(decode_memory_region(RAM_END), Some(MemoryRegion::Ram));
        assert_eq!(decode_memory_region(VRAM_START), Some(MemoryRegion::Vram));
        assert_eq!(decode_memory_region(VRAM_END), Some(MemoryRegion::Vram));
        assert_eq!(
            decode_memory_region(EXPANSION_START),
            Some(MemoryRegion::Expansion)
        );
        assert_eq!(
            decode_memory_region(EXPANSION_END),
            Some(MemoryRegion::Expansion)
        );
        assert_eq!(decode_memory_region(IO_START), Some(MemoryRegion::Io));
        assert_eq!(decode_memory_region(IO_END), Some(MemoryRegion::Io));
        assert_eq!(decode_memory_region(IO_END + 1), None);
        assert_eq!(decode_memory_region(u32::MAX), None);
    }

    #[test]
    fn serial_register_sits_at_io_base() {
        assert_eq!(SERIAL_ADDRESS, 0x9_FC00);
        assert_eq!(
            decode_memory_region(SERIAL_ADDRESS),
            Some(MemoryRegion::Io)
        );
    }

    #[test]
    fn descriptor_lengths_sum_to_backing_store() {
        let total: usize = FIXED_MEMORY_REGIONS.iter().map(|d| d.len()).sum();
        assert_eq!(total, ADDRESS_SPACE_BYTES);
        assert_eq!(MemoryRegion::Vram.descriptor().len(), 0x1_0000);
        assert_eq!(MemoryRegion::Io.descriptor().len(), 0x400);
    }

    #[test]
    fn contains_matches_decoder_across_the_store() {
        for addr in (RAM_START..=IO_END).step_by(0x100) {
            let region = decode_memory_region(addr).expect("inside the store");
            for candidate in FIXED_MEMORY_REGIONS {
                assert_eq!(candidate.region.contains(addr), candidate.region == region);
            }
        }
    }
}
