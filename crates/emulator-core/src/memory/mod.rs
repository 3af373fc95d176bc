//! Memory model primitives and fixed address-space policies.

/// Alignment and range policy helpers.
pub mod access;
/// Fixed memory-region map and address decoder.
pub mod map;

pub use access::{
    align_down, extract_lane, lane_shift, merge_lane, validate_alignment, validate_range,
    AccessWidth,
};
pub use map::{
    decode_memory_region, MemoryRegion, RegionDescriptor, ADDRESS_SPACE_BYTES, EXPANSION_END,
    EXPANSION_START, FIXED_MEMORY_REGIONS, IO_END, IO_START, RAM_END, RAM_START, SERIAL_ADDRESS,
    VRAM_END, VRAM_START,
};

/// Allocates a zeroed 640 KiB backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}
