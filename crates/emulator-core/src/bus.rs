//! Address-space router.
//!
//! The bus owns the 640 KiB backing store and the I/O device table. Every
//! access consults [`REGION_TABLE`] once to pick a handler, so the read and
//! write paths always agree on region boundaries. Bad addresses never stop
//! execution: out-of-range reads return 0, out-of-range writes are dropped,
//! and misaligned accesses are forced down to the containing unit. All three
//! are reported through [`Diagnostics`].

use log::warn;
use thiserror::Error;

use crate::api::{MmioDevice, OutputSink};
use crate::diag::Diagnostics;
use crate::fault::FaultCode;
use crate::memory::{
    align_down, extract_lane, merge_lane, new_address_space, validate_alignment, validate_range,
    AccessWidth, MemoryRegion, RegionDescriptor, RAM_END, SERIAL_ADDRESS,
};
use crate::peripherals::{DiscardSink, IoDispatcher, SerialPort, SERIAL_END};

/// How accesses inside a region are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionHandler {
    /// Plain little-endian byte storage.
    Storage,
    /// Reads 0, ignores writes.
    Open,
    /// Delegated to the I/O device table.
    Device,
}

/// One row of the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionRoute {
    /// Region bounds.
    pub descriptor: RegionDescriptor,
    /// Access handler for the region.
    pub handler: RegionHandler,
}

/// Routing table in ascending address order.
pub const REGION_TABLE: [RegionRoute; 4] = [
    RegionRoute {
        descriptor: MemoryRegion::Ram.descriptor(),
        handler: RegionHandler::Storage,
    },
    RegionRoute {
        descriptor: MemoryRegion::Vram.descriptor(),
        handler: RegionHandler::Storage,
    },
    RegionRoute {
        descriptor: MemoryRegion::Expansion.descriptor(),
        handler: RegionHandler::Open,
    },
    RegionRoute {
        descriptor: MemoryRegion::Io.descriptor(),
        handler: RegionHandler::Device,
    },
];

/// Returns the routing row covering `addr`, or `None` past the store.
#[must_use]
pub fn route(addr: u32) -> Option<&'static RegionRoute> {
    REGION_TABLE
        .iter()
        .find(|row| row.descriptor.region.contains(addr))
}

/// Host-side image loading failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LoadError {
    /// The image does not fit entirely inside RAM.
    #[error("image of {len} bytes at {base:#07x} does not fit in RAM")]
    OutsideRam {
        /// Requested load address.
        base: u32,
        /// Image length in bytes.
        len: usize,
    },
    /// Word images must start on a word boundary.
    #[error("word image base {base:#07x} is not word-aligned")]
    Misaligned {
        /// Requested load address.
        base: u32,
    },
}

/// Control lines latched by the last bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusControl(u8);

impl BusControl {
    /// No transaction yet.
    pub const IDLE: Self = Self(0x00);
    /// Word read.
    pub const READ: Self = Self(0x01);
    /// Word write.
    pub const WRITE: Self = Self(0x02);
    /// The transaction was routed to the I/O device table.
    pub const IO: Self = Self(0x04);

    /// Raw line bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` when every line of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when no line is set.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }

    /// Sets the lines of `other` as well.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::fmt::Display for BusControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_idle() {
            return f.write_str("IDLE");
        }
        let names = [(Self::READ, "READ"), (Self::WRITE, "WRITE"), (Self::IO, "IO")];
        let mut first = true;
        for (line, name) in names {
            if self.contains(line) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Address, data and control lines of the last word transaction.
///
/// `address` is the address the caller asked for, before alignment. A read
/// latches the value it returned, a write the value it was given. Sub-word
/// stores go through a word read and a word write, so they latch as a write
/// of the merged word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusState {
    /// Address lines.
    pub address: u32,
    /// Data lines.
    pub data: u32,
    /// Control lines.
    pub control: BusControl,
}

/// Memory and peripheral bus.
pub struct Bus {
    memory: Box<[u8]>,
    io: IoDispatcher,
    diagnostics: Diagnostics,
    state: BusState,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("memory_bytes", &self.memory.len())
            .field("io", &self.io)
            .field("diagnostics", &self.diagnostics)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(Box::new(DiscardSink))
    }
}

impl Bus {
    /// Creates a zeroed bus whose serial port writes to `output`.
    #[must_use]
    pub fn new(output: Box<dyn OutputSink>) -> Self {
        let io = IoDispatcher::new().with_device(
            SERIAL_ADDRESS,
            SERIAL_END,
            Box::new(SerialPort::new(output)),
        );
        Self::with_io(io)
    }

    /// Creates a zeroed bus around a prepared device table.
    #[must_use]
    pub fn with_io(io: IoDispatcher) -> Self {
        Self {
            memory: new_address_space(),
            io,
            diagnostics: Diagnostics::new(),
            state: BusState::default(),
        }
    }

    /// Reads a little-endian word; the address is aligned down to 4.
    pub fn read32(&mut self, addr: u32) -> u32 {
        let resolved = self.resolve_word(addr);
        let value = match resolved {
            None | Some((_, RegionHandler::Open)) => 0,
            Some((aligned, RegionHandler::Storage)) => self.storage_word(aligned),
            Some((aligned, RegionHandler::Device)) => {
                self.io.read32(aligned).unwrap_or_else(|err| {
                    warn!("{err}");
                    0
                })
            }
        };
        self.latch(addr, value, BusControl::READ, resolved);
        value
    }

    /// Writes a little-endian word; the address is aligned down to 4.
    pub fn write32(&mut self, addr: u32, value: u32) {
        let resolved = self.resolve_word(addr);
        match resolved {
            None | Some((_, RegionHandler::Open)) => {}
            Some((aligned, RegionHandler::Storage)) => {
                let index = aligned as usize;
                self.memory[index..index + 4].copy_from_slice(&value.to_le_bytes());
            }
            Some((aligned, RegionHandler::Device)) => {
                if let Err(err) = self.io.write32(aligned, value) {
                    warn!("{err}");
                }
            }
        }
        self.latch(addr, value, BusControl::WRITE, resolved);
    }

    /// Reads `width` bytes at `addr` through the containing word,
    /// zero-extended.
    pub fn load(&mut self, addr: u32, width: AccessWidth) -> u32 {
        if width == AccessWidth::Word {
            return self.read32(addr);
        }
        self.check_alignment(addr, width);
        let word = self.read32(align_down(addr, AccessWidth::Word));
        extract_lane(word, addr, width)
    }

    /// Writes the low `width` bytes of `value` at `addr` as a
    /// read-modify-write of the containing word.
    pub fn store(&mut self, addr: u32, width: AccessWidth, value: u32) {
        if width == AccessWidth::Word {
            self.write32(addr, value);
            return;
        }
        self.check_alignment(addr, width);
        let base = align_down(addr, AccessWidth::Word);
        if let Err(code) = validate_range(base, AccessWidth::Word) {
            self.diagnostics.report_memory(code, addr);
            return;
        }
        let word = self.read32(base);
        self.write32(base, merge_lane(word, addr, width, value));
    }

    /// Side-effect free word read: no device access and no fault report.
    ///
    /// Returns `None` past the end of the store.
    #[must_use]
    pub fn peek32(&self, addr: u32) -> Option<u32> {
        let aligned = align_down(addr, AccessWidth::Word);
        validate_range(aligned, AccessWidth::Word).ok()?;
        let row = route(aligned)?;
        Some(match row.handler {
            RegionHandler::Storage => self.storage_word(aligned),
            RegionHandler::Open | RegionHandler::Device => 0,
        })
    }

    /// Copies `bytes` into RAM starting at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::OutsideRam`] when any byte would land outside RAM;
    /// nothing is written in that case.
    pub fn load_bytes(&mut self, base: u32, bytes: &[u8]) -> Result<(), LoadError> {
        let end = u64::from(base) + bytes.len() as u64;
        if !MemoryRegion::Ram.contains(base) || end > u64::from(RAM_END) + 1 {
            return Err(LoadError::OutsideRam {
                base,
                len: bytes.len(),
            });
        }
        let start = base as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Copies instruction or data words into RAM starting at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Misaligned`] for a base that is not a multiple of
    /// 4, and [`LoadError::OutsideRam`] when the image does not fit.
    pub fn load_words(&mut self, base: u32, words: &[u32]) -> Result<(), LoadError> {
        if validate_alignment(base, AccessWidth::Word).is_err() {
            return Err(LoadError::Misaligned { base });
        }
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        self.load_bytes(base, &bytes)
    }

    /// Raw backing bytes of `region`.
    #[must_use]
    pub fn region_bytes(&self, region: MemoryRegion) -> &[u8] {
        let (start, end) = region.bounds();
        &self.memory[start as usize..=end as usize]
    }

    /// Entire backing store.
    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Zeroes the backing store. Devices and counters are untouched.
    pub fn clear_memory(&mut self) {
        self.memory.fill(0);
    }

    /// Lines latched by the last word transaction. Starts idle.
    #[must_use]
    pub const fn state(&self) -> BusState {
        self.state
    }

    /// Device table.
    #[must_use]
    pub const fn io(&self) -> &IoDispatcher {
        &self.io
    }

    /// Mutable device table, for registering additional peripherals.
    pub const fn io_mut(&mut self) -> &mut IoDispatcher {
        &mut self.io
    }

    /// Fault counters and sink.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Mutable fault counters and sink.
    pub const fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    fn check_alignment(&mut self, addr: u32, width: AccessWidth) {
        if let Err(code) = validate_alignment(addr, width) {
            self.diagnostics.report_memory(code, addr);
        }
    }

    fn resolve_word(&mut self, addr: u32) -> Option<(u32, RegionHandler)> {
        self.check_alignment(addr, AccessWidth::Word);
        let aligned = align_down(addr, AccessWidth::Word);
        if let Err(code) = validate_range(aligned, AccessWidth::Word) {
            self.diagnostics.report_memory(code, addr);
            return None;
        }
        let Some(row) = route(aligned) else {
            self.diagnostics.report_memory(FaultCode::OutOfRangeAddress, addr);
            return None;
        };
        Some((aligned, row.handler))
    }

    const fn latch(
        &mut self,
        address: u32,
        data: u32,
        control: BusControl,
        resolved: Option<(u32, RegionHandler)>,
    ) {
        let control = match resolved {
            Some((_, RegionHandler::Device)) => control.with(BusControl::IO),
            _ => control,
        };
        self.state = BusState {
            address,
            data,
            control,
        };
    }

    fn storage_word(&self, aligned: u32) -> u32 {
        let index = aligned as usize;
        u32::from_le_bytes([
            self.memory[index],
            self.memory[index + 1],
            self.memory[index + 2],
            self.memory[index + 3],
        ])
    }
}
