//! Region routing, peripheral dispatch and fault reporting on the bus.

#![allow(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

use log as _;
use proptest as _;
use rstest::rstest;
use rv32_core::{
    Bus, BufferSink, FaultCode, FaultDetail, FaultLog, IoDispatcher, MemoryRegion, MmioDevice,
    MmioError, SerialPort, SERIAL_ADDRESS, VRAM_START,
};
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

/// Register file device that remembers the last write per word.
#[derive(Default)]
struct Latch {
    value: u32,
}

impl MmioDevice for Latch {
    fn read32(&mut self, _addr: u32) -> Result<u32, MmioError> {
        Ok(self.value)
    }

    fn write32(&mut self, _addr: u32, value: u32) -> Result<(), MmioError> {
        self.value = value;
        Ok(())
    }
}

struct Broken;

impl MmioDevice for Broken {
    fn read32(&mut self, addr: u32) -> Result<u32, MmioError> {
        Err(MmioError::ReadFailed { addr })
    }

    fn write32(&mut self, addr: u32, _value: u32) -> Result<(), MmioError> {
        Err(MmioError::WriteFailed { addr })
    }
}

#[test]
fn ram_word_round_trip() {
    let mut bus = Bus::default();
    bus.write32(0x10, 0xDEAD_BEEF);
    assert_eq!(bus.read32(0x10), 0xDEAD_BEEF);
    assert_eq!(&bus.memory()[0x10..0x14], &[0xEF, 0xBE, 0xAD, 0xDE]);
}

#[test]
fn vram_string_write_and_read_back() {
    let mut bus = Bus::default();
    let text = b"HELLO RV32";
    for (index, chunk) in text.chunks(4).enumerate() {
        let mut bytes = [0u8; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        bus.write32(VRAM_START + 4 * index as u32, u32::from_le_bytes(bytes));
    }

    let vram = bus.region_bytes(MemoryRegion::Vram);
    assert_eq!(&vram[..text.len()], text);
    assert_eq!(vram.len(), 0x1_0000);
    assert_eq!(bus.read32(VRAM_START), u32::from_le_bytes(*b"HELL"));
}

#[test]
fn out_of_bounds_reads_zero_and_writes_nothing() {
    let mut bus = Bus::default();
    let before = bus.memory().to_vec();

    assert_eq!(bus.read32(0x10_0000), 0);
    bus.write32(0x10_0000, 0xFF);

    assert_eq!(bus.memory(), before.as_slice());
    let counters = bus.diagnostics().counters();
    assert_eq!(counters.fault_count_memory, 2);
    assert_eq!(
        counters.last_fault.map(|f| f.code),
        Some(FaultCode::OutOfRangeAddress)
    );
}

#[test]
fn last_word_of_the_store_is_reachable() {
    let mut bus = Bus::default();
    // I/O region without a device: reads 0, no fault
    assert_eq!(bus.read32(0x9_FFFC), 0);
    assert_eq!(bus.diagnostics().counters().total_faults(), 0);
    assert_eq!(bus.peek32(0xA_0000), None);
}

#[rstest]
#[case(0x0_0000, Some(MemoryRegion::Ram))]
#[case(0x7_FFFF, Some(MemoryRegion::Ram))]
#[case(0x8_0000, Some(MemoryRegion::Vram))]
#[case(0x9_0000, Some(MemoryRegion::Expansion))]
#[case(0x9_FBFF, Some(MemoryRegion::Expansion))]
#[case(0x9_FC00, Some(MemoryRegion::Io))]
#[case(0xA_0000, None)]
fn regions_are_routed_by_address(#[case] addr: u32, #[case] region: Option<MemoryRegion>) {
    assert_eq!(rv32_core::bus::route(addr).map(|row| row.descriptor.region), region);
}

#[test]
fn expansion_region_is_open_bus() {
    let mut bus = Bus::default();
    bus.write32(0x9_0000, 0x1234_5678);
    assert_eq!(bus.read32(0x9_0000), 0);
    assert!(bus.memory()[0x9_0000..0x9_0004].iter().all(|b| *b == 0));
}

#[test]
fn serial_port_emits_low_byte_of_each_write() {
    let sink = BufferSink::new();
    let mut bus = Bus::new(Box::new(sink.clone()));
    for byte in b"Hi!" {
        bus.write32(SERIAL_ADDRESS, 0xFFFF_FF00 | u32::from(*byte));
    }
    assert_eq!(sink.text(), "Hi!");
    assert_eq!(bus.read32(SERIAL_ADDRESS), 0);
    // serial writes do not land in the backing store
    assert_eq!(bus.memory()[SERIAL_ADDRESS as usize], 0);
}

#[test]
fn unaligned_word_access_is_forced_down_and_reported() {
    let log = FaultLog::new();
    let mut bus = Bus::default();
    bus.diagnostics_mut().set_sink(Box::new(log.clone()));

    bus.write32(0x102, 0x0BAD_F00D);
    assert_eq!(bus.read32(0x100), 0x0BAD_F00D);

    let records = log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, FaultCode::MisalignedAddress);
    assert_eq!(records[0].detail, FaultDetail::Address(0x102));
}

#[test]
fn additional_devices_are_table_rows() {
    let io = IoDispatcher::new()
        .with_device(
            SERIAL_ADDRESS,
            SERIAL_ADDRESS + 3,
            Box::new(SerialPort::default()),
        )
        .with_device(0x9_FC10, 0x9_FC13, Box::new(Latch::default()));
    let mut bus = Bus::with_io(io);

    bus.write32(0x9_FC10, 77);
    assert_eq!(bus.read32(0x9_FC10), 77);
    assert_eq!(bus.read32(0x9_FC14), 0);
    assert_eq!(bus.io().len(), 2);
}

#[test]
fn device_errors_read_zero_and_are_not_faults() {
    let io = IoDispatcher::new().with_device(0x9_FC20, 0x9_FC23, Box::new(Broken));
    let mut bus = Bus::with_io(io);
    bus.write32(0x9_FC20, 1);
    assert_eq!(bus.read32(0x9_FC20), 0);
    assert_eq!(bus.diagnostics().counters().total_faults(), 0);
}

#[test]
fn loader_rejects_images_outside_ram() {
    let mut bus = Bus::default();
    assert!(bus.load_words(0x7_FFFC, &[1, 2]).is_err());
    assert!(bus.load_words(0x2, &[1]).is_err());
    assert!(bus.load_bytes(0x8_0000, &[1]).is_err());
    assert!(bus.load_words(0x7_FFFC, &[1]).is_ok());
    assert_eq!(bus.peek32(0x7_FFFC), Some(1));
}
