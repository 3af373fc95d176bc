//! Memory-mapped peripherals and the I/O-region device table.

/// Write-only serial output port.
pub mod serial;

pub use serial::{BufferSink, DiscardSink, SerialPort, SERIAL_END};

use crate::api::{MmioDevice, MmioError};

/// One row of the device table.
struct DeviceSlot {
    start: u32,
    end: u32,
    device: Box<dyn MmioDevice>,
}

/// I/O-region dispatcher supporting multiple peripheral devices.
///
/// Each device claims an inclusive word-aligned window. Accesses that hit no
/// device read 0 and drop writes.
#[derive(Default)]
pub struct IoDispatcher {
    slots: Vec<DeviceSlot>,
}

impl std::fmt::Debug for IoDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| (slot.start, slot.end)))
            .finish()
    }
}

impl IoDispatcher {
    /// Creates an empty device table.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Adds a device covering `start..=end`.
    #[must_use]
    pub fn with_device(mut self, start: u32, end: u32, device: Box<dyn MmioDevice>) -> Self {
        self.register(start, end, device);
        self
    }

    /// Adds a device covering `start..=end`. Earlier rows win on overlap.
    pub fn register(&mut self, start: u32, end: u32, device: Box<dyn MmioDevice>) {
        self.slots.push(DeviceSlot { start, end, device });
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no device is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` when some device claims `addr`.
    #[must_use]
    pub fn is_mapped(&self, addr: u32) -> bool {
        self.slots
            .iter()
            .any(|slot| (slot.start..=slot.end).contains(&addr))
    }

    fn device_for(&mut self, addr: u32) -> Option<&mut (dyn MmioDevice + 'static)> {
        self.slots
            .iter_mut()
            .find(|slot| (slot.start..=slot.end).contains(&addr))
            .map(|slot| slot.device.as_mut())
    }
}

impl MmioDevice for IoDispatcher {
    fn read32(&mut self, addr: u32) -> Result<u32, MmioError> {
        self.device_for(addr).map_or(Ok(0), |device| device.read32(addr))
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<(), MmioError> {
        self.device_for(addr)
            .map_or(Ok(()), |device| device.write32(addr, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SERIAL_ADDRESS;

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

    #[test]
    fn unmapped_addresses_read_zero_and_ignore_writes() {
        let mut io = IoDispatcher::new();
        assert!(io.is_empty());
        assert_eq!(io.read32(0x9_FC10).unwrap(), 0);
        io.write32(0x9_FC10, 7).unwrap();
        assert_eq!(io.read32(0x9_FC10).unwrap(), 0);
    }

    #[test]
    fn dispatcher_routes_to_the_claiming_device() {
        let sink = BufferSink::new();
        let mut io = IoDispatcher::new()
            .with_device(
                SERIAL_ADDRESS,
                SERIAL_END,
                Box::new(SerialPort::new(Box::new(sink.clone()))),
            )
            .with_device(0x9_FC10, 0x9_FC13, Box::new(Latch { value: 0 }));

        assert_eq!(io.len(), 2);
        assert!(io.is_mapped(0x9_FC12));
        assert!(!io.is_mapped(0x9_FC20));

        io.write32(SERIAL_ADDRESS, u32::from(b'Z')).unwrap();
        io.write32(0x9_FC10, 0xCAFE).unwrap();

        assert_eq!(sink.text(), "Z");
        assert_eq!(io.read32(0x9_FC10).unwrap(), 0xCAFE);
        assert_eq!(io.read32(SERIAL_ADDRESS).unwrap(), 0);
    }
}
