//! Write-only serial output port.
//!
//! A single register at [`SERIAL_ADDRESS`]: every word written emits its low
//! byte to the installed [`OutputSink`]. Reads return 0.

use std::cell::RefCell;
use std::rc::Rc;

use crate::api::{MmioDevice, MmioError, OutputSink};
pub use crate::memory::SERIAL_ADDRESS;

/// Inclusive end of the serial register window (one word).
pub const SERIAL_END: u32 = SERIAL_ADDRESS + 3;

/// Serial output peripheral.
pub struct SerialPort {
    sink: Box<dyn OutputSink>,
    bytes_written: u64,
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new(Box::new(DiscardSink))
    }
}

impl SerialPort {
    /// Creates a serial port writing to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Self {
            sink,
            bytes_written: 0,
        }
    }

    /// Number of characters emitted so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl MmioDevice for SerialPort {
    fn read32(&mut self, _addr: u32) -> Result<u32, MmioError> {
        Ok(0)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write32(&mut self, addr: u32, value: u32) -> Result<(), MmioError> {
        if addr == SERIAL_ADDRESS {
            self.sink.write_byte(value as u8);
            self.bytes_written = self.bytes_written.saturating_add(1);
        }
        Ok(())
    }
}

/// Sink that drops every byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl OutputSink for DiscardSink {
    fn write_byte(&mut self, _byte: u8) {}
}

/// Cloneable in-memory sink; every clone shares one buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl BufferSink {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out the captured bytes.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    /// Captured bytes as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    /// Discards the captured bytes.
    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }
}

impl OutputSink for BufferSink {
    fn write_byte(&mut self, byte: u8) {
        self.bytes.borrow_mut().push(byte);
    }
}
