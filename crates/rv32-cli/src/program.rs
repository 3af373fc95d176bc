//! Program images and the built-in demonstration program.

use std::fs;
use std::path::Path;

use log::debug;
use rv32_core::encoder::{add, addi, bge, blt, lui, sb, sw, x};
use rv32_core::{Bus, Register, HALT_WORD, INTERRUPT_RETURN_WORD, SERIAL_ADDRESS, VRAM_START};

use crate::error::CliError;

/// Text the demo program prints.
pub const DEMO_OUTPUT: &str = "SUM=45";

/// A word image and the RAM address it loads at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    base: u32,
    words: Vec<u32>,
}

impl Program {
    /// Wraps prepared words.
    #[must_use]
    pub const fn new(base: u32, words: Vec<u32>) -> Self {
        Self { base, words }
    }

    /// Builds an image from little-endian bytes; a trailing partial word is
    /// zero-padded.
    #[must_use]
    pub fn from_le_bytes(base: u32, bytes: &[u8]) -> Self {
        let words = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(word)
            })
            .collect();
        Self { base, words }
    }

    /// Reads a raw little-endian binary.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] when the file cannot be read and
    /// [`CliError::EmptyProgram`] when it holds no bytes.
    pub fn from_file(base: u32, path: &Path) -> Result<Self, CliError> {
        let bytes = fs::read(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(CliError::EmptyProgram(path.to_path_buf()));
        }
        Ok(Self::from_le_bytes(base, &bytes))
    }

    /// Sums 1..=9, converts the total to decimal digits and writes
    /// `SUM=45` to VRAM and the serial port, then halts.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn demo() -> Self {
        let vram = x(1);
        let serial = x(2);
        let sum = x(10);
        let counter = x(11);
        let limit = x(12);
        let scratch = x(13);
        let tens = x(14);
        let rest = x(15);
        let ten = x(16);

        let mut code = Code::default();
        code.push(lui(vram, VRAM_START as i32));
        code.push(lui(serial, (SERIAL_ADDRESS + 0x400) as i32));
        code.push(addi(serial, serial, -0x400));

        code.push(addi(sum, Register::ZERO, 0));
        code.push(addi(counter, Register::ZERO, 1));
        code.push(addi(limit, Register::ZERO, 10));
        let sum_loop = code.here();
        code.push(add(sum, sum, counter));
        code.push(addi(counter, counter, 1));
        code.push(blt(counter, limit, sum_loop - code.here()));

        let mut column = 0;
        for byte in b"SUM=" {
            code.put_char(scratch, i32::from(*byte), vram, serial, column);
            column += 1;
        }

        // tens = sum / 10, rest = sum % 10 by repeated subtraction
        code.push(addi(ten, Register::ZERO, 10));
        code.push(addi(tens, Register::ZERO, -1));
        code.push(addi(rest, sum, 10));
        let divide = code.here();
        code.push(addi(rest, rest, -10));
        code.push(addi(tens, tens, 1));
        code.push(bge(rest, ten, divide - code.here()));

        for digit in [tens, rest] {
            code.push(addi(digit, digit, i32::from(b'0')));
            code.push(sb(digit, vram, column));
            code.push(sw(digit, serial, 0));
            column += 1;
        }
        code.push(addi(scratch, Register::ZERO, i32::from(b'\n')));
        code.push(sw(scratch, serial, 0));
        code.push(HALT_WORD);

        Self::new(0, code.words)
    }

    /// Load address.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Image words.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Copies the image into RAM.
    ///
    /// With a `handler` address, the interrupt-return word is placed there
    /// unless the image already covers it, so a periodic interrupt returns
    /// straight to the interrupted code.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Load`] when the image or the handler word does not
    /// fit in RAM or is misaligned.
    pub fn install(&self, bus: &mut Bus, handler: Option<u32>) -> Result<(), CliError> {
        bus.load_words(self.base, &self.words)?;
        debug!("loaded {} words at {:#07x}", self.words.len(), self.base);

        if let Some(handler) = handler.filter(|addr| !self.covers(*addr)) {
            bus.load_words(handler, &[INTERRUPT_RETURN_WORD])?;
            debug!("installed interrupt return at {handler:#07x}");
        }
        Ok(())
    }

    fn covers(&self, addr: u32) -> bool {
        let len = u64::try_from(self.words.len()).unwrap_or(u64::MAX) * 4;
        let start = u64::from(self.base);
        (start..start.saturating_add(len)).contains(&u64::from(addr))
    }
}

/// Word buffer addressed by byte offset.
#[derive(Default)]
struct Code {
    words: Vec<u32>,
}

impl Code {
    fn push(&mut self, word: u32) {
        self.words.push(word);
    }

    fn here(&self) -> i32 {
        i32::try_from(self.words.len() * 4).unwrap_or(i32::MAX)
    }

    fn put_char(
        &mut self,
        scratch: Register,
        byte: i32,
        vram: Register,
        serial: Register,
        column: i32,
    ) {
        self.push(addi(scratch, Register::ZERO, byte));
        self.push(sb(scratch, vram, column));
        self.push(sw(scratch, serial, 0));
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rv32_core::{BufferSink, Cpu, MemoryRegion, StopReason};

    use super::*;

    #[test]
    fn demo_prints_the_sum() {
        let sink = BufferSink::new();
        let mut bus = Bus::new(Box::new(sink.clone()));
        Program::demo().install(&mut bus, Some(0x1000)).unwrap();
        let mut cpu = Cpu::new(bus);

        let outcome = cpu.run(200);
        assert_eq!(outcome.reason, StopReason::Halted);
        assert_eq!(sink.text(), format!("{DEMO_OUTPUT}\n"));
        let vram = cpu.bus().region_bytes(MemoryRegion::Vram);
        assert_eq!(&vram[..DEMO_OUTPUT.len()], DEMO_OUTPUT.as_bytes());
        assert_eq!(cpu.register(x(10)), 45);
        assert_eq!(cpu.diagnostics().total_faults(), 0);
    }

    #[test]
    fn demo_survives_frequent_interrupts() {
        let sink = BufferSink::new();
        let mut bus = Bus::new(Box::new(sink.clone()));
        Program::demo().install(&mut bus, Some(0x1000)).unwrap();
        let mut cpu = Cpu::with_config(
            bus,
            rv32_core::CoreConfig {
                interrupt_threshold: 3,
                ..rv32_core::CoreConfig::default()
            },
        );
        assert_eq!(cpu.run(1_000).reason, StopReason::Halted);
        assert_eq!(sink.text(), format!("{DEMO_OUTPUT}\n"));
        assert!(cpu.diagnostics().interrupt_count > 0);
    }

    #[test]
    fn install_places_return_word_at_handler() {
        let mut bus = Bus::default();
        Program::new(0, vec![HALT_WORD])
            .install(&mut bus, Some(0x1000))
            .unwrap();
        assert_eq!(bus.peek32(0x1000), Some(INTERRUPT_RETURN_WORD));
    }

    #[test]
    fn install_keeps_a_program_supplied_handler() {
        let mut bus = Bus::default();
        let words = vec![0x0000_0013; 0x1000 / 4 + 2];
        Program::new(0, words).install(&mut bus, Some(0x1000)).unwrap();
        assert_eq!(bus.peek32(0x1000), Some(0x0000_0013));
    }

    #[test]
    fn install_rejects_images_past_ram() {
        let mut bus = Bus::default();
        let err = Program::new(0x7_FFFC, vec![0, 0])
            .install(&mut bus, None)
            .unwrap_err();
        assert!(matches!(err, CliError::Load(_)));
    }

    #[test]
    fn bytes_pad_the_last_word() {
        let program = Program::from_le_bytes(0x40, &[0x13, 0x00, 0x00, 0x00, 0x6F]);
        assert_eq!(program.words(), &[0x13, 0x6F]);
        assert_eq!(program.base(), 0x40);
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            Program::from_file(0, file.path()),
            Err(CliError::EmptyProgram(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&HALT_WORD.to_le_bytes()).unwrap();
        let program = Program::from_file(0, file.path()).unwrap();
        assert_eq!(program.words(), &[HALT_WORD]);
    }
}
