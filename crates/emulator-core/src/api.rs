//! Public host-facing API contracts for embedding the emulator core.

use thiserror::Error;

/// Default number of completed instructions between periodic interrupts.
pub const DEFAULT_INTERRUPT_THRESHOLD: u32 = 1000;

/// Default address control is diverted to when an interrupt is delivered.
pub const DEFAULT_INTERRUPT_HANDLER: u32 = 0x0000_1000;

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Enables periodic interrupt scheduling and delivery.
    pub interrupts_enabled: bool,
    /// Completed instructions between scheduled interrupts; 0 disables scheduling.
    pub interrupt_threshold: u32,
    /// Handler entry address used on delivery.
    pub interrupt_handler: u32,
    /// Enables trace callback dispatch.
    pub tracing_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            interrupts_enabled: true,
            interrupt_threshold: DEFAULT_INTERRUPT_THRESHOLD,
            interrupt_handler: DEFAULT_INTERRUPT_HANDLER,
            tracing_enabled: false,
        }
    }
}

/// Consumer of bytes written to the serial output register.
pub trait OutputSink {
    /// Receives one output character.
    fn write_byte(&mut self, byte: u8);
}

/// MMIO device transport failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MmioError {
    /// Device could not complete a read.
    #[error("device read failed at {addr:#07x}")]
    ReadFailed {
        /// Word address of the access.
        addr: u32,
    },
    /// Device could not complete a write.
    #[error("device write failed at {addr:#07x}")]
    WriteFailed {
        /// Word address of the access.
        addr: u32,
    },
}

/// Word-wide device contract for the I/O region.
///
/// Addresses are absolute and already aligned to 4. Sub-word stores reach
/// devices as a read-modify-write of the containing word.
pub trait MmioDevice {
    /// Reads one word.
    ///
    /// # Errors
    ///
    /// Returns [`MmioError::ReadFailed`] when the device cannot complete the
    /// read; the bus then reads 0.
    fn read32(&mut self, addr: u32) -> Result<u32, MmioError>;

    /// Writes one word.
    ///
    /// # Errors
    ///
    /// Returns [`MmioError::WriteFailed`] when the device cannot complete the
    /// write; the bus then drops it.
    fn write32(&mut self, addr: u32, value: u32) -> Result<(), MmioError>;
}

/// Result of one call to [`crate::Cpu::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction executed and counted as completed.
    Retired {
        /// Address the word was fetched from.
        pc: u32,
        /// Raw instruction word.
        word: u32,
    },
    /// The interrupt-return word restored the saved address.
    InterruptReturned {
        /// Address execution resumes at.
        resume_pc: u32,
    },
    /// The word could not be executed; only the pc advanced.
    Unimplemented {
        /// Address the word was fetched from.
        pc: u32,
        /// Raw instruction word.
        word: u32,
    },
}

/// Why [`crate::Cpu::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The next word is the halt self-jump and no interrupt is due.
    Halted,
    /// The step budget ran out.
    StepLimit,
}

/// Aggregated outcome of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Steps executed during this call.
    pub steps: u64,
    /// Stop condition that ended the run.
    pub reason: StopReason,
}

/// Trace events emitted at step boundaries when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Interrupt delivered before the fetch.
    InterruptEntered {
        /// Address saved for the return.
        saved_return_address: u32,
        /// Handler address control moved to.
        handler: u32,
    },
    /// Word fetched, before execution.
    InstructionStart {
        /// Fetch address.
        pc: u32,
        /// Raw instruction word.
        word: u32,
    },
    /// Step finished.
    InstructionRetired {
        /// Fetch address.
        pc: u32,
        /// Program counter after the step.
        next_pc: u32,
    },
    /// Interrupt-return word executed.
    InterruptReturned {
        /// Address execution resumes at.
        resume_pc: u32,
    },
}

/// Sink trait for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, MmioError, DEFAULT_INTERRUPT_HANDLER, DEFAULT_INTERRUPT_THRESHOLD};

    #[test]
    fn default_core_config_enables_periodic_interrupts() {
        let config = CoreConfig::default();

        assert!(config.interrupts_enabled);
        assert_eq!(config.interrupt_threshold, DEFAULT_INTERRUPT_THRESHOLD);
        assert_eq!(config.interrupt_handler, DEFAULT_INTERRUPT_HANDLER);
        assert!(!config.tracing_enabled);
    }

    #[test]
    fn defaults_match_documented_constants() {
        assert_eq!(DEFAULT_INTERRUPT_THRESHOLD, 1000);
        assert_eq!(DEFAULT_INTERRUPT_HANDLER, 0x1000);
    }

    #[test]
    fn mmio_errors_name_the_address() {
        assert_eq!(
            MmioError::WriteFailed { addr: 0x9_FC00 }.to_string(),
            "device write failed at 0x9fc00"
        );
    }
}
