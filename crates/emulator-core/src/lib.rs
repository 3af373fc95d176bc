//! Functional emulator core for a subset of RV32I.
//!
//! A [`Cpu`] owns a [`Bus`] and steps through fetch, decode and execute.
//! Memory traffic is routed through a fixed region table (RAM, VRAM,
//! expansion, I/O) and a periodic software interrupt diverts control flow to a
//! fixed handler address.

/// Memory model primitives and fixed region map.
pub mod memory;
pub use memory::{
    decode_memory_region, new_address_space, AccessWidth, MemoryRegion, RegionDescriptor,
    ADDRESS_SPACE_BYTES, EXPANSION_END, EXPANSION_START, FIXED_MEMORY_REGIONS, IO_END, IO_START,
    RAM_END, RAM_START, SERIAL_ADDRESS, VRAM_END, VRAM_START,
};

/// Fault counters and diagnostic sinks.
pub mod diag;
pub use diag::{DiagCounters, DiagnosticSink, Diagnostics, FaultLog};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, MmioDevice, MmioError, OutputSink, RunOutcome, StepOutcome, StopReason,
    TraceEvent, TraceSink, DEFAULT_INTERRUPT_HANDLER, DEFAULT_INTERRUPT_THRESHOLD,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{ArchitecturalState, Register, RunState, ABI_NAMES, GENERAL_REGISTER_COUNT};

/// Opcode classes, field extraction and immediate assembly.
pub mod encoding;
pub use encoding::{
    classify_opcode, InstructionFormat, OpcodeClass, HALT_WORD, INTERRUPT_RETURN_WORD,
    OPCODE_CLASS_TABLE,
};

/// Instruction decoder.
pub mod decoder;
pub use decoder::{
    decode, AluOperation, BranchCondition, DecodedInstruction, LoadWidth, StoreWidth,
};

/// Instruction word builders.
pub mod encoder;

/// Assembly text rendering.
pub mod disasm;
pub use disasm::{disassemble, disassemble_row, disassemble_window, DisassemblyRow};

/// Fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode, FaultDetail, FaultRecord};

/// Memory-mapped peripherals.
pub mod peripherals;
pub use peripherals::{BufferSink, DiscardSink, IoDispatcher, SerialPort};

/// Region-routing address-space bus.
pub mod bus;
pub use bus::{Bus, BusControl, BusState, LoadError, RegionHandler, RegionRoute, REGION_TABLE};

/// Periodic interrupt controller.
pub mod interrupt;
pub use interrupt::{InterruptController, InterruptReturn};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{commit_execution, execute_instruction, ExecuteOutcome, ExecuteState};

/// Fetch-decode-execute engine.
pub mod cpu;
pub use cpu::Cpu;

#[cfg(test)]
use proptest as _;
