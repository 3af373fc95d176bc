//! Fault counters and the diagnostic sink contract.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::fault::{FaultClass, FaultCode, FaultRecord};

/// Core-owned diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagCounters {
    /// The last fault reported, if any.
    pub last_fault: Option<FaultRecord>,
    /// Saturating counter for decode-class faults.
    pub fault_count_decode: u32,
    /// Saturating counter for memory-class faults.
    pub fault_count_memory: u32,
    /// Saturating counter for completed instructions.
    pub instruction_count: u64,
    /// Saturating counter for delivered interrupts.
    pub interrupt_count: u32,
    /// Saturating counter for executed interrupt-return words.
    pub interrupt_return_count: u32,
}

impl DiagCounters {
    /// Creates a new set of counters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault occurrence, updating the last fault and its class
    /// counter.
    pub const fn record_fault(&mut self, record: FaultRecord) {
        self.last_fault = Some(record);
        match record.code.class() {
            FaultClass::Decode => {
                self.fault_count_decode = self.fault_count_decode.saturating_add(1);
            }
            FaultClass::Memory => {
                self.fault_count_memory = self.fault_count_memory.saturating_add(1);
            }
        }
    }

    /// Returns the counter for `class`.
    #[must_use]
    pub const fn fault_count(&self, class: FaultClass) -> u32 {
        match class {
            FaultClass::Decode => self.fault_count_decode,
            FaultClass::Memory => self.fault_count_memory,
        }
    }

    /// Total faults across every class.
    #[must_use]
    pub const fn total_faults(&self) -> u32 {
        self.fault_count_decode.saturating_add(self.fault_count_memory)
    }

    /// Increments the completed-instruction counter.
    pub const fn increment_instruction_count(&mut self) {
        self.instruction_count = self.instruction_count.saturating_add(1);
    }

    /// Records an interrupt delivery.
    pub const fn record_interrupt(&mut self) {
        self.interrupt_count = self.interrupt_count.saturating_add(1);
    }

    /// Records an executed interrupt-return word.
    pub const fn record_interrupt_return(&mut self) {
        self.interrupt_return_count = self.interrupt_return_count.saturating_add(1);
    }

    /// Resets all counters to their default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// External observer of reported faults.
pub trait DiagnosticSink {
    /// Called once per reported fault, after the counters are updated.
    fn on_fault(&mut self, record: &FaultRecord);
}

/// Cloneable fault recorder; every clone shares one list.
#[derive(Debug, Clone, Default)]
pub struct FaultLog {
    records: Rc<RefCell<Vec<FaultRecord>>>,
}

impl FaultLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out the recorded faults in report order.
    #[must_use]
    pub fn records(&self) -> Vec<FaultRecord> {
        self.records.borrow().clone()
    }

    /// Number of recorded faults.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl DiagnosticSink for FaultLog {
    fn on_fault(&mut self, record: &FaultRecord) {
        self.records.borrow_mut().push(*record);
    }
}

/// Counters plus an optional sink, shared by the bus and the CPU.
///
/// `context_pc` is the address of the instruction currently executing; it is
/// attached to memory faults so they can be traced back to their source.
#[derive(Default)]
pub struct Diagnostics {
    counters: DiagCounters,
    sink: Option<Box<dyn DiagnosticSink>>,
    context_pc: Option<u32>,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("counters", &self.counters)
            .field("has_sink", &self.sink.is_some())
            .field("context_pc", &self.context_pc)
            .finish()
    }
}

impl Diagnostics {
    /// Creates diagnostics with zeroed counters and no sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces the external sink.
    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = Some(sink);
    }

    /// Removes the external sink.
    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// Read-only view of the counters.
    #[must_use]
    pub const fn counters(&self) -> &DiagCounters {
        &self.counters
    }

    /// Mutable view of the counters.
    pub const fn counters_mut(&mut self) -> &mut DiagCounters {
        &mut self.counters
    }

    /// Sets the executing-instruction address attached to memory faults.
    pub const fn set_context_pc(&mut self, pc: Option<u32>) {
        self.context_pc = pc;
    }

    /// Address of the instruction currently executing, if any.
    #[must_use]
    pub const fn context_pc(&self) -> Option<u32> {
        self.context_pc
    }

    /// Counts, logs and forwards a fault.
    pub fn report(&mut self, record: FaultRecord) {
        warn!("{record}");
        self.counters.record_fault(record);
        if let Some(sink) = self.sink.as_mut() {
            sink.on_fault(&record);
        }
    }

    /// Reports a data-access fault at `address` using the context pc.
    pub fn report_memory(&mut self, code: FaultCode, address: u32) {
        self.report(FaultRecord::memory(code, self.context_pc, address));
    }

    /// Reports an operation the executor could not perform.
    pub fn report_unimplemented(&mut self, pc: u32, word: u32) {
        self.report(FaultRecord::unimplemented(pc, word));
    }
}
