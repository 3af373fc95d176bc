//! The fetch-decode-execute engine.
//!
//! [`Cpu`] owns the architectural state, the [`Bus`] and the
//! [`InterruptController`]. Each [`Cpu::step`] performs at most one interrupt
//! delivery, one fetch, one decode and one execute.

use log::{debug, trace, warn};

use crate::api::{CoreConfig, RunOutcome, StepOutcome, StopReason, TraceEvent, TraceSink};
use crate::bus::Bus;
use crate::decoder::decode;
use crate::diag::DiagCounters;
use crate::disasm::disassemble;
use crate::encoding::{HALT_WORD, INTERRUPT_RETURN_WORD};
use crate::execute::{commit_execution, execute_instruction, ExecuteOutcome};
use crate::interrupt::InterruptController;
use crate::state::{ArchitecturalState, Register};

/// Execution core: registers, program counter, bus and interrupt state.
pub struct Cpu {
    arch: ArchitecturalState,
    bus: Bus,
    interrupts: InterruptController,
    config: CoreConfig,
    trace: Option<Box<dyn TraceSink>>,
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("arch", &self.arch)
            .field("interrupts", &self.interrupts)
            .field("config", &self.config)
            .field("trace", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(Bus::default())
    }
}

impl Cpu {
    /// Creates a CPU with zeroed registers and the default configuration.
    #[must_use]
    pub fn new(bus: Bus) -> Self {
        Self::with_config(bus, CoreConfig::default())
    }

    /// Creates a CPU with zeroed registers and the given configuration.
    #[must_use]
    pub fn with_config(bus: Bus, config: CoreConfig) -> Self {
        Self {
            arch: ArchitecturalState::default(),
            bus,
            interrupts: InterruptController::new(&config),
            config,
            trace: None,
        }
    }

    /// Runs one step.
    ///
    /// A pending interrupt is delivered first and the fetch happens at the
    /// handler address in the same step. The interrupt-return word ends the
    /// step without decoding and does not count toward the threshold.
    pub fn step(&mut self) -> StepOutcome {
        self.deliver_interrupt();

        let pc = self.arch.pc();
        self.bus.diagnostics_mut().set_context_pc(Some(pc));
        let word = self.bus.read32(pc);
        self.arch.set_pc(pc.wrapping_add(4));
        self.emit(TraceEvent::InstructionStart { pc, word });

        let outcome = if word == INTERRUPT_RETURN_WORD {
            self.interrupt_return(pc)
        } else {
            self.execute(pc, word)
        };

        self.arch.clear_zero_register();
        self.bus.diagnostics_mut().set_context_pc(None);
        outcome
    }

    /// Steps until the halt self-jump is next (with no interrupt due) or
    /// `max_steps` steps have run.
    pub fn run(&mut self, max_steps: u64) -> RunOutcome {
        let mut steps = 0;
        while steps < max_steps {
            if self.is_halted() {
                return RunOutcome {
                    steps,
                    reason: StopReason::Halted,
                };
            }
            let _ = self.step();
            steps += 1;
        }

        let reason = if self.is_halted() {
            StopReason::Halted
        } else {
            StopReason::StepLimit
        };
        RunOutcome { steps, reason }
    }

    /// Returns `true` when the word at `pc` is the halt sentinel and the next
    /// step would not deliver an interrupt.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        !self.interrupts.delivery_due() && self.bus.peek32(self.arch.pc()) == Some(HALT_WORD)
    }

    fn deliver_interrupt(&mut self) {
        let saved_return_address = self.arch.pc();
        let Some(handler) = self.interrupts.take_delivery(saved_return_address) else {
            return;
        };
        debug!(
            "interrupt: saved {saved_return_address:#010x}, entering handler {handler:#010x}"
        );
        self.bus.diagnostics_mut().counters_mut().record_interrupt();
        self.arch.set_pc(handler);
        self.emit(TraceEvent::InterruptEntered {
            saved_return_address,
            handler,
        });
    }

    fn interrupt_return(&mut self, pc: u32) -> StepOutcome {
        let ret = self.interrupts.complete_return();
        if ret.was_active {
            debug!("interrupt return at {pc:#010x}, resuming {:#010x}", ret.resume_pc);
        } else {
            warn!(
                "interrupt return at {pc:#010x} with no active diversion, resuming {:#010x}",
                ret.resume_pc
            );
        }
        self.arch.set_pc(ret.resume_pc);
        self.bus.diagnostics_mut().counters_mut().record_interrupt_return();
        self.emit(TraceEvent::InterruptReturned {
            resume_pc: ret.resume_pc,
        });
        StepOutcome::InterruptReturned {
            resume_pc: ret.resume_pc,
        }
    }

    fn execute(&mut self, pc: u32, word: u32) -> StepOutcome {
        trace!("{pc:#010x}: {word:#010x}  {}", disassemble(word));

        let instruction = decode(word);
        let (outcome, exec) = execute_instruction(&instruction, &self.arch, &mut self.bus, pc);
        let step = match outcome {
            ExecuteOutcome::Retired => {
                commit_execution(&mut self.arch, &mut self.bus, &exec);
                StepOutcome::Retired { pc, word }
            }
            ExecuteOutcome::Unimplemented => {
                self.bus.diagnostics_mut().report_unimplemented(pc, word);
                StepOutcome::Unimplemented { pc, word }
            }
        };

        self.bus
            .diagnostics_mut()
            .counters_mut()
            .increment_instruction_count();
        self.interrupts.on_instruction_completed();
        self.emit(TraceEvent::InstructionRetired {
            pc,
            next_pc: self.arch.pc(),
        });
        step
    }

    fn emit(&mut self, event: TraceEvent) {
        if !self.config.tracing_enabled {
            return;
        }
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(event);
        }
    }

    /// Architectural state.
    #[must_use]
    pub const fn arch(&self) -> &ArchitecturalState {
        &self.arch
    }

    /// Mutable architectural state, for loaders and tests.
    pub const fn arch_mut(&mut self) -> &mut ArchitecturalState {
        &mut self.arch
    }

    /// The bus.
    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutable bus access.
    pub const fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Interrupt controller.
    #[must_use]
    pub const fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Mutable interrupt controller.
    pub const fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    /// Configuration the CPU was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.arch.pc()
    }

    /// Sets the program counter.
    pub const fn set_pc(&mut self, pc: u32) {
        self.arch.set_pc(pc);
    }

    /// Reads a register; `x0` is always 0.
    #[must_use]
    pub const fn register(&self, reg: Register) -> i32 {
        self.arch.gpr(reg)
    }

    /// Installs a trace sink. Events flow only when tracing is enabled in the
    /// configuration.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Removes the trace sink.
    pub fn clear_trace_sink(&mut self) {
        self.trace = None;
    }

    /// Fault, instruction and interrupt counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &DiagCounters {
        self.bus.diagnostics().counters()
    }

    /// Zeroes registers and pc, clears interrupt state and counters. Memory
    /// contents are kept.
    pub fn reset(&mut self) {
        self.arch.reset();
        self.interrupts.reset();
        self.bus.diagnostics_mut().counters_mut().reset();
    }
}
