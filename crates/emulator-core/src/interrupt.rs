//! Periodic software interrupt controller.
//!
//! After `threshold` completed instructions an interrupt becomes pending. At
//! the start of the next step the CPU asks [`InterruptController::take_delivery`]
//! whether to divert; delivery saves the current pc and enters
//! [`RunState::HandlerContext`]. The interrupt-return word leaves the handler
//! context and resumes at the saved address.

use crate::api::CoreConfig;
use crate::state::RunState;

/// Result of executing the interrupt-return word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterruptReturn {
    /// Address execution resumes at.
    pub resume_pc: u32,
    /// `false` when no diversion was active.
    pub was_active: bool,
}

/// Pending flag, saved return address and handler context tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InterruptController {
    pending: bool,
    saved_return_address: u32,
    handler_address: u32,
    threshold: u32,
    completed_since_schedule: u32,
    run_state: RunState,
    enabled: bool,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new(&CoreConfig::default())
    }
}

impl InterruptController {
    /// Creates a controller from the interrupt fields of `config`.
    #[must_use]
    pub const fn new(config: &CoreConfig) -> Self {
        Self {
            pending: false,
            saved_return_address: 0,
            handler_address: config.interrupt_handler,
            threshold: config.interrupt_threshold,
            completed_since_schedule: 0,
            run_state: RunState::Running,
            enabled: config.interrupts_enabled,
        }
    }

    /// Returns `true` when an interrupt is waiting for delivery.
    #[must_use]
    pub const fn pending(&self) -> bool {
        self.pending
    }

    /// Address restored by the next interrupt-return word.
    #[must_use]
    pub const fn saved_return_address(&self) -> u32 {
        self.saved_return_address
    }

    /// Handler entry address.
    #[must_use]
    pub const fn handler_address(&self) -> u32 {
        self.handler_address
    }

    /// Completed instructions between scheduled interrupts.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Completed instructions since the last interrupt was scheduled.
    #[must_use]
    pub const fn completed_since_schedule(&self) -> u32 {
        self.completed_since_schedule
    }

    /// Current execution context.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Returns `true` when scheduling and delivery are enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables scheduling and delivery. The return word keeps
    /// working either way.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Raises an interrupt immediately, independent of the threshold.
    pub const fn request(&mut self) {
        self.pending = true;
    }

    /// Returns `true` when the next step will start with a delivery.
    #[must_use]
    pub const fn delivery_due(&self) -> bool {
        self.enabled && self.pending
    }

    /// Delivers a pending interrupt before the fetch at `pc`.
    ///
    /// Saves `pc`, clears the pending flag, enters the handler context and
    /// returns the handler address. A delivery inside a handler overwrites
    /// the saved address.
    pub fn take_delivery(&mut self, pc: u32) -> Option<u32> {
        if !self.delivery_due() {
            return None;
        }
        self.saved_return_address = pc;
        self.pending = false;
        self.run_state = RunState::HandlerContext;
        Some(self.handler_address)
    }

    /// Counts one completed instruction and schedules an interrupt when the
    /// threshold is reached.
    pub fn on_instruction_completed(&mut self) {
        if !self.enabled || self.threshold == 0 {
            return;
        }
        self.completed_since_schedule = self.completed_since_schedule.saturating_add(1);
        if self.completed_since_schedule >= self.threshold {
            self.completed_since_schedule = 0;
            self.pending = true;
        }
    }

    /// Handles the interrupt-return word: leaves the handler context and
    /// yields the saved address.
    pub fn complete_return(&mut self) -> InterruptReturn {
        let was_active = self.run_state.in_handler();
        self.run_state = RunState::Running;
        InterruptReturn {
            resume_pc: self.saved_return_address,
            was_active,
        }
    }

    /// Clears pending state, the saved address and the schedule counter.
    pub fn reset(&mut self) {
        self.pending = false;
        self.saved_return_address = 0;
        self.completed_since_schedule = 0;
        self.run_state = RunState::Running;
    }
}
