/// Execution context of the core with respect to interrupt diversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Executing the interrupted program.
    #[default]
    Running,
    /// Diverted into the interrupt handler; a return address is saved.
    HandlerContext,
}

impl RunState {
    /// Returns `true` while an interrupt diversion is active.
    #[must_use]
    pub const fn in_handler(self) -> bool {
        matches!(self, Self::HandlerContext)
    }
}
