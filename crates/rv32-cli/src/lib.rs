//! Program source, presentation and scheduling around the RV32I core.
//!
//! The `rv32-run` binary wires these pieces together; they are exposed as a
//! library so embedders and tests can reuse them.

/// Run configuration and address parsing.
pub mod config;
/// VRAM, register and trace rendering.
pub mod display;
/// Runner error type.
pub mod error;
/// Program images and the demo program.
pub mod program;
/// Bounded run loop.
pub mod scheduler;

pub use config::{parse_address, RunConfig, DEFAULT_DISPLAY_EVERY, DEFAULT_MAX_STEPS};
pub use display::{
    render_bus_state, render_memory_map, render_registers, render_trace_line, render_vram,
    render_vram_text, StderrTrace, StdoutSink, DEFAULT_DISPLAY_WIDTH,
};
pub use error::CliError;
pub use program::{Program, DEMO_OUTPUT};
pub use scheduler::run_with_display;

use clap as _;
use env_logger as _;
