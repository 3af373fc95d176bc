//! Text rendering of VRAM, registers and trace lines, plus the host sinks the
//! runner plugs into the core.

use std::fmt::Write as _;
use std::io::Write as _;

use log::warn;
use rv32_core::{
    disassemble, BusState, Cpu, OutputSink, Register, TraceEvent, TraceSink, ADDRESS_SPACE_BYTES,
    FIXED_MEMORY_REGIONS,
};

/// Characters per line in the VRAM text view.
pub const DEFAULT_DISPLAY_WIDTH: usize = 54;

/// Glyph for non-printable, non-zero bytes.
pub const PLACEHOLDER: char = '?';

/// Text shown for a VRAM with no content.
pub const EMPTY_VRAM: &str = "[VRAM empty]";

const fn glyph(byte: u8) -> char {
    match byte {
        0 => '.',
        0x20..=0x7E => byte as char,
        _ => PLACEHOLDER,
    }
}

/// Renders every byte: zero as `.`, printable ASCII as itself, anything
/// else as [`PLACEHOLDER`].
#[must_use]
pub fn render_vram(bytes: &[u8]) -> String {
    bytes.iter().copied().map(glyph).collect()
}

/// Renders VRAM content as wrapped text.
///
/// Trailing zero bytes are dropped, a newline byte starts a new line and
/// lines wrap at `width` characters.
#[must_use]
pub fn render_vram_text(bytes: &[u8], width: usize) -> String {
    let used = bytes.iter().rposition(|b| *b != 0).map_or(0, |last| last + 1);
    if used == 0 {
        return EMPTY_VRAM.to_owned();
    }

    let width = width.max(1);
    let mut out = String::with_capacity(used + used / width);
    let mut column = 0;
    for &byte in &bytes[..used] {
        if byte == b'\n' {
            out.push('\n');
            column = 0;
            continue;
        }
        if column == width {
            out.push('\n');
            column = 0;
        }
        out.push(glyph(byte));
        column += 1;
    }
    out
}

/// Lists the pc and every non-zero register with its ABI name, in signed and
/// hex form.
#[must_use]
pub fn render_registers(cpu: &Cpu) -> String {
    let mut out = format!("pc   = {:#010x}\n", cpu.pc());
    for reg in Register::all().filter(|reg| cpu.register(*reg) != 0) {
        let label = format!("{reg} ({})", reg.abi_name());
        let _ = writeln!(
            out,
            "{label:<10} = {:>11} ({:#010x})",
            cpu.register(reg),
            cpu.arch().gpr_u32(reg)
        );
    }
    out
}

/// The fixed region map with the total store size.
#[must_use]
pub fn render_memory_map() -> String {
    let mut out = format!("size {} KiB\n", ADDRESS_SPACE_BYTES / 1024);
    for descriptor in FIXED_MEMORY_REGIONS {
        let _ = writeln!(
            out,
            "{:<10} {:#07x} - {:#07x}",
            descriptor.region.name(),
            descriptor.start,
            descriptor.end
        );
    }
    out
}

/// Address, data and control lines of the last bus transaction.
#[must_use]
pub fn render_bus_state(state: &BusState) -> String {
    format!(
        "address = {:#010x}\ndata    = {:#010x}\ncontrol = {}\n",
        state.address, state.data, state.control
    )
}

/// One trace line: pc, raw word and disassembly.
#[must_use]
pub fn render_trace_line(pc: u32, word: u32) -> String {
    format!("{pc:#010x}: {word:08x}  {}", disassemble(word))
}

/// Serial output written straight to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_byte(&mut self, byte: u8) {
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = stdout.write_all(&[byte]).and_then(|()| stdout.flush()) {
            warn!("serial output lost: {err}");
        }
    }
}

/// Trace sink printing one line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTrace;

impl TraceSink for StderrTrace {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::InstructionStart { pc, word } => {
                eprintln!("{}", render_trace_line(pc, word));
            }
            TraceEvent::InterruptEntered {
                saved_return_address,
                handler,
            } => eprintln!("-- interrupt: {saved_return_address:#010x} -> {handler:#010x}"),
            TraceEvent::InterruptReturned { resume_pc } => {
                eprintln!("-- return to {resume_pc:#010x}");
            }
            TraceEvent::InstructionRetired { .. } => {}
        }
    }
}
