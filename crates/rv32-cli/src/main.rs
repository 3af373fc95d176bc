//! `rv32-run`: loads a program, steps the core and shows VRAM and registers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;
use rv32_cli::{
    parse_address, render_bus_state, render_memory_map, render_registers, render_vram_text,
    run_with_display, CliError, Program, RunConfig, StderrTrace, StdoutSink,
    DEFAULT_DISPLAY_WIDTH,
};
use rv32_core::{Bus, Cpu, MemoryRegion, StopReason};
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw little-endian program image; the built-in demo runs when omitted
    #[arg(short, long)]
    program: Option<PathBuf>,

    /// Load address of the program image
    #[arg(long, default_value = "0", value_parser = parse_address)]
    base: u32,

    /// Step budget (default 200)
    #[arg(long)]
    max_steps: Option<u64>,

    /// Show VRAM every N steps; 0 shows only the final state (default 10)
    #[arg(long)]
    display_every: Option<u64>,

    /// Completed instructions between periodic interrupts; 0 disables them
    #[arg(long)]
    interrupt_threshold: Option<u32>,

    /// Disable periodic interrupt delivery
    #[arg(long)]
    no_interrupts: bool,

    /// Print every executed instruction to stderr
    #[arg(long)]
    trace: bool,

    /// Print the memory map before running
    #[arg(long)]
    memory_map: bool,

    /// JSON configuration applied before the flags above
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn run_config(&self) -> Result<RunConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(display_every) = self.display_every {
            config.display_every = display_every;
        }
        if let Some(threshold) = self.interrupt_threshold {
            config.core.interrupt_threshold = threshold;
        }
        if self.no_interrupts {
            config.core.interrupts_enabled = false;
        }
        config.core.tracing_enabled |= self.trace;
        Ok(config)
    }

    fn program(&self) -> Result<Program, CliError> {
        self.program.as_deref().map_or_else(
            || Ok(Program::demo()),
            |path| Program::from_file(self.base, path),
        )
    }
}

fn show_vram(cpu: &Cpu, heading: &str) {
    println!("\n=== VRAM {heading} ===");
    println!(
        "{}",
        render_vram_text(
            cpu.bus().region_bytes(MemoryRegion::Vram),
            DEFAULT_DISPLAY_WIDTH
        )
    );
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = args.run_config()?;
    let program = args.program()?;
    if args.memory_map {
        println!("=== Memory map ===");
        print!("{}", render_memory_map());
    }

    let mut bus = Bus::new(Box::new(StdoutSink));
    let handler = config
        .core
        .interrupts_enabled
        .then_some(config.core.interrupt_handler);
    program.install(&mut bus, handler)?;

    let mut cpu = Cpu::with_config(bus, config.core);
    cpu.set_pc(program.base());
    if config.core.tracing_enabled {
        cpu.set_trace_sink(Box::new(StderrTrace));
    }
    info!(
        "running {} words from {:#07x}, at most {} steps",
        program.words().len(),
        program.base(),
        config.max_steps
    );

    let outcome = run_with_display(
        &mut cpu,
        config.max_steps,
        config.display_every,
        |cpu, steps| show_vram(cpu, &format!("after {steps} steps")),
    );

    show_vram(&cpu, "final");
    println!("\n=== Registers ===");
    print!("{}", render_registers(&cpu));
    println!("\n=== Bus ===");
    print!("{}", render_bus_state(&cpu.bus().state()));

    let counters = cpu.diagnostics();
    println!("\nInstructions executed: {}", counters.instruction_count);
    println!(
        "Interrupts: {} delivered, {} returned",
        counters.interrupt_count, counters.interrupt_return_count
    );
    if counters.total_faults() > 0 {
        println!("Faults reported: {}", counters.total_faults());
    }
    match outcome.reason {
        StopReason::Halted => println!("Halted after {} steps", outcome.steps),
        StopReason::StepLimit => println!("Step limit of {} reached", config.max_steps),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
