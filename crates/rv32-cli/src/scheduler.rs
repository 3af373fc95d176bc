//! Bounded run loop with periodic display callbacks.

use rv32_core::{Cpu, RunOutcome, StopReason};

/// Runs `cpu` for at most `max_steps` steps, calling `on_display` with the
/// total step count after every `display_every` steps.
///
/// `display_every == 0` disables the periodic callback. The final state is
/// left to the caller.
pub fn run_with_display<F>(
    cpu: &mut Cpu,
    max_steps: u64,
    display_every: u64,
    mut on_display: F,
) -> RunOutcome
where
    F: FnMut(&Cpu, u64),
{
    let chunk = if display_every == 0 {
        max_steps
    } else {
        display_every
    };
    let mut steps = 0;

    loop {
        let outcome = cpu.run(chunk.min(max_steps - steps));
        steps += outcome.steps;

        if outcome.reason == StopReason::Halted {
            return RunOutcome {
                steps,
                reason: StopReason::Halted,
            };
        }
        if display_every != 0 && outcome.steps > 0 {
            on_display(cpu, steps);
        }
        if steps >= max_steps {
            return RunOutcome {
                steps,
                reason: StopReason::StepLimit,
            };
        }
    }
}
