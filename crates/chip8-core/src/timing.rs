//! Fixed-step pacing of CPU cycles and 60 Hz timer ticks.
//!
//! [`FixedStepClock`] converts elapsed host time into whole cycle and timer
//! tick counts, carrying the fractional remainder forward so no time is lost
//! across frames. [`run_frame`] then interleaves them on one machine.

use std::time::Duration;

use crate::{Keypad, Machine, StepOutcome, TIMER_HZ};

/// Default CPU rate in instructions per second.
pub const DEFAULT_CYCLES_PER_SECOND: u32 = 500;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Host-side rate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Pacing {
    /// CPU cycles per second.
    pub cycles_per_second: u32,
    /// Timer ticks per second.
    pub timer_hz: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
            timer_hz: TIMER_HZ,
        }
    }
}

impl Pacing {
    /// Creates a clock running at these rates.
    #[must_use]
    pub const fn clock(self) -> FixedStepClock {
        FixedStepClock::new(self)
    }
}

/// Work due for one slice of host time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClockTicks {
    /// CPU cycles to run.
    pub cycles: u32,
    /// Timer ticks to apply.
    pub timer_ticks: u32,
}

/// Accumulator turning elapsed time into whole cycles and timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStepClock {
    pacing: Pacing,
    cycle_phase: u128,
    timer_phase: u128,
}

impl FixedStepClock {
    /// Creates a clock with no accumulated time.
    #[must_use]
    pub const fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            cycle_phase: 0,
            timer_phase: 0,
        }
    }

    /// Rates this clock runs at.
    #[must_use]
    pub const fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Adds `elapsed` host time and returns the whole steps now due.
    pub fn advance(&mut self, elapsed: Duration) -> ClockTicks {
        let nanos = elapsed.as_nanos();
        ClockTicks {
            cycles: take_steps(&mut self.cycle_phase, nanos, self.pacing.cycles_per_second),
            timer_ticks: take_steps(&mut self.timer_phase, nanos, self.pacing.timer_hz),
        }
    }

    /// Discards any accumulated fractional time.
    pub fn reset(&mut self) {
        self.cycle_phase = 0;
        self.timer_phase = 0;
    }
}

fn take_steps(phase: &mut u128, nanos: u128, rate: u32) -> u32 {
    *phase += nanos * u128::from(rate);
    let steps = *phase / NANOS_PER_SECOND;
    *phase %= NANOS_PER_SECOND;
    u32::try_from(steps).unwrap_or(u32::MAX)
}

/// What happened while running one host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameReport {
    /// Cycles actually run; fewer than requested once the machine halts.
    pub cycles: u32,
    /// Timer ticks applied.
    pub timer_ticks: u32,
    /// Outcome of the last cycle run.
    pub last_step: Option<StepOutcome>,
}

/// Runs `ticks.cycles` cycles with timer ticks spread evenly between them.
///
/// Cycling stops early if the machine halts; all due timer ticks are still
/// applied.
pub fn run_frame(machine: &mut Machine, keys: &Keypad, ticks: ClockTicks) -> FrameReport {
    let mut report = FrameReport::default();
    let total_cycles = u64::from(ticks.cycles);
    let total_ticks = u64::from(ticks.timer_ticks);
    let mut ticked = 0_u64;

    for done in 1..=total_cycles {
        let step = machine.cycle(keys);
        report.cycles += 1;
        report.last_step = Some(step);

        let due = done * total_ticks / total_cycles;
        while ticked < due {
            machine.tick_timers();
            ticked += 1;
        }

        if matches!(step, StepOutcome::Fault { .. } | StepOutcome::Halted(_)) {
            break;
        }
    }

    while ticked < total_ticks {
        machine.tick_timers();
        ticked += 1;
    }
    report.timer_ticks = ticks.timer_ticks;
    report
}
