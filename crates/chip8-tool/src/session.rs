//! Headless run and disassembly sessions over a ROM image.

use std::fmt::Write as _;
use std::time::Duration;

use chip8_core::{
    disassemble, run_frame, Diagnostics, DisplayBuffer, FaultRecord, Keypad, Machine,
    PROGRAM_START, TIMER_HZ,
};
use log::{debug, info};

use crate::args::RunArgs;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Final state of a headless run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Frames actually run.
    pub frames: u32,
    /// Framebuffer after the last frame.
    pub display: DisplayBuffer,
    /// Machine counters.
    pub diagnostics: Diagnostics,
    /// The latched fault and where it was raised, if the machine halted.
    pub halt: Option<FaultRecord>,
    /// Whether the sound timer was still running.
    pub beeping: bool,
}

impl RunReport {
    /// Text rendering of the screen followed by a counter summary.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.display.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        let diag = &self.diagnostics;
        let _ = writeln!(out, "frames: {}", self.frames);
        let _ = writeln!(out, "cycles: {}", diag.cycles);
        let _ = writeln!(out, "instructions: {}", diag.instructions_executed);
        let _ = writeln!(out, "timer ticks: {}", diag.timer_ticks);
        let _ = writeln!(out, "faults: {}", diag.total_faults());
        if let Some(unknown) = diag.last_unknown_instruction {
            let _ = writeln!(out, "last unknown: {} at {:#06X}", unknown.fault, unknown.pc);
        }
        let _ = writeln!(out, "sound: {}", if self.beeping { "on" } else { "off" });
        out
    }
}

/// Runs `rom` for `args.frames` host frames of 1/60 s each.
///
/// Time is simulated: frames run back to back without sleeping.
///
/// # Errors
///
/// Returns a message when the ROM does not fit in the program area.
pub fn run_rom(rom: &[u8], args: &RunArgs) -> Result<RunReport, String> {
    let mut machine = Machine::new(args.machine_config());
    machine
        .load(rom)
        .map_err(|fault| format!("failed to load program: {fault}"))?;
    machine.reset();
    info!(
        "running {} byte program for {} frames at {} Hz",
        rom.len(),
        args.frames,
        args.cycles_per_second
    );

    let mut clock = args.pacing().clock();
    // Rounded up so every frame carries at least one timer tick.
    let frame = Duration::from_nanos(NANOS_PER_SECOND.div_ceil(u64::from(TIMER_HZ)));
    let held = Keypad::from_mask(args.held_keys);
    let mut frames = 0;

    while frames < args.frames && machine.halt_reason().is_none() {
        let keys = if frames == 0 { Keypad::new() } else { held };
        let report = run_frame(&mut machine, &keys, clock.advance(frame));
        debug!(
            "frame {frames}: {} cycles, {} timer ticks",
            report.cycles, report.timer_ticks
        );
        frames += 1;
    }

    let diagnostics = *machine.diagnostics();
    Ok(RunReport {
        frames,
        display: machine.display().clone(),
        diagnostics,
        halt: machine.halt_reason().and(diagnostics.last_fault),
        beeping: machine.is_beeping(),
    })
}

/// Disassembly listing of `rom` as loaded at the program start address.
#[must_use]
pub fn disassembly_listing(rom: &[u8]) -> String {
    disassemble(rom, PROGRAM_START)
        .iter()
        .fold(String::new(), |mut out, row| {
            let _ = writeln!(out, "{row}");
            out
        })
}
