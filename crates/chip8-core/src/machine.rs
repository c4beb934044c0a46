//! The interpreter aggregate: memory, registers, display, timers and run state.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::execute::step_one;
use crate::{
    Diagnostics, DisplayBuffer, Fault, Keypad, MachineConfig, MachineSnapshot, Memory,
    RegisterFile, RunBoundary, RunOutcome, RunState, SnapshotError, SnapshotVersion,
    StepOutcome, Timers, TraceEvent, TraceSink, MEMORY_BYTES, STACK_DEPTH,
};

/// Sink used when tracing is disabled.
struct NoTrace;

impl TraceSink for NoTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// A complete CHIP-8 machine.
///
/// The host loads a program, calls [`Machine::cycle`] at the configured CPU
/// rate and [`Machine::tick_timers`] at 60 Hz, and reads [`Machine::display`]
/// once per frame.
#[derive(Debug, Clone)]
pub struct Machine {
    pub(crate) config: MachineConfig,
    pub(crate) memory: Memory,
    pub(crate) registers: RegisterFile,
    pub(crate) display: DisplayBuffer,
    pub(crate) timers: Timers,
    pub(crate) run_state: RunState,
    pub(crate) rng: StdRng,
    pub(crate) diagnostics: Diagnostics,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    /// Creates a machine with empty program memory and the font installed.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        let rng = seeded_rng(config.rng_seed);
        Self {
            config,
            memory: Memory::new(),
            registers: RegisterFile::default(),
            display: DisplayBuffer::new(),
            timers: Timers::new(),
            run_state: RunState::Ready,
            rng,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Copies `program` into memory at `0x200`, zero-filling the rest of the
    /// program area.
    ///
    /// Registers, timers, display, run state and diagnostics are untouched;
    /// call [`Machine::reset`] to start the program from power-on state.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidProgramLength`] when `program` exceeds 3584
    /// bytes. The machine is left unmodified apart from the rejected-load
    /// counter in [`Machine::diagnostics`].
    pub fn load(&mut self, program: &[u8]) -> Result<(), Fault> {
        if let Err(fault) = self.memory.load(program) {
            debug!("rejected program load: {fault}");
            self.diagnostics.record_fault(fault, self.registers.pc());
            return Err(fault);
        }
        debug!("loaded {} byte program", program.len());
        Ok(())
    }

    /// Restores power-on state while keeping the memory image.
    ///
    /// Registers, stack, timers and display are cleared, `PC` returns to
    /// `0x200`, any latched fault is cleared and the font glyphs are
    /// reinstalled. A configured RNG seed is reapplied.
    pub fn reset(&mut self) {
        self.memory.install_font();
        self.registers = RegisterFile::default();
        self.display.clear();
        self.timers = Timers::new();
        self.run_state = RunState::Ready;
        self.diagnostics.reset();
        if self.config.rng_seed.is_some() {
            self.rng = seeded_rng(self.config.rng_seed);
        }
        debug!("machine reset");
    }

    /// Runs one cycle with the given key snapshot.
    pub fn cycle(&mut self, keys: &Keypad) -> StepOutcome {
        step_one(self, *keys, &mut NoTrace)
    }

    /// Runs one cycle, reporting trace events to `sink` when tracing is
    /// enabled in the configuration.
    pub fn cycle_traced(&mut self, keys: &Keypad, sink: &mut dyn TraceSink) -> StepOutcome {
        if self.config.tracing_enabled {
            step_one(self, *keys, sink)
        } else {
            step_one(self, *keys, &mut NoTrace)
        }
    }

    /// Decrements the delay and sound timers once.
    pub fn tick_timers(&mut self) {
        self.timers.tick();
        self.diagnostics.record_timer_tick();
    }

    /// Cycles until `boundary` is reached or `max_cycles` have run.
    pub fn run(&mut self, keys: &Keypad, max_cycles: u32, boundary: RunBoundary) -> RunOutcome {
        let mut outcome = RunOutcome {
            cycles: 0,
            final_step: None,
        };

        while outcome.cycles < max_cycles {
            let step = self.cycle(keys);
            outcome.cycles += 1;
            outcome.final_step = Some(step);

            let stop = match (boundary, step) {
                (RunBoundary::CycleBudget, _) => false,
                (_, StepOutcome::Fault { .. } | StepOutcome::Halted(_)) => true,
                (RunBoundary::WaitingForKey, StepOutcome::WaitingForKey) => true,
                _ => false,
            };
            if stop {
                break;
            }
        }

        outcome
    }

    /// Configuration this machine was built with.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Memory image.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Framebuffer.
    #[must_use]
    pub const fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    /// Delay and sound timers.
    #[must_use]
    pub const fn timers(&self) -> Timers {
        self.timers
    }

    /// Current execution state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Latched machine-fatal fault, if halted.
    #[must_use]
    pub const fn halt_reason(&self) -> Option<Fault> {
        self.run_state.halt_reason()
    }

    /// Execution and fault counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns `true` while the sound timer is nonzero.
    #[must_use]
    pub const fn is_beeping(&self) -> bool {
        self.timers.is_sound_active()
    }

    /// Mutable access to registers for host tooling and tests.
    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Mutable access to timers for host tooling and tests.
    pub const fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    /// Captures the full architectural state.
    #[must_use]
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            version: SnapshotVersion::V1,
            registers: self.registers.clone(),
            timers: self.timers,
            memory: self.memory.clone(),
            display: self.display.clone(),
            run_state: self.run_state,
        }
    }

    /// Replaces the architectural state with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidMemoryLength`] when the memory image is
    /// not 4096 bytes and [`SnapshotError::InvalidStackDepth`] when the call
    /// stack holds more than 16 frames; the machine is left unmodified.
    pub fn restore(&mut self, snapshot: MachineSnapshot) -> Result<(), SnapshotError> {
        let len = snapshot.memory.as_bytes().len();
        if len != MEMORY_BYTES {
            return Err(SnapshotError::InvalidMemoryLength { len });
        }
        let depth = snapshot.registers.stack().depth();
        if depth > STACK_DEPTH {
            return Err(SnapshotError::InvalidStackDepth { depth });
        }

        self.registers = snapshot.registers;
        self.timers = snapshot.timers;
        self.memory = snapshot.memory;
        self.display = snapshot.display;
        self.run_state = snapshot.run_state;
        Ok(())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}
