//! Lock-wrapped machine for hosts that drive cycles and timers from
//! separate threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{DisplayBuffer, Machine, SharedKeypad, StepOutcome};

/// A [`Machine`] behind one exclusive lock, plus a lock-free keypad.
///
/// Each [`SharedMachine::cycle`] and [`SharedMachine::tick_timers`] holds the
/// lock for exactly one cycle or tick, so no reader ever observes a
/// partially executed instruction or a half-drawn sprite.
#[derive(Debug, Clone)]
pub struct SharedMachine {
    machine: Arc<Mutex<Machine>>,
    keypad: Arc<SharedKeypad>,
}

impl SharedMachine {
    /// Wraps `machine` for shared use.
    #[must_use]
    pub fn new(machine: Machine) -> Self {
        Self {
            machine: Arc::new(Mutex::new(machine)),
            keypad: Arc::new(SharedKeypad::new()),
        }
    }

    /// Keypad written by the host's input thread.
    #[must_use]
    pub fn keypad(&self) -> &SharedKeypad {
        &self.keypad
    }

    /// Runs one cycle against the current keypad snapshot.
    pub fn cycle(&self) -> StepOutcome {
        let keys = self.keypad.snapshot();
        self.lock().cycle(&keys)
    }

    /// Applies one timer tick.
    pub fn tick_timers(&self) {
        self.lock().tick_timers();
    }

    /// Reads the framebuffer under the lock.
    pub fn with_display<R>(&self, read: impl FnOnce(&DisplayBuffer) -> R) -> R {
        read(self.lock().display())
    }

    /// Runs `f` with exclusive access to the machine.
    pub fn with_machine<R>(&self, f: impl FnOnce(&mut Machine) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
