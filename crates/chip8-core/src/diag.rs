//! Host-queryable diagnostics counters.

use crate::{Fault, FaultClass};

/// Last fault observed by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FaultRecord {
    /// The raised fault.
    pub fault: Fault,
    /// `PC` when the fault was raised.
    pub pc: u16,
    /// Value of [`Diagnostics::cycles`] when the fault was raised.
    pub cycle: u64,
}

/// Execution and fault counters.
///
/// Fault counters saturate instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Diagnostics {
    /// Calls to `cycle`, including ones that made no progress.
    pub cycles: u64,
    /// Instructions executed and committed.
    pub instructions_executed: u64,
    /// Timer ticks applied.
    pub timer_ticks: u64,
    /// Rejected program loads.
    pub fault_count_load: u16,
    /// Out-of-bounds fetch or data accesses.
    pub fault_count_memory: u16,
    /// Stack overflows and underflows.
    pub fault_count_stack: u16,
    /// Unknown instruction words, skipped or not.
    pub fault_count_decode: u16,
    /// Most recent fault of any class.
    pub last_fault: Option<FaultRecord>,
    /// Most recent unknown instruction word, with the `PC` it was fetched from.
    pub last_unknown_instruction: Option<FaultRecord>,
}

impl Diagnostics {
    /// Creates zeroed diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault, updating the last fault and its class counter.
    pub fn record_fault(&mut self, fault: Fault, pc: u16) {
        let record = FaultRecord {
            fault,
            pc,
            cycle: self.cycles,
        };
        self.last_fault = Some(record);
        if matches!(fault, Fault::UnknownInstruction { .. }) {
            self.last_unknown_instruction = Some(record);
        }
        let counter = match fault.class() {
            FaultClass::Load => &mut self.fault_count_load,
            FaultClass::Memory => &mut self.fault_count_memory,
            FaultClass::Stack => &mut self.fault_count_stack,
            FaultClass::Decode => &mut self.fault_count_decode,
        };
        *counter = counter.saturating_add(1);
    }

    /// Number of faults recorded across all classes.
    #[must_use]
    pub const fn total_faults(&self) -> u32 {
        self.fault_count_load as u32
            + self.fault_count_memory as u32
            + self.fault_count_stack as u32
            + self.fault_count_decode as u32
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_cycle(&mut self) {
        self.cycles = self.cycles.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_instruction(&mut self) {
        self.instructions_executed = self.instructions_executed.saturating_add(1);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn record_timer_tick(&mut self) {
        self.timer_ticks = self.timer_ticks.saturating_add(1);
    }

    /// Resets every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
