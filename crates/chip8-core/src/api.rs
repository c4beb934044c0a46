//! Public host-facing API contracts for embedding the interpreter core.

use thiserror::Error;

use crate::{
    DisplayBuffer, Fault, Instruction, Memory, RegisterFile, RunState, SpriteEdge, Timers,
    MEMORY_BYTES, STACK_DEPTH,
};

/// Source register for the shift instructions `8xy6` and `8xyE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ShiftSource {
    /// Shift `Vx` in place; `Vy` is ignored.
    #[default]
    Vx,
    /// Shift `Vy` and store the result in `Vx`.
    Vy,
}

/// Behaviour when a fetched word matches no opcode pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UnknownInstructionPolicy {
    /// Treat the word as a no-op, advance `PC` by 2 and report it.
    #[default]
    Skip,
    /// Latch [`Fault::UnknownInstruction`] and halt.
    Halt,
}

/// Behaviour switches for instructions whose semantics differ between
/// historical interpreters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct Quirks {
    /// Operand read by the shift instructions.
    pub shift_source: ShiftSource,
    /// Handling of sprite pixels past the right or bottom edge.
    pub sprite_edge: SpriteEdge,
    /// `Fx55`/`Fx65` leave `I` advanced by `x + 1`.
    pub load_store_increments_i: bool,
    /// `Bnnn` jumps to `nnn + Vx` (x = high nibble of `nnn`) instead of `nnn + V0`.
    pub jump_offset_uses_vx: bool,
    /// `8xy1`/`8xy2`/`8xy3` clear `VF`.
    pub logic_resets_vf: bool,
}

/// Top-level configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Instruction variant switches.
    pub quirks: Quirks,
    /// Unknown-instruction handling.
    pub unknown_instruction: UnknownInstructionPolicy,
    /// Seed for `Cxnn`; `None` draws a seed from OS entropy.
    pub rng_seed: Option<u64>,
    /// Enables trace callback dispatch in [`crate::Machine::cycle_traced`].
    pub tracing_enabled: bool,
}

/// Result of one call to [`crate::Machine::cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// An instruction executed and committed.
    Executed {
        /// Address the instruction was fetched from.
        pc: u16,
        /// The executed instruction.
        instruction: Instruction,
    },
    /// An unknown word was skipped under [`UnknownInstructionPolicy::Skip`].
    UnknownInstruction {
        /// Address of the skipped word.
        pc: u16,
        /// The raw word.
        word: u16,
    },
    /// Still waiting on `Fx0A`; no progress was made.
    WaitingForKey,
    /// A pending `Fx0A` completed with `key` stored in its register.
    KeyReceived {
        /// Index of the newly pressed key.
        key: u8,
    },
    /// A fault was raised this cycle and latched; the machine is now halted.
    Fault {
        /// The raised fault.
        fault: Fault,
        /// Address of the faulting instruction.
        pc: u16,
    },
    /// The machine was already halted; nothing happened.
    Halted(Fault),
}

impl StepOutcome {
    /// Returns `true` when the cycle made architectural progress.
    #[must_use]
    pub const fn made_progress(self) -> bool {
        matches!(
            self,
            Self::Executed { .. } | Self::UnknownInstruction { .. } | Self::KeyReceived { .. }
        )
    }
}

/// Stop conditions for [`crate::Machine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunBoundary {
    /// Run the full cycle budget; cycles after a halt are no-ops.
    CycleBudget,
    /// Stop once the machine is halted.
    Halted,
    /// Stop as soon as a cycle makes no progress on a key wait, or the machine halts.
    WaitingForKey,
}

/// Aggregated outcome of [`crate::Machine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of `cycle` calls performed.
    pub cycles: u32,
    /// Last step-level status, or `None` when the budget was zero.
    pub final_step: Option<StepOutcome>,
}

/// Trace events emitted in execution order when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Word fetched, before decode.
    InstructionStart {
        /// Fetch address.
        pc: u16,
        /// Raw instruction word.
        word: u16,
    },
    /// Instruction committed.
    InstructionRetired {
        /// Fetch address of the retired instruction.
        pc: u16,
        /// The retired instruction.
        instruction: Instruction,
    },
    /// `Dxyn` drew a sprite.
    SpriteDrawn {
        /// Column operand before wrapping.
        x: u8,
        /// Row operand before wrapping.
        y: u8,
        /// Sprite height.
        rows: u8,
        /// Whether any pixel was turned off.
        collision: bool,
    },
    /// A fault was raised, including skipped unknown instructions.
    FaultRaised {
        /// The raised fault.
        fault: Fault,
        /// Address active when the fault was observed.
        pc: u16,
    },
    /// A pending key wait completed.
    KeyWaitSatisfied {
        /// Key stored in the destination register.
        key: u8,
    },
}

/// Sink trait for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Stable snapshot schema identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts a stored value to a known version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Full machine state for save/restore and replay fixtures.
///
/// The random generator state is not captured; restored machines continue
/// from their own generator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineSnapshot {
    /// Schema version.
    pub version: SnapshotVersion,
    /// Registers, `I`, `PC` and call stack.
    pub registers: RegisterFile,
    /// Delay and sound timers.
    pub timers: Timers,
    /// 4 KiB memory image.
    pub memory: Memory,
    /// Framebuffer contents.
    pub display: DisplayBuffer,
    /// Execution state.
    pub run_state: RunState,
}

/// Reasons a snapshot cannot be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SnapshotError {
    /// The memory image is not exactly 4096 bytes.
    #[error("snapshot memory is {len} bytes, expected {expected}", expected = MEMORY_BYTES)]
    InvalidMemoryLength {
        /// Length found in the snapshot.
        len: usize,
    },
    /// The call stack claims more frames than it can hold.
    #[error("snapshot stack depth is {depth}, maximum {max}", max = STACK_DEPTH)]
    InvalidStackDepth {
        /// Depth found in the snapshot.
        depth: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        MachineConfig, Quirks, ShiftSource, SnapshotError, SnapshotVersion, StepOutcome,
        TraceEvent, TraceSink, UnknownInstructionPolicy,
    };
    use crate::{Fault, Instruction, SpriteEdge};

    #[test]
    fn default_config_uses_common_interpreter_behaviour() {
        let config = MachineConfig::default();

        assert_eq!(config.quirks.shift_source, ShiftSource::Vx);
        assert_eq!(config.quirks.sprite_edge, SpriteEdge::Wrap);
        assert!(!config.quirks.load_store_increments_i);
        assert!(!config.quirks.jump_offset_uses_vx);
        assert!(!config.quirks.logic_resets_vf);
        assert_eq!(config.unknown_instruction, UnknownInstructionPolicy::Skip);
        assert_eq!(config.rng_seed, None);
        assert!(!config.tracing_enabled);
        assert_eq!(config.quirks, Quirks::default());
    }

    #[test]
    fn snapshot_version_roundtrip_is_stable() {
        assert_eq!(SnapshotVersion::from_u16(1), Some(SnapshotVersion::V1));
        assert_eq!(SnapshotVersion::from_u16(2), None);
    }

    #[test]
    fn progress_classification() {
        assert!(StepOutcome::Executed {
            pc: 0x200,
            instruction: Instruction::Cls
        }
        .made_progress());
        assert!(StepOutcome::KeyReceived { key: 1 }.made_progress());
        assert!(!StepOutcome::WaitingForKey.made_progress());
        assert!(!StepOutcome::Halted(Fault::StackUnderflow).made_progress());
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<TraceEvent> = Vec::new();
        sink.on_event(TraceEvent::KeyWaitSatisfied { key: 1 });
        sink.on_event(TraceEvent::KeyWaitSatisfied { key: 2 });
        assert_eq!(
            sink,
            vec![
                TraceEvent::KeyWaitSatisfied { key: 1 },
                TraceEvent::KeyWaitSatisfied { key: 2 }
            ]
        );
    }

    #[test]
    fn snapshot_error_message_names_expected_size() {
        assert_eq!(
            SnapshotError::InvalidMemoryLength { len: 12 }.to_string(),
            "snapshot memory is 12 bytes, expected 4096"
        );
        assert_eq!(
            SnapshotError::InvalidStackDepth { depth: 17 }.to_string(),
            "snapshot stack depth is 17, maximum 16"
        );
    }
}
