use crate::{Fault, Keypad, Register};

/// Execution-state machine for host-observable core control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to fetch the next instruction.
    #[default]
    Ready,
    /// Suspended on `LD Vx, K` until a key transitions to pressed.
    WaitingForKey {
        /// Register receiving the pressed key index.
        dest: Register,
        /// Key state observed on the previous cycle; a key counts as newly
        /// pressed only when it was released here.
        last_seen: Keypad,
    },
    /// A machine-fatal fault latched; no progress until reset.
    Halted(Fault),
}

impl RunState {
    /// Returns the latched fault, if this state is halted.
    #[must_use]
    pub const fn halt_reason(self) -> Option<Fault> {
        match self {
            Self::Halted(fault) => Some(fault),
            Self::Ready | Self::WaitingForKey { .. } => None,
        }
    }

    /// Returns `true` while suspended on a key wait.
    #[must_use]
    pub const fn is_waiting_for_key(self) -> bool {
        matches!(self, Self::WaitingForKey { .. })
    }
}
