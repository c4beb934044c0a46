//! `VF` update behaviours for the arithmetic and logic instructions.

use crate::RegisterFile;

/// Describes how `VF` should be updated after an ALU instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// `VF` unchanged.
    #[default]
    None,
    /// `VF` set to 1 or 0.
    Set(bool),
}

impl FlagsUpdate {
    /// Writes `VF`; called after the destination register so the flag wins
    /// when the destination is `VF`.
    pub const fn apply(self, registers: &mut RegisterFile) {
        if let Self::Set(flag) = self {
            registers.set_flag(flag);
        }
    }
}
