use thiserror::Error;

use crate::memory::MAX_PROGRAM_BYTES;

/// Fault classes used for diagnostics aggregation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Program image rejected at load time.
    Load,
    /// Fetch or data access outside the 4 KiB address space.
    Memory,
    /// Call stack depth violation.
    Stack,
    /// Instruction word matched no known encoding.
    Decode,
}

/// Stable numeric fault identifiers, independent of the fault payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// See [`Fault::OutOfBoundsAccess`].
    OutOfBoundsAccess = 0x01,
    /// See [`Fault::StackOverflow`].
    StackOverflow = 0x02,
    /// See [`Fault::StackUnderflow`].
    StackUnderflow = 0x03,
    /// See [`Fault::UnknownInstruction`].
    UnknownInstruction = 0x04,
    /// See [`Fault::InvalidProgramLength`].
    InvalidProgramLength = 0x05,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::OutOfBoundsAccess),
            0x02 => Some(Self::StackOverflow),
            0x03 => Some(Self::StackUnderflow),
            0x04 => Some(Self::UnknownInstruction),
            0x05 => Some(Self::InvalidProgramLength),
            _ => None,
        }
    }

    /// Returns the diagnostics fault class for this code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::OutOfBoundsAccess => FaultClass::Memory,
            Self::StackOverflow | Self::StackUnderflow => FaultClass::Stack,
            Self::UnknownInstruction => FaultClass::Decode,
            Self::InvalidProgramLength => FaultClass::Load,
        }
    }
}

/// Every error condition the machine can raise.
///
/// Load-time faults are returned synchronously from [`crate::Machine::load`].
/// Execution faults are reported through [`crate::StepOutcome::Fault`] and,
/// when machine-fatal, latched in [`crate::RunState::Halted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Fetch or data access resolved to an address at or above 4096.
    #[error("memory access out of bounds at {addr:#06X}")]
    OutOfBoundsAccess {
        /// First address that fell outside the address space.
        addr: u16,
    },
    /// `CALL` executed with all 16 stack slots in use.
    #[error("call stack overflow")]
    StackOverflow,
    /// `RET` executed with an empty call stack.
    #[error("call stack underflow")]
    StackUnderflow,
    /// Instruction word matched no known encoding.
    #[error("unknown instruction {word:#06X}")]
    UnknownInstruction {
        /// Raw 16-bit instruction word.
        word: u16,
    },
    /// Program image does not fit between 0x200 and 0xFFF.
    #[error("program of {len} bytes exceeds the {max} byte program area", max = MAX_PROGRAM_BYTES)]
    InvalidProgramLength {
        /// Rejected program length in bytes.
        len: usize,
    },
}

impl Fault {
    /// Returns the payload-free stable code for this fault.
    #[must_use]
    pub const fn code(self) -> FaultCode {
        match self {
            Self::OutOfBoundsAccess { .. } => FaultCode::OutOfBoundsAccess,
            Self::StackOverflow => FaultCode::StackOverflow,
            Self::StackUnderflow => FaultCode::StackUnderflow,
            Self::UnknownInstruction { .. } => FaultCode::UnknownInstruction,
            Self::InvalidProgramLength { .. } => FaultCode::InvalidProgramLength,
        }
    }

    /// Returns the diagnostics fault class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        self.code().class()
    }

    /// Faults that halt the machine when raised during execution.
    ///
    /// Unknown instructions are governed by
    /// [`crate::UnknownInstructionPolicy`] instead; load faults never reach
    /// the execution pipeline.
    #[must_use]
    pub const fn is_machine_fatal(self) -> bool {
        matches!(
            self,
            Self::OutOfBoundsAccess { .. } | Self::StackOverflow | Self::StackUnderflow
        )
    }
}
