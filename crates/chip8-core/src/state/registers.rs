use crate::memory::PROGRAM_START;
use crate::{CallStack, Fault};

/// Number of general-purpose registers (`V0..VF`).
pub const GENERAL_REGISTER_COUNT: usize = 16;

/// General-purpose register identifier.
///
/// `VF` doubles as the carry, borrow and collision flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    V0 = 0x0,
    V1 = 0x1,
    V2 = 0x2,
    V3 = 0x3,
    V4 = 0x4,
    V5 = 0x5,
    V6 = 0x6,
    V7 = 0x7,
    V8 = 0x8,
    V9 = 0x9,
    VA = 0xA,
    VB = 0xB,
    VC = 0xC,
    VD = 0xD,
    VE = 0xE,
    VF = 0xF,
}

impl Register {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::V0,
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V7,
        Self::V8,
        Self::V9,
        Self::VA,
        Self::VB,
        Self::VC,
        Self::VD,
        Self::VE,
        Self::VF,
    ];

    /// Returns the array index for this register (`0..=15`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the 4-bit encoding of this register.
    #[must_use]
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Decodes the low nibble of `bits` into a register.
    #[must_use]
    pub const fn from_nibble(bits: u8) -> Self {
        Self::ALL[(bits & 0x0F) as usize]
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{:X}", self.nibble())
    }
}

/// Register file: `V0..VF`, the index register `I`, `PC` and the call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    v: [u8; GENERAL_REGISTER_COUNT],
    i: u16,
    pc: u16,
    stack: CallStack,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            v: [0; GENERAL_REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            stack: CallStack::new(),
        }
    }
}

impl RegisterFile {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn v(&self, reg: Register) -> u8 {
        self.v[reg.index()]
    }

    /// Writes a general-purpose register.
    pub const fn set_v(&mut self, reg: Register, value: u8) {
        self.v[reg.index()] = value;
    }

    /// Writes `VF` as a 0/1 flag.
    pub const fn set_flag(&mut self, flag: bool) {
        self.v[Register::VF.index()] = flag as u8;
    }

    /// All general-purpose registers, `V0` first.
    #[must_use]
    pub const fn general(&self) -> &[u8; GENERAL_REGISTER_COUNT] {
        &self.v
    }

    /// Reads the index register.
    #[must_use]
    pub const fn i(&self) -> u16 {
        self.i
    }

    /// Writes the index register.
    pub const fn set_i(&mut self, value: u16) {
        self.i = value;
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Advances the program counter by one instruction width.
    pub const fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(crate::memory::INSTRUCTION_BYTES);
    }

    /// Pushes a return address onto the call stack.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::StackOverflow`] when the stack is full.
    pub fn push(&mut self, addr: u16) -> Result<(), Fault> {
        self.stack.push(addr)
    }

    /// Pops a return address from the call stack.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::StackUnderflow`] when the stack is empty.
    pub fn pop(&mut self) -> Result<u16, Fault> {
        self.stack.pop()
    }

    /// Read-only view of the call stack.
    #[must_use]
    pub const fn stack(&self) -> &CallStack {
        &self.stack
    }
}
