use crate::Fault;

/// Maximum number of return addresses held by the call stack.
pub const STACK_DEPTH: usize = 16;

/// Fixed-capacity return-address stack.
///
/// `sp` counts occupied slots, so `sp == 0` is empty and
/// `sp == STACK_DEPTH` is full. Failed operations leave the stack unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CallStack {
    frames: [u16; STACK_DEPTH],
    sp: usize,
}

impl CallStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    /// Pushes a return address.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::StackOverflow`] when all slots are in use.
    pub fn push(&mut self, addr: u16) -> Result<(), Fault> {
        let slot = self.frames.get_mut(self.sp).ok_or(Fault::StackOverflow)?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pops the most recent return address.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::StackUnderflow`] when the stack is empty.
    pub fn pop(&mut self) -> Result<u16, Fault> {
        let top = self.sp.checked_sub(1).ok_or(Fault::StackUnderflow)?;
        let addr = self.frames.get(top).copied().ok_or(Fault::StackUnderflow)?;
        self.sp = top;
        Ok(addr)
    }

    /// Number of occupied slots.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.sp
    }

    /// Returns `true` when no return address is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Returns `true` when a further push would overflow.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.sp == STACK_DEPTH
    }

    /// Occupied frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[u16] {
        self.frames.get(..self.sp).unwrap_or(&self.frames)
    }
}
