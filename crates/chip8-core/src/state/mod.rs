//! Architectural CPU state model primitives.

/// Register file types and storage model.
pub mod registers;
/// Execution-state machine for host-observable control flow.
pub mod run_state;
/// Bounded call stack.
pub mod stack;

pub use registers::{Register, RegisterFile, GENERAL_REGISTER_COUNT};
pub use run_state::RunState;
pub use stack::{CallStack, STACK_DEPTH};
