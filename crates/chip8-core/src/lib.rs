//! Core interpreter crate for the CHIP-8 virtual machine.
//!
//! The crate models the machine (memory, registers, framebuffer, timers and
//! keypad) and the fetch/decode/execute cycle. Windowing, audio and input
//! capture belong to the host, which drives [`Machine::cycle`] and
//! [`Machine::tick_timers`] and reads [`Machine::display`].

/// Memory model primitives, the font table and the fixed memory layout.
pub mod memory;
pub use memory::{
    font_glyph_addr, validate_fetch_access, validate_range, Memory, FONT_END, FONT_GLYPH_BYTES,
    FONT_SPRITES, FONT_START, INSTRUCTION_BYTES, MAX_PROGRAM_BYTES, MEMORY_BYTES, PROGRAM_END,
    PROGRAM_START, RESERVED_END, RESERVED_START,
};

/// Architectural CPU state: registers, call stack and run state.
pub mod state;
pub use state::{
    CallStack, Register, RegisterFile, RunState, GENERAL_REGISTER_COUNT, STACK_DEPTH,
};

/// Fault taxonomy for load, memory, stack and decode errors.
pub mod fault;
pub use fault::{Fault, FaultClass, FaultCode};

/// Monochrome 64x32 framebuffer with XOR sprite drawing.
pub mod display;
pub use display::{DisplayBuffer, SpriteEdge, DISPLAY_HEIGHT, DISPLAY_WIDTH, MAX_SPRITE_ROWS};

/// Sixteen-key hexadecimal keypad state.
pub mod keypad;
pub use keypad::{Keypad, SharedKeypad, KEY_COUNT};

/// Delay and sound timers.
pub mod timers;
pub use timers::{Timers, TIMER_HZ};

/// Opcode pattern table and operand field extraction.
pub mod encoding;
pub use encoding::{classify_word, OpcodeEncoding, OperandFields, OPCODE_ENCODING_TABLE};

/// Instruction decoding from raw 16-bit words.
pub mod decoder;
pub use decoder::{Decoder, Instruction};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    MachineConfig, MachineSnapshot, Quirks, RunBoundary, RunOutcome, ShiftSource,
    SnapshotError, SnapshotVersion, StepOutcome, TraceEvent, TraceSink,
    UnknownInstructionPolicy,
};

/// Execution and fault counters.
pub mod diag;
pub use diag::{Diagnostics, FaultRecord};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    bcd_digits, commit_execution, execute_instruction, step_one, DisplayOp, DrawReport,
    ExecuteContext, ExecuteState, FlagsUpdate, MemoryWrite,
};

/// The machine aggregate.
pub mod machine;
pub use machine::Machine;

/// Host-side pacing of cycles and timer ticks.
pub mod timing;
pub use timing::{
    run_frame, ClockTicks, FixedStepClock, FrameReport, Pacing, DEFAULT_CYCLES_PER_SECOND,
};

/// Thread-shared machine wrapper.
pub mod shared;
pub use shared::SharedMachine;

/// Instruction disassembly for debuggers and tooling.
pub mod disasm;
pub use disasm::{disassemble, disassemble_window, disassemble_word, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
