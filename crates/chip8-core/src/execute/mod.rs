//! Instruction execution pipeline.
//!
//! One cycle runs in two phases:
//! 1. Execute against a staged copy of the registers and timers, recording
//!    pending memory writes and display operations in an [`ExecuteState`].
//! 2. Commit: apply the memory write first (the only fallible step), then the
//!    display operation, then swap in the staged registers and timers.
//!
//! A fault in either phase leaves the machine exactly as it was before the
//! cycle, apart from the latched run state and diagnostics.

mod flags;
mod helpers;

pub use flags::FlagsUpdate;
pub use helpers::bcd_digits;

use helpers::{alu, AluOp};
use log::{debug, trace, warn};
use rand::{Rng, RngCore};

use crate::display::MAX_SPRITE_ROWS;
use crate::memory::font_glyph_addr;
use crate::{
    Decoder, Fault, Instruction, Keypad, Machine, Memory, Quirks, Register, RegisterFile,
    RunState, SpriteEdge, StepOutcome, Timers, TraceEvent, TraceSink, UnknownInstructionPolicy,
    GENERAL_REGISTER_COUNT,
};

/// Read-only inputs and the random source available to one instruction.
pub struct ExecuteContext<'a> {
    /// Memory as it was at the start of the cycle.
    pub memory: &'a Memory,
    /// Key snapshot for this cycle.
    pub keys: Keypad,
    /// Active instruction variant switches.
    pub quirks: Quirks,
    /// Source for `Cxnn`.
    pub rng: &'a mut dyn RngCore,
}

/// Bytes to be written to memory at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWrite {
    /// First address written.
    pub addr: u16,
    data: [u8; GENERAL_REGISTER_COUNT],
    len: usize,
}

impl MemoryWrite {
    fn new(addr: u16, bytes: &[u8]) -> Self {
        let mut data = [0; GENERAL_REGISTER_COUNT];
        let len = bytes.len().min(data.len());
        data[..len].copy_from_slice(&bytes[..len]);
        Self { addr, data, len }
    }

    /// Bytes to write, in address order.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Framebuffer operation to be applied at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOp {
    /// Turn every pixel off.
    Clear,
    /// XOR-draw a sprite and write the collision flag to `VF`.
    Draw {
        /// Column operand (`Vx`).
        x: u8,
        /// Row operand (`Vy`).
        y: u8,
        /// Sprite rows read from memory; only the first `rows` are used.
        sprite: [u8; MAX_SPRITE_ROWS],
        /// Sprite height.
        rows: u8,
        /// Edge handling in effect.
        edge: SpriteEdge,
    },
}

/// Side effects accumulated by one instruction before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteState {
    /// Staged register file, `PC` already advanced past the instruction.
    pub registers: RegisterFile,
    /// Staged timers.
    pub timers: Timers,
    /// Pending memory write.
    pub memory_write: Option<MemoryWrite>,
    /// Pending framebuffer operation.
    pub display: Option<DisplayOp>,
    /// Register awaiting a key press, when the instruction was `Fx0A`.
    pub key_wait: Option<Register>,
}

impl ExecuteState {
    /// Stages copies of the current registers and timers.
    #[must_use]
    pub fn new(registers: &RegisterFile, timers: Timers) -> Self {
        Self {
            registers: registers.clone(),
            timers,
            memory_write: None,
            display: None,
            key_wait: None,
        }
    }
}

/// Collision result of a committed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawReport {
    /// Column operand.
    pub x: u8,
    /// Row operand.
    pub y: u8,
    /// Sprite height.
    pub rows: u8,
    /// Whether any pixel was turned off.
    pub collision: bool,
}

/// Executes one decoded instruction against staged state.
///
/// `PC` is advanced past the instruction before the effect is computed, so
/// `CALL` pushes the return address and skips add a further 2.
///
/// # Errors
///
/// Returns the raised fault; nothing has been applied to the machine.
pub fn execute_instruction(
    instruction: Instruction,
    registers: &RegisterFile,
    timers: Timers,
    ctx: &mut ExecuteContext<'_>,
) -> Result<ExecuteState, Fault> {
    let mut exec = ExecuteState::new(registers, timers);
    let regs = &mut exec.registers;
    regs.advance_pc();

    match instruction {
        Instruction::Sys { .. } => {}
        Instruction::Cls => exec.display = Some(DisplayOp::Clear),
        Instruction::Ret => {
            let addr = regs.pop()?;
            regs.set_pc(addr);
        }
        Instruction::Jump { addr } => regs.set_pc(addr),
        Instruction::Call { addr } => {
            regs.push(regs.pc())?;
            regs.set_pc(addr);
        }
        Instruction::SkipEqImm { x, nn } => skip_if(regs.v(x) == nn, regs),
        Instruction::SkipNeImm { x, nn } => skip_if(regs.v(x) != nn, regs),
        Instruction::SkipEqReg { x, y } => skip_if(regs.v(x) == regs.v(y), regs),
        Instruction::SkipNeReg { x, y } => skip_if(regs.v(x) != regs.v(y), regs),
        Instruction::LoadImm { x, nn } => regs.set_v(x, nn),
        Instruction::AddImm { x, nn } => regs.set_v(x, regs.v(x).wrapping_add(nn)),
        Instruction::Move { x, y } => execute_alu(regs, x, y, AluOp::Move, ctx.quirks),
        Instruction::Or { x, y } => execute_alu(regs, x, y, AluOp::Or, ctx.quirks),
        Instruction::And { x, y } => execute_alu(regs, x, y, AluOp::And, ctx.quirks),
        Instruction::Xor { x, y } => execute_alu(regs, x, y, AluOp::Xor, ctx.quirks),
        Instruction::AddReg { x, y } => execute_alu(regs, x, y, AluOp::Add, ctx.quirks),
        Instruction::Sub { x, y } => execute_alu(regs, x, y, AluOp::Sub, ctx.quirks),
        Instruction::ShiftRight { x, y } => {
            execute_alu(regs, x, y, AluOp::ShiftRight, ctx.quirks);
        }
        Instruction::SubReverse { x, y } => {
            execute_alu(regs, x, y, AluOp::SubReverse, ctx.quirks);
        }
        Instruction::ShiftLeft { x, y } => execute_alu(regs, x, y, AluOp::ShiftLeft, ctx.quirks),
        Instruction::LoadIndex { addr } => regs.set_i(addr),
        Instruction::JumpOffset { addr } => {
            let base = if ctx.quirks.jump_offset_uses_vx {
                regs.v(Register::from_nibble(addr.to_be_bytes()[0]))
            } else {
                regs.v(Register::V0)
            };
            regs.set_pc(addr.wrapping_add(u16::from(base)));
        }
        Instruction::Random { x, mask } => regs.set_v(x, ctx.rng.gen::<u8>() & mask),
        Instruction::Draw { x, y, rows } => {
            // Row count is a 4-bit field, at most `MAX_SPRITE_ROWS`.
            let rows = rows & 0x0F;
            let bytes = ctx.memory.slice(regs.i(), usize::from(rows))?;
            let mut sprite = [0; MAX_SPRITE_ROWS];
            sprite[..bytes.len()].copy_from_slice(bytes);
            exec.display = Some(DisplayOp::Draw {
                x: regs.v(x),
                y: regs.v(y),
                sprite,
                rows,
                edge: ctx.quirks.sprite_edge,
            });
        }
        Instruction::SkipKeyPressed { x } => skip_if(ctx.keys.is_pressed(regs.v(x)), regs),
        Instruction::SkipKeyReleased { x } => skip_if(!ctx.keys.is_pressed(regs.v(x)), regs),
        Instruction::LoadDelay { x } => regs.set_v(x, exec.timers.delay()),
        Instruction::WaitKey { x } => exec.key_wait = Some(x),
        Instruction::SetDelay { x } => exec.timers.set_delay(regs.v(x)),
        Instruction::SetSound { x } => exec.timers.set_sound(regs.v(x)),
        Instruction::AddIndex { x } => regs.set_i(regs.i().wrapping_add(u16::from(regs.v(x)))),
        Instruction::LoadFont { x } => regs.set_i(font_glyph_addr(regs.v(x))),
        Instruction::StoreBcd { x } => {
            exec.memory_write = Some(MemoryWrite::new(regs.i(), &bcd_digits(regs.v(x))));
        }
        Instruction::StoreRegisters { x } => {
            let count = x.index() + 1;
            exec.memory_write = Some(MemoryWrite::new(regs.i(), &regs.general()[..count]));
            if ctx.quirks.load_store_increments_i {
                advance_index(regs, count);
            }
        }
        Instruction::LoadRegisters { x } => {
            let count = x.index() + 1;
            let bytes = ctx.memory.slice(regs.i(), count)?;
            for (reg, value) in Register::ALL.iter().zip(bytes) {
                regs.set_v(*reg, *value);
            }
            if ctx.quirks.load_store_increments_i {
                advance_index(regs, count);
            }
        }
    }

    Ok(exec)
}

/// Applies staged side effects to the machine.
///
/// # Errors
///
/// Returns [`Fault::OutOfBoundsAccess`] when the pending memory write leaves
/// memory; in that case nothing is applied.
pub fn commit_execution(
    machine: &mut Machine,
    mut exec: ExecuteState,
) -> Result<Option<DrawReport>, Fault> {
    if let Some(write) = exec.memory_write {
        machine.memory.write_slice(write.addr, write.bytes())?;
    }

    let mut report = None;
    match exec.display {
        Some(DisplayOp::Clear) => machine.display.clear(),
        Some(DisplayOp::Draw {
            x,
            y,
            sprite,
            rows,
            edge,
        }) => {
            let collision =
                machine
                    .display
                    .draw_sprite_with_edge(x, y, &sprite[..usize::from(rows)], edge);
            exec.registers.set_flag(collision);
            report = Some(DrawReport {
                x,
                y,
                rows,
                collision,
            });
        }
        None => {}
    }

    machine.registers = exec.registers;
    machine.timers = exec.timers;
    Ok(report)
}

/// Runs one fetch-decode-execute cycle, or one key-wait poll.
///
/// Faults are latched into [`RunState::Halted`] and logged; trace events go
/// to `sink` in execution order.
pub fn step_one(machine: &mut Machine, keys: Keypad, sink: &mut dyn TraceSink) -> StepOutcome {
    machine.diagnostics.record_cycle();

    match machine.run_state {
        RunState::Halted(fault) => return StepOutcome::Halted(fault),
        RunState::WaitingForKey { dest, last_seen } => {
            return poll_key_wait(machine, dest, last_seen, keys, sink);
        }
        RunState::Ready => {}
    }

    let pc = machine.registers.pc();
    let word = match machine.memory.read_word(pc) {
        Ok(word) => word,
        Err(fault) => return raise(machine, fault, pc, sink),
    };
    sink.on_event(TraceEvent::InstructionStart { pc, word });

    let instruction = match Decoder::decode(word) {
        Ok(instruction) => instruction,
        Err(fault) => match machine.config.unknown_instruction {
            UnknownInstructionPolicy::Skip => {
                debug!("skipping unknown instruction {word:#06X} at {pc:#06X}");
                machine.diagnostics.record_fault(fault, pc);
                sink.on_event(TraceEvent::FaultRaised { fault, pc });
                machine.registers.advance_pc();
                return StepOutcome::UnknownInstruction { pc, word };
            }
            UnknownInstructionPolicy::Halt => return raise(machine, fault, pc, sink),
        },
    };

    let mut ctx = ExecuteContext {
        memory: &machine.memory,
        keys,
        quirks: machine.config.quirks,
        rng: &mut machine.rng,
    };
    let committed = execute_instruction(instruction, &machine.registers, machine.timers, &mut ctx)
        .and_then(|exec| {
            let key_wait = exec.key_wait;
            commit_execution(machine, exec).map(|draw| (draw, key_wait))
        });

    let (draw, key_wait) = match committed {
        Ok(result) => result,
        Err(fault) => return raise(machine, fault, pc, sink),
    };

    trace!("{pc:#06X}: {instruction:?}");
    machine.diagnostics.record_instruction();
    if let Some(dest) = key_wait {
        machine.run_state = RunState::WaitingForKey {
            dest,
            last_seen: keys,
        };
    }
    if let Some(report) = draw {
        sink.on_event(TraceEvent::SpriteDrawn {
            x: report.x,
            y: report.y,
            rows: report.rows,
            collision: report.collision,
        });
    }
    sink.on_event(TraceEvent::InstructionRetired { pc, instruction });

    StepOutcome::Executed { pc, instruction }
}

fn poll_key_wait(
    machine: &mut Machine,
    dest: Register,
    last_seen: Keypad,
    keys: Keypad,
    sink: &mut dyn TraceSink,
) -> StepOutcome {
    match keys.newly_pressed_since(last_seen) {
        Some(key) => {
            machine.registers.set_v(dest, key);
            machine.run_state = RunState::Ready;
            debug!("key wait satisfied by key {key:X} into {dest}");
            sink.on_event(TraceEvent::KeyWaitSatisfied { key });
            StepOutcome::KeyReceived { key }
        }
        None => {
            machine.run_state = RunState::WaitingForKey {
                dest,
                last_seen: keys,
            };
            StepOutcome::WaitingForKey
        }
    }
}

fn raise(machine: &mut Machine, fault: Fault, pc: u16, sink: &mut dyn TraceSink) -> StepOutcome {
    warn!("machine halted at {pc:#06X}: {fault}");
    machine.diagnostics.record_fault(fault, pc);
    machine.run_state = RunState::Halted(fault);
    sink.on_event(TraceEvent::FaultRaised { fault, pc });
    StepOutcome::Fault { fault, pc }
}

fn execute_alu(regs: &mut RegisterFile, x: Register, y: Register, op: AluOp, quirks: Quirks) {
    let (value, flags) = alu(op, regs.v(x), regs.v(y), quirks);
    regs.set_v(x, value);
    flags.apply(regs);
}

fn skip_if(condition: bool, regs: &mut RegisterFile) {
    if condition {
        regs.advance_pc();
    }
}

fn advance_index(regs: &mut RegisterFile, count: usize) {
    let count = u16::try_from(count).unwrap_or(u16::MAX);
    regs.set_i(regs.i().wrapping_add(count));
}
