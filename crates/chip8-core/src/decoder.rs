//! Instruction decoder for the CHIP-8 instruction set.
//!
//! Decoding classifies a word against the opcode table and extracts its
//! operand fields into an [`Instruction`]. Unknown words become
//! [`Fault::UnknownInstruction`] so the caller can apply its policy.

use crate::encoding::{classify_word, OpcodeEncoding, OperandFields};
use crate::{Fault, Register};

/// Fully decoded instruction with typed operands.
///
/// Addresses are 12-bit values (`0x000..=0xFFF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Instruction {
    /// `0nnn`: machine-code call on the original hardware; executes as a no-op.
    Sys {
        /// Target address (ignored).
        addr: u16,
    },
    /// `00E0`: clear the display.
    Cls,
    /// `00EE`: return from subroutine.
    Ret,
    /// `1nnn`: jump to `addr`.
    Jump {
        /// Jump target.
        addr: u16,
    },
    /// `2nnn`: call subroutine at `addr`.
    Call {
        /// Subroutine entry.
        addr: u16,
    },
    /// `3xnn`: skip next instruction if `Vx == nn`.
    SkipEqImm {
        /// Compared register.
        x: Register,
        /// Immediate operand.
        nn: u8,
    },
    /// `4xnn`: skip next instruction if `Vx != nn`.
    SkipNeImm {
        /// Compared register.
        x: Register,
        /// Immediate operand.
        nn: u8,
    },
    /// `5xy0`: skip next instruction if `Vx == Vy`.
    SkipEqReg {
        /// Left operand.
        x: Register,
        /// Right operand.
        y: Register,
    },
    /// `6xnn`: `Vx = nn`.
    LoadImm {
        /// Destination.
        x: Register,
        /// Immediate value.
        nn: u8,
    },
    /// `7xnn`: `Vx += nn` without touching `VF`.
    AddImm {
        /// Destination.
        x: Register,
        /// Immediate addend.
        nn: u8,
    },
    /// `8xy0`: `Vx = Vy`.
    Move {
        /// Destination.
        x: Register,
        /// Source.
        y: Register,
    },
    /// `8xy1`: `Vx |= Vy`.
    Or {
        /// Destination and left operand.
        x: Register,
        /// Right operand.
        y: Register,
    },
    /// `8xy2`: `Vx &= Vy`.
    And {
        /// Destination and left operand.
        x: Register,
        /// Right operand.
        y: Register,
    },
    /// `8xy3`: `Vx ^= Vy`.
    Xor {
        /// Destination and left operand.
        x: Register,
        /// Right operand.
        y: Register,
    },
    /// `8xy4`: `Vx += Vy`, `VF` = carry.
    AddReg {
        /// Destination and left operand.
        x: Register,
        /// Right operand.
        y: Register,
    },
    /// `8xy5`: `Vx -= Vy`, `VF` = no borrow.
    Sub {
        /// Destination and minuend.
        x: Register,
        /// Subtrahend.
        y: Register,
    },
    /// `8xy6`: shift right by one, `VF` = bit shifted out.
    ShiftRight {
        /// Destination.
        x: Register,
        /// Alternate source register.
        y: Register,
    },
    /// `8xy7`: `Vx = Vy - Vx`, `VF` = no borrow.
    SubReverse {
        /// Destination and subtrahend.
        x: Register,
        /// Minuend.
        y: Register,
    },
    /// `8xyE`: shift left by one, `VF` = bit shifted out.
    ShiftLeft {
        /// Destination.
        x: Register,
        /// Alternate source register.
        y: Register,
    },
    /// `9xy0`: skip next instruction if `Vx != Vy`.
    SkipNeReg {
        /// Left operand.
        x: Register,
        /// Right operand.
        y: Register,
    },
    /// `Annn`: `I = addr`.
    LoadIndex {
        /// New index value.
        addr: u16,
    },
    /// `Bnnn`: jump to `addr + V0`.
    JumpOffset {
        /// Base address.
        addr: u16,
    },
    /// `Cxnn`: `Vx = random & mask`.
    Random {
        /// Destination.
        x: Register,
        /// Mask applied to the random byte.
        mask: u8,
    },
    /// `Dxyn`: draw `rows` bytes at `I` as a sprite at `(Vx, Vy)`.
    Draw {
        /// Register holding the column.
        x: Register,
        /// Register holding the row.
        y: Register,
        /// Sprite height in rows (`0..=15`).
        rows: u8,
    },
    /// `Ex9E`: skip next instruction if key `Vx` is held.
    SkipKeyPressed {
        /// Register holding the key index.
        x: Register,
    },
    /// `ExA1`: skip next instruction if key `Vx` is not held.
    SkipKeyReleased {
        /// Register holding the key index.
        x: Register,
    },
    /// `Fx07`: `Vx = delay`.
    LoadDelay {
        /// Destination.
        x: Register,
    },
    /// `Fx0A`: block until a key is newly pressed, store its index in `Vx`.
    WaitKey {
        /// Destination.
        x: Register,
    },
    /// `Fx15`: `delay = Vx`.
    SetDelay {
        /// Source.
        x: Register,
    },
    /// `Fx18`: `sound = Vx`.
    SetSound {
        /// Source.
        x: Register,
    },
    /// `Fx1E`: `I += Vx`.
    AddIndex {
        /// Addend.
        x: Register,
    },
    /// `Fx29`: `I` = address of the font glyph for digit `Vx`.
    LoadFont {
        /// Register holding the digit.
        x: Register,
    },
    /// `Fx33`: store the decimal digits of `Vx` at `I..I+3`.
    StoreBcd {
        /// Source.
        x: Register,
    },
    /// `Fx55`: store `V0..=Vx` at `I`.
    StoreRegisters {
        /// Last register stored.
        x: Register,
    },
    /// `Fx65`: load `V0..=Vx` from `I`.
    LoadRegisters {
        /// Last register loaded.
        x: Register,
    },
}

impl Instruction {
    /// Instruction form of this instruction.
    #[must_use]
    pub const fn encoding(self) -> OpcodeEncoding {
        match self {
            Self::Sys { .. } => OpcodeEncoding::Sys,
            Self::Cls => OpcodeEncoding::Cls,
            Self::Ret => OpcodeEncoding::Ret,
            Self::Jump { .. } => OpcodeEncoding::Jump,
            Self::Call { .. } => OpcodeEncoding::Call,
            Self::SkipEqImm { .. } => OpcodeEncoding::SkipEqImm,
            Self::SkipNeImm { .. } => OpcodeEncoding::SkipNeImm,
            Self::SkipEqReg { .. } => OpcodeEncoding::SkipEqReg,
            Self::LoadImm { .. } => OpcodeEncoding::LoadImm,
            Self::AddImm { .. } => OpcodeEncoding::AddImm,
            Self::Move { .. } => OpcodeEncoding::Move,
            Self::Or { .. } => OpcodeEncoding::Or,
            Self::And { .. } => OpcodeEncoding::And,
            Self::Xor { .. } => OpcodeEncoding::Xor,
            Self::AddReg { .. } => OpcodeEncoding::AddReg,
            Self::Sub { .. } => OpcodeEncoding::Sub,
            Self::ShiftRight { .. } => OpcodeEncoding::ShiftRight,
            Self::SubReverse { .. } => OpcodeEncoding::SubReverse,
            Self::ShiftLeft { .. } => OpcodeEncoding::ShiftLeft,
            Self::SkipNeReg { .. } => OpcodeEncoding::SkipNeReg,
            Self::LoadIndex { .. } => OpcodeEncoding::LoadIndex,
            Self::JumpOffset { .. } => OpcodeEncoding::JumpOffset,
            Self::Random { .. } => OpcodeEncoding::Random,
            Self::Draw { .. } => OpcodeEncoding::Draw,
            Self::SkipKeyPressed { .. } => OpcodeEncoding::SkipKeyPressed,
            Self::SkipKeyReleased { .. } => OpcodeEncoding::SkipKeyReleased,
            Self::LoadDelay { .. } => OpcodeEncoding::LoadDelay,
            Self::WaitKey { .. } => OpcodeEncoding::WaitKey,
            Self::SetDelay { .. } => OpcodeEncoding::SetDelay,
            Self::SetSound { .. } => OpcodeEncoding::SetSound,
            Self::AddIndex { .. } => OpcodeEncoding::AddIndex,
            Self::LoadFont { .. } => OpcodeEncoding::LoadFont,
            Self::StoreBcd { .. } => OpcodeEncoding::StoreBcd,
            Self::StoreRegisters { .. } => OpcodeEncoding::StoreRegisters,
            Self::LoadRegisters { .. } => OpcodeEncoding::LoadRegisters,
        }
    }

    /// Re-encodes this instruction to its 16-bit word.
    ///
    /// Operands are masked to their field widths. `Sys` with address `0x0E0`
    /// or `0x0EE` produces the `Cls`/`Ret` words.
    #[must_use]
    pub fn encode(self) -> u16 {
        let x_field = |reg: Register| u16::from(reg.nibble()) << 8;
        let y_field = |reg: Register| u16::from(reg.nibble()) << 4;

        let operands = match self {
            Self::Cls | Self::Ret => 0,
            Self::Sys { addr }
            | Self::Jump { addr }
            | Self::Call { addr }
            | Self::LoadIndex { addr }
            | Self::JumpOffset { addr } => addr & 0x0FFF,
            Self::SkipEqImm { x, nn }
            | Self::SkipNeImm { x, nn }
            | Self::LoadImm { x, nn }
            | Self::AddImm { x, nn }
            | Self::Random { x, mask: nn } => x_field(x) | u16::from(nn),
            Self::SkipEqReg { x, y }
            | Self::SkipNeReg { x, y }
            | Self::Move { x, y }
            | Self::Or { x, y }
            | Self::And { x, y }
            | Self::Xor { x, y }
            | Self::AddReg { x, y }
            | Self::Sub { x, y }
            | Self::ShiftRight { x, y }
            | Self::SubReverse { x, y }
            | Self::ShiftLeft { x, y } => x_field(x) | y_field(y),
            Self::Draw { x, y, rows } => x_field(x) | y_field(y) | u16::from(rows & 0x0F),
            Self::SkipKeyPressed { x }
            | Self::SkipKeyReleased { x }
            | Self::LoadDelay { x }
            | Self::WaitKey { x }
            | Self::SetDelay { x }
            | Self::SetSound { x }
            | Self::AddIndex { x }
            | Self::LoadFont { x }
            | Self::StoreBcd { x }
            | Self::StoreRegisters { x }
            | Self::LoadRegisters { x } => x_field(x),
        };

        self.encoding().pattern() | operands
    }
}

/// Instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes one 16-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::UnknownInstruction`] when `word` matches no opcode
    /// pattern.
    pub fn decode(word: u16) -> Result<Instruction, Fault> {
        let encoding = classify_word(word).ok_or(Fault::UnknownInstruction { word })?;
        let f = OperandFields(word);

        let instruction = match encoding {
            OpcodeEncoding::Cls => Instruction::Cls,
            OpcodeEncoding::Ret => Instruction::Ret,
            OpcodeEncoding::Sys => Instruction::Sys { addr: f.nnn() },
            OpcodeEncoding::Jump => Instruction::Jump { addr: f.nnn() },
            OpcodeEncoding::Call => Instruction::Call { addr: f.nnn() },
            OpcodeEncoding::SkipEqImm => Instruction::SkipEqImm { x: f.x(), nn: f.nn() },
            OpcodeEncoding::SkipNeImm => Instruction::SkipNeImm { x: f.x(), nn: f.nn() },
            OpcodeEncoding::SkipEqReg => Instruction::SkipEqReg { x: f.x(), y: f.y() },
            OpcodeEncoding::LoadImm => Instruction::LoadImm { x: f.x(), nn: f.nn() },
            OpcodeEncoding::AddImm => Instruction::AddImm { x: f.x(), nn: f.nn() },
            OpcodeEncoding::Move => Instruction::Move { x: f.x(), y: f.y() },
            OpcodeEncoding::Or => Instruction::Or { x: f.x(), y: f.y() },
            OpcodeEncoding::And => Instruction::And { x: f.x(), y: f.y() },
            OpcodeEncoding::Xor => Instruction::Xor { x: f.x(), y: f.y() },
            OpcodeEncoding::AddReg => Instruction::AddReg { x: f.x(), y: f.y() },
            OpcodeEncoding::Sub => Instruction::Sub { x: f.x(), y: f.y() },
            OpcodeEncoding::ShiftRight => Instruction::ShiftRight { x: f.x(), y: f.y() },
            OpcodeEncoding::SubReverse => Instruction::SubReverse { x: f.x(), y: f.y() },
            OpcodeEncoding::ShiftLeft => Instruction::ShiftLeft { x: f.x(), y: f.y() },
            OpcodeEncoding::SkipNeReg => Instruction::SkipNeReg { x: f.x(), y: f.y() },
            OpcodeEncoding::LoadIndex => Instruction::LoadIndex { addr: f.nnn() },
            OpcodeEncoding::JumpOffset => Instruction::JumpOffset { addr: f.nnn() },
            OpcodeEncoding::Random => Instruction::Random {
                x: f.x(),
                mask: f.nn(),
            },
            OpcodeEncoding::Draw => Instruction::Draw {
                x: f.x(),
                y: f.y(),
                rows: f.n(),
            },
            OpcodeEncoding::SkipKeyPressed => Instruction::SkipKeyPressed { x: f.x() },
            OpcodeEncoding::SkipKeyReleased => Instruction::SkipKeyReleased { x: f.x() },
            OpcodeEncoding::LoadDelay => Instruction::LoadDelay { x: f.x() },
            OpcodeEncoding::WaitKey => Instruction::WaitKey { x: f.x() },
            OpcodeEncoding::SetDelay => Instruction::SetDelay { x: f.x() },
            OpcodeEncoding::SetSound => Instruction::SetSound { x: f.x() },
            OpcodeEncoding::AddIndex => Instruction::AddIndex { x: f.x() },
            OpcodeEncoding::LoadFont => Instruction::LoadFont { x: f.x() },
            OpcodeEncoding::StoreBcd => Instruction::StoreBcd { x: f.x() },
            OpcodeEncoding::StoreRegisters => Instruction::StoreRegisters { x: f.x() },
            OpcodeEncoding::LoadRegisters => Instruction::LoadRegisters { x: f.x() },
        };

        Ok(instruction)
    }
}
