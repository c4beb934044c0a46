//! Opcode pattern table and operand field extraction.
//!
//! Every instruction word is matched against [`OPCODE_ENCODING_TABLE`]; a word
//! matching no entry is an unknown instruction.

use crate::Register;

/// Canonical instruction forms, one per assigned opcode pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum OpcodeEncoding {
    Cls,
    Ret,
    Sys,
    Jump,
    Call,
    SkipEqImm,
    SkipNeImm,
    SkipEqReg,
    LoadImm,
    AddImm,
    Move,
    Or,
    And,
    Xor,
    AddReg,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
    SkipNeReg,
    LoadIndex,
    JumpOffset,
    Random,
    Draw,
    SkipKeyPressed,
    SkipKeyReleased,
    LoadDelay,
    WaitKey,
    SetDelay,
    SetSound,
    AddIndex,
    LoadFont,
    StoreBcd,
    StoreRegisters,
    LoadRegisters,
}

/// Single source-of-truth `(mask, pattern, encoding)` table.
///
/// Entries are matched in order; `00E0` and `00EE` precede the `0nnn` catch-all.
pub const OPCODE_ENCODING_TABLE: &[(u16, u16, OpcodeEncoding)] = &[
    (0xFFFF, 0x00E0, OpcodeEncoding::Cls),
    (0xFFFF, 0x00EE, OpcodeEncoding::Ret),
    (0xF000, 0x0000, OpcodeEncoding::Sys),
    (0xF000, 0x1000, OpcodeEncoding::Jump),
    (0xF000, 0x2000, OpcodeEncoding::Call),
    (0xF000, 0x3000, OpcodeEncoding::SkipEqImm),
    (0xF000, 0x4000, OpcodeEncoding::SkipNeImm),
    (0xF00F, 0x5000, OpcodeEncoding::SkipEqReg),
    (0xF000, 0x6000, OpcodeEncoding::LoadImm),
    (0xF000, 0x7000, OpcodeEncoding::AddImm),
    (0xF00F, 0x8000, OpcodeEncoding::Move),
    (0xF00F, 0x8001, OpcodeEncoding::Or),
    (0xF00F, 0x8002, OpcodeEncoding::And),
    (0xF00F, 0x8003, OpcodeEncoding::Xor),
    (0xF00F, 0x8004, OpcodeEncoding::AddReg),
    (0xF00F, 0x8005, OpcodeEncoding::Sub),
    (0xF00F, 0x8006, OpcodeEncoding::ShiftRight),
    (0xF00F, 0x8007, OpcodeEncoding::SubReverse),
    (0xF00F, 0x800E, OpcodeEncoding::ShiftLeft),
    (0xF00F, 0x9000, OpcodeEncoding::SkipNeReg),
    (0xF000, 0xA000, OpcodeEncoding::LoadIndex),
    (0xF000, 0xB000, OpcodeEncoding::JumpOffset),
    (0xF000, 0xC000, OpcodeEncoding::Random),
    (0xF000, 0xD000, OpcodeEncoding::Draw),
    (0xF0FF, 0xE09E, OpcodeEncoding::SkipKeyPressed),
    (0xF0FF, 0xE0A1, OpcodeEncoding::SkipKeyReleased),
    (0xF0FF, 0xF007, OpcodeEncoding::LoadDelay),
    (0xF0FF, 0xF00A, OpcodeEncoding::WaitKey),
    (0xF0FF, 0xF015, OpcodeEncoding::SetDelay),
    (0xF0FF, 0xF018, OpcodeEncoding::SetSound),
    (0xF0FF, 0xF01E, OpcodeEncoding::AddIndex),
    (0xF0FF, 0xF029, OpcodeEncoding::LoadFont),
    (0xF0FF, 0xF033, OpcodeEncoding::StoreBcd),
    (0xF0FF, 0xF055, OpcodeEncoding::StoreRegisters),
    (0xF0FF, 0xF065, OpcodeEncoding::LoadRegisters),
];

/// Returns the instruction form for `word`, or `None` for unknown words.
#[must_use]
pub fn classify_word(word: u16) -> Option<OpcodeEncoding> {
    OPCODE_ENCODING_TABLE
        .iter()
        .find_map(|(mask, pattern, encoding)| (word & mask == *pattern).then_some(*encoding))
}

impl OpcodeEncoding {
    /// Fixed bits of this form with all operand fields zero.
    #[must_use]
    pub fn pattern(self) -> u16 {
        OPCODE_ENCODING_TABLE
            .iter()
            .find_map(|(_, pattern, encoding)| (*encoding == self).then_some(*pattern))
            .unwrap_or_default()
    }
}

/// Bit-field view of a raw instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperandFields(pub u16);

impl OperandFields {
    /// Leading opcode nibble (bits 15..12).
    #[must_use]
    pub const fn opcode(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// First register operand (bits 11..8).
    #[must_use]
    pub const fn x(self) -> Register {
        Register::from_nibble((self.0 >> 8) as u8)
    }

    /// Second register operand (bits 7..4).
    #[must_use]
    pub const fn y(self) -> Register {
        Register::from_nibble((self.0 >> 4) as u8)
    }

    /// Low nibble (bits 3..0).
    #[must_use]
    pub const fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Low byte (bits 7..0).
    #[must_use]
    pub const fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// 12-bit address (bits 11..0).
    #[must_use]
    pub const fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}
