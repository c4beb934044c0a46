//! Instruction disassembly.
//!
//! Mnemonics follow the conventional CHIP-8 assembler syntax (`LD VA, 0x42`,
//! `DRW V0, V1, 5`). Words that decode to nothing render as `.word 0xNNNN`.

use std::fmt;

use crate::decoder::{Decoder, Instruction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the first byte.
    pub addr: u16,
    /// Bytes covered: 2, or 1 for a trailing odd byte.
    pub len_bytes: u8,
    /// Raw big-endian word (or the lone byte).
    pub raw: u16,
    /// Mnemonic, e.g. `LD` or `.word`.
    pub mnemonic: String,
    /// Formatted operands, e.g. `VA, 0x42`.
    pub operands: String,
    /// Whether the word matched no opcode pattern.
    pub is_unknown: bool,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = if self.len_bytes == 1 {
            format!("{:02X}  ", self.raw)
        } else {
            format!("{:04X}", self.raw)
        };
        if self.operands.is_empty() {
            write!(f, "{:#06X}  {raw}  {}", self.addr, self.mnemonic)
        } else {
            write!(
                f,
                "{:#06X}  {raw}  {} {}",
                self.addr, self.mnemonic, self.operands
            )
        }
    }
}

/// Disassembles `bytes` as a program loaded at `base`.
#[must_use]
pub fn disassemble(bytes: &[u8], base: u16) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(bytes.len().div_ceil(2));
    let mut addr = base;

    for chunk in bytes.chunks(2) {
        let row = match *chunk {
            [hi, lo] => disassemble_word(addr, u16::from_be_bytes([hi, lo])),
            [byte] => DisassemblyRow {
                addr,
                len_bytes: 1,
                raw: u16::from(byte),
                mnemonic: ".byte".to_string(),
                operands: format!("0x{byte:02X}"),
                is_unknown: true,
            },
            _ => break,
        };
        rows.push(row);
        addr = addr.wrapping_add(2);
    }

    rows
}

/// Disassembles `before` instructions ahead of `center`, the instruction at
/// `center`, and `after` instructions following it.
///
/// Rows that would fall outside `memory` are omitted.
#[must_use]
pub fn disassemble_window(
    memory: &[u8],
    center: u16,
    before: usize,
    after: usize,
) -> Vec<DisassemblyRow> {
    let back = u16::try_from(before.saturating_mul(2)).unwrap_or(u16::MAX);
    let mut addr = center.saturating_sub(back);
    let first_forward = after
        .saturating_add(1)
        .saturating_mul(2)
        .saturating_add(usize::from(center));
    let capacity = before.saturating_add(after).saturating_add(1);
    let mut rows = Vec::with_capacity(capacity.min(memory.len() / 2));

    while usize::from(addr) < first_forward {
        let at = usize::from(addr);
        let Some(pair) = memory.get(at..at + 2) else {
            break;
        };
        rows.push(disassemble_word(addr, u16::from_be_bytes([pair[0], pair[1]])));
        let Some(next) = addr.checked_add(2) else {
            break;
        };
        addr = next;
    }

    rows
}

/// Disassembles one word fetched from `addr`.
#[must_use]
pub fn disassemble_word(addr: u16, word: u16) -> DisassemblyRow {
    let (mnemonic, operands, is_unknown) = match Decoder::decode(word) {
        Ok(instruction) => {
            let (mnemonic, operands) = format_instruction(instruction);
            (mnemonic, operands, false)
        }
        Err(_) => (".word", format!("0x{word:04X}"), true),
    };

    DisassemblyRow {
        addr,
        len_bytes: 2,
        raw: word,
        mnemonic: mnemonic.to_string(),
        operands,
        is_unknown,
    }
}

/// Mnemonic and operand text for a decoded instruction.
#[must_use]
pub fn format_instruction(instruction: Instruction) -> (&'static str, String) {
    use Instruction as I;

    match instruction {
        I::Sys { addr } => ("SYS", format!("0x{addr:03X}")),
        I::Cls => ("CLS", String::new()),
        I::Ret => ("RET", String::new()),
        I::Jump { addr } => ("JP", format!("0x{addr:03X}")),
        I::Call { addr } => ("CALL", format!("0x{addr:03X}")),
        I::SkipEqImm { x, nn } => ("SE", format!("{x}, 0x{nn:02X}")),
        I::SkipNeImm { x, nn } => ("SNE", format!("{x}, 0x{nn:02X}")),
        I::SkipEqReg { x, y } => ("SE", format!("{x}, {y}")),
        I::SkipNeReg { x, y } => ("SNE", format!("{x}, {y}")),
        I::LoadImm { x, nn } => ("LD", format!("{x}, 0x{nn:02X}")),
        I::AddImm { x, nn } => ("ADD", format!("{x}, 0x{nn:02X}")),
        I::Move { x, y } => ("LD", format!("{x}, {y}")),
        I::Or { x, y } => ("OR", format!("{x}, {y}")),
        I::And { x, y } => ("AND", format!("{x}, {y}")),
        I::Xor { x, y } => ("XOR", format!("{x}, {y}")),
        I::AddReg { x, y } => ("ADD", format!("{x}, {y}")),
        I::Sub { x, y } => ("SUB", format!("{x}, {y}")),
        I::ShiftRight { x, y } => ("SHR", format!("{x}, {y}")),
        I::SubReverse { x, y } => ("SUBN", format!("{x}, {y}")),
        I::ShiftLeft { x, y } => ("SHL", format!("{x}, {y}")),
        I::LoadIndex { addr } => ("LD", format!("I, 0x{addr:03X}")),
        I::JumpOffset { addr } => ("JP", format!("V0, 0x{addr:03X}")),
        I::Random { x, mask } => ("RND", format!("{x}, 0x{mask:02X}")),
        I::Draw { x, y, rows } => ("DRW", format!("{x}, {y}, {rows}")),
        I::SkipKeyPressed { x } => ("SKP", x.to_string()),
        I::SkipKeyReleased { x } => ("SKNP", x.to_string()),
        I::LoadDelay { x } => ("LD", format!("{x}, DT")),
        I::WaitKey { x } => ("LD", format!("{x}, K")),
        I::SetDelay { x } => ("LD", format!("DT, {x}")),
        I::SetSound { x } => ("LD", format!("ST, {x}")),
        I::AddIndex { x } => ("ADD", format!("I, {x}")),
        I::LoadFont { x } => ("LD", format!("F, {x}")),
        I::StoreBcd { x } => ("LD", format!("B, {x}")),
        I::StoreRegisters { x } => ("LD", format!("[I], {x}")),
        I::LoadRegisters { x } => ("LD", format!("{x}, [I]")),
    }
}
