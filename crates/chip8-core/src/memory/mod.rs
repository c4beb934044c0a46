//! Memory model primitives and fixed address-space policies.

/// Bounds policy helpers for fetch and data accesses.
pub mod access;
/// Fixed memory-region map and address decoder.
pub mod map;

pub use access::{validate_fetch_access, validate_range, INSTRUCTION_BYTES};
pub use map::{
    FONT_END, FONT_START, MAX_PROGRAM_BYTES, MEMORY_BYTES, PROGRAM_END, PROGRAM_START,
    RESERVED_END, RESERVED_START,
};

use crate::Fault;

/// Height in bytes of one built-in font glyph.
pub const FONT_GLYPH_BYTES: u16 = 5;

/// Built-in hexadecimal digit glyphs `0..=F`, installed at [`FONT_START`].
#[rustfmt::skip]
pub const FONT_SPRITES: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Returns the address of the font glyph for the low nibble of `digit`.
#[must_use]
pub const fn font_glyph_addr(digit: u8) -> u16 {
    FONT_START + (digit & 0x0F) as u16 * FONT_GLYPH_BYTES
}

/// Flat 4 KiB byte store with bounds-checked access.
///
/// No other component touches the backing bytes directly; every read and
/// write goes through [`validate_range`].
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Allocates zeroed memory with the font glyphs installed.
    #[must_use]
    pub fn new() -> Self {
        let mut memory = Self {
            bytes: vec![0; MEMORY_BYTES].into_boxed_slice(),
        };
        memory.install_font();
        memory
    }

    /// Writes the built-in glyphs to the font area.
    pub fn install_font(&mut self) {
        let font_start = usize::from(FONT_START);
        self.bytes[font_start..font_start + FONT_SPRITES.len()].copy_from_slice(&FONT_SPRITES);
    }

    /// Copies `program` into memory starting at [`PROGRAM_START`].
    ///
    /// The remainder of the program area is zeroed so no bytes from a
    /// previously loaded program survive. On error memory is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidProgramLength`] when `program` is longer than
    /// [`MAX_PROGRAM_BYTES`].
    pub fn load(&mut self, program: &[u8]) -> Result<(), Fault> {
        if program.len() > MAX_PROGRAM_BYTES {
            return Err(Fault::InvalidProgramLength { len: program.len() });
        }

        let start = usize::from(PROGRAM_START);
        let area = &mut self.bytes[start..];
        area[..program.len()].copy_from_slice(program);
        area[program.len()..].fill(0);
        Ok(())
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAccess`] when `addr` is outside memory.
    pub fn read(&self, addr: u16) -> Result<u8, Fault> {
        validate_range(addr, 1)?;
        Ok(self.bytes[usize::from(addr)])
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAccess`] when `addr` is outside memory.
    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        validate_range(addr, 1)?;
        self.bytes[usize::from(addr)] = value;
        Ok(())
    }

    /// Reads the big-endian instruction word at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAccess`] when either byte is outside memory.
    pub fn read_word(&self, pc: u16) -> Result<u16, Fault> {
        validate_fetch_access(pc)?;
        let at = usize::from(pc);
        Ok(u16::from_be_bytes([self.bytes[at], self.bytes[at + 1]]))
    }

    /// Borrows `len` bytes starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAccess`] when the range leaves memory.
    pub fn slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        validate_range(addr, len)?;
        let at = usize::from(addr);
        Ok(&self.bytes[at..at + len])
    }

    /// Copies `data` into memory starting at `addr`, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutOfBoundsAccess`] when the range leaves memory.
    pub fn write_slice(&mut self, addr: u16, data: &[u8]) -> Result<(), Fault> {
        validate_range(addr, data.len())?;
        let at = usize::from(addr);
        self.bytes[at..at + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Full memory image, address 0 first.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.bytes[usize::from(PROGRAM_START)..]
            .iter()
            .rposition(|byte| *byte != 0)
            .map_or(0, |last| last + 1);
        f.debug_struct("Memory")
            .field("size", &self.bytes.len())
            .field("program_bytes", &used)
            .finish()
    }
}
