//! Fixed memory layout: font, reserved area and program area.

/// Size in bytes of the flat addressable memory (4 KiB).
pub const MEMORY_BYTES: usize = 4096;
/// Inclusive start address of the built-in font glyphs.
pub const FONT_START: u16 = 0x000;
/// Inclusive end address of the built-in font glyphs.
pub const FONT_END: u16 = 0x04F;
/// Inclusive start address of the remaining interpreter-reserved area.
pub const RESERVED_START: u16 = 0x050;
/// Inclusive end address of the interpreter-reserved area.
pub const RESERVED_END: u16 = 0x1FF;
/// Address at which programs are loaded and execution begins.
pub const PROGRAM_START: u16 = 0x200;
/// Last valid address.
pub const PROGRAM_END: u16 = 0xFFF;
/// Largest program image accepted by [`crate::Memory::load`].
pub const MAX_PROGRAM_BYTES: usize = MEMORY_BYTES - PROGRAM_START as usize;

const _: () = assert_fixed_region_layout();

const fn assert_fixed_region_layout() {
    assert!(
        FONT_END + 1 == RESERVED_START,
        "font and reserved regions must be contiguous"
    );
    assert!(
        RESERVED_END + 1 == PROGRAM_START,
        "reserved and program regions must be contiguous"
    );
    assert!(
        PROGRAM_END as usize + 1 == MEMORY_BYTES,
        "program region must end at the top of memory"
    );
    assert!(MAX_PROGRAM_BYTES == 3584, "program area must hold 3584 bytes");
}
