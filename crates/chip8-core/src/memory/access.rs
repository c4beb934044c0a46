//! Bounds policy for fetch and data accesses.
//!
//! Addresses are never masked or wrapped: any access touching an address at
//! or above [`MEMORY_BYTES`] is rejected with [`Fault::OutOfBoundsAccess`]
//! carrying the first offending address.

use crate::memory::map::MEMORY_BYTES;
use crate::Fault;

/// Canonical byte width of one instruction word.
pub const INSTRUCTION_BYTES: u16 = 2;

/// Validates that `len` bytes starting at `addr` all lie inside memory.
///
/// A zero-length range is valid at any in-range address and at exactly
/// `MEMORY_BYTES`, matching slice semantics.
///
/// # Errors
///
/// Returns [`Fault::OutOfBoundsAccess`] naming the first address past the
/// end of memory.
pub fn validate_range(addr: u16, len: usize) -> Result<(), Fault> {
    let start = usize::from(addr);
    if start > MEMORY_BYTES || (len > 0 && start >= MEMORY_BYTES) {
        return Err(Fault::OutOfBoundsAccess { addr });
    }

    if start + len > MEMORY_BYTES {
        return Err(Fault::OutOfBoundsAccess {
            addr: first_out_of_range(),
        });
    }

    Ok(())
}

/// Validates that both bytes of the instruction word at `pc` are addressable.
///
/// # Errors
///
/// Returns [`Fault::OutOfBoundsAccess`] when `pc` or `pc + 1` is past the end
/// of memory.
pub fn validate_fetch_access(pc: u16) -> Result<(), Fault> {
    validate_range(pc, usize::from(INSTRUCTION_BYTES))
}

#[allow(clippy::cast_possible_truncation)]
const fn first_out_of_range() -> u16 {
    MEMORY_BYTES as u16
}

#[cfg(test)]
mod tests {
    use super::{validate_fetch_access, validate_range};
    use crate::Fault;

    #[test]
    fn fetch_legality_matches_bounds_policy() {
        assert_eq!(validate_fetch_access(0x200), Ok(()));
        assert_eq!(validate_fetch_access(0xFFE), Ok(()));
        assert_eq!(
            validate_fetch_access(0xFFF),
            Err(Fault::OutOfBoundsAccess { addr: 0x1000 })
        );
        assert_eq!(
            validate_fetch_access(0x1234),
            Err(Fault::OutOfBoundsAccess { addr: 0x1234 })
        );
    }

    #[test]
    fn range_validation_reports_first_offending_address() {
        assert_eq!(validate_range(0xFFD, 3), Ok(()));
        assert_eq!(
            validate_range(0xFFE, 3),
            Err(Fault::OutOfBoundsAccess { addr: 0x1000 })
        );
        assert_eq!(
            validate_range(0xFFFF, 1),
            Err(Fault::OutOfBoundsAccess { addr: 0xFFFF })
        );
    }

    #[test]
    fn empty_ranges_follow_slice_semantics() {
        assert_eq!(validate_range(0x000, 0), Ok(()));
        assert_eq!(validate_range(0x1000, 0), Ok(()));
        assert_eq!(
            validate_range(0x1001, 0),
            Err(Fault::OutOfBoundsAccess { addr: 0x1001 })
        );
    }
}
