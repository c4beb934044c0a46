//! Pure ALU and digit helpers used by instruction execution.

use super::FlagsUpdate;
use crate::Quirks;
use crate::ShiftSource;

/// Register-to-register ALU operations (`8xyN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Move,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

/// Computes the new `Vx` and the `VF` update for `op` on the pre-instruction
/// values of `Vx` and `Vy`.
#[must_use]
pub fn alu(op: AluOp, vx: u8, vy: u8, quirks: Quirks) -> (u8, FlagsUpdate) {
    let logic_flag = if quirks.logic_resets_vf {
        FlagsUpdate::Set(false)
    } else {
        FlagsUpdate::None
    };
    let shifted = match quirks.shift_source {
        ShiftSource::Vx => vx,
        ShiftSource::Vy => vy,
    };

    match op {
        AluOp::Move => (vy, FlagsUpdate::None),
        AluOp::Or => (vx | vy, logic_flag),
        AluOp::And => (vx & vy, logic_flag),
        AluOp::Xor => (vx ^ vy, logic_flag),
        AluOp::Add => {
            let (sum, carry) = vx.overflowing_add(vy);
            (sum, FlagsUpdate::Set(carry))
        }
        AluOp::Sub => (vx.wrapping_sub(vy), FlagsUpdate::Set(vx >= vy)),
        AluOp::SubReverse => (vy.wrapping_sub(vx), FlagsUpdate::Set(vy >= vx)),
        AluOp::ShiftRight => (shifted >> 1, FlagsUpdate::Set(shifted & 0x01 != 0)),
        AluOp::ShiftLeft => (shifted << 1, FlagsUpdate::Set(shifted & 0x80 != 0)),
    }
}

/// Hundreds, tens and ones digits of `value`.
#[must_use]
pub const fn bcd_digits(value: u8) -> [u8; 3] {
    [value / 100, (value / 10) % 10, value % 10]
}
