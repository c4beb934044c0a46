//! Deterministic execution fingerprint used for cross-host comparison.
//!
//! Runs a fixed, seeded program through cycles and timer ticks and prints an
//! FNV-1a hash of the resulting machine state. Two hosts producing different
//! fingerprints have diverging interpreter behaviour.

use chip8_core::{
    run_frame, ClockTicks, Instruction, Keypad, Machine, MachineConfig, Register, StepOutcome,
};
use log as _;
use proptest as _;
use rand as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;

const FRAMES: u32 = 120;

fn program() -> Vec<u8> {
    use Instruction as I;
    use Register as R;

    [
        // 0x200: pick a random digit and draw it at (V2, V3)
        I::Random { x: R::V0, mask: 0x0F },
        I::LoadFont { x: R::V0 },
        I::Draw { x: R::V2, y: R::V3, rows: 5 },
        // 0x206: advance the cursor, store BCD of V2 past the program
        I::AddImm { x: R::V2, nn: 5 },
        I::LoadIndex { addr: 0x300 },
        I::StoreBcd { x: R::V2 },
        // 0x20C: pace on the delay timer
        I::LoadImm { x: R::V4, nn: 2 },
        I::SetDelay { x: R::V4 },
        I::LoadDelay { x: R::V5 },
        I::SkipEqImm { x: R::V5, nn: 0 },
        I::Jump { addr: 0x210 },
        I::Jump { addr: 0x200 },
    ]
    .iter()
    .flat_map(|instruction| instruction.encode().to_be_bytes())
    .collect()
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let mut machine = Machine::new(MachineConfig {
        rng_seed: Some(0x0C8F_1A9E),
        ..MachineConfig::default()
    });
    if let Err(fault) = machine.load(&program()) {
        return format!("load failed: {fault}");
    }

    let keys = Keypad::new();
    let ticks = ClockTicks {
        cycles: 12,
        timer_ticks: 1,
    };
    let mut last = None;
    for _ in 0..FRAMES {
        last = run_frame(&mut machine, &keys, ticks).last_step;
    }

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    match last {
        Some(StepOutcome::Executed { pc, .. }) => {
            hash_bytes(&mut hash, &[0x10]);
            hash_bytes(&mut hash, &pc.to_le_bytes());
        }
        Some(StepOutcome::Fault { fault, pc }) => {
            hash_bytes(&mut hash, &[0x14, fault.code().as_u8()]);
            hash_bytes(&mut hash, &pc.to_le_bytes());
        }
        Some(other) => hash_bytes(&mut hash, format!("{other:?}").as_bytes()),
        None => hash_bytes(&mut hash, &[0x00]),
    }

    let registers = machine.registers();
    hash_bytes(&mut hash, registers.general());
    hash_bytes(&mut hash, &registers.i().to_le_bytes());
    hash_bytes(&mut hash, &registers.pc().to_le_bytes());
    hash_bytes(&mut hash, &[machine.timers().delay(), machine.timers().sound()]);
    for y in 0..chip8_core::DISPLAY_HEIGHT {
        hash_bytes(&mut hash, &machine.display().row_bits(y).to_le_bytes());
    }
    hash_bytes(&mut hash, machine.memory().as_bytes());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
