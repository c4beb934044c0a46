#![no_main]

use chip8_core::{
    disassemble, validate_fetch_access, validate_range, Decoder, Keypad, Machine, MachineConfig,
    RunBoundary, UnknownInstructionPolicy,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }

    let word = u16::from_be_bytes([data[0], data[1]]);
    let addr = u16::from_be_bytes([data[2], data[3]]);
    let keys = Keypad::from_mask(u16::from_be_bytes([data[3], data[4]]));

    if let Ok(instruction) = Decoder::decode(word) {
        assert_eq!(Decoder::decode(instruction.encode()), Ok(instruction));
    }
    let _ = validate_fetch_access(addr);
    let _ = validate_range(addr, usize::from(data[4]));
    let _ = disassemble(&data[5..], 0x200);

    let policy = if data[4] & 1 == 0 {
        UnknownInstructionPolicy::Skip
    } else {
        UnknownInstructionPolicy::Halt
    };
    let mut machine = Machine::new(MachineConfig {
        unknown_instruction: policy,
        rng_seed: Some(u64::from(addr)),
        ..MachineConfig::default()
    });
    if machine.load(&data[5..]).is_ok() {
        machine.run(&keys, 256, RunBoundary::Halted);
        machine.tick_timers();
    }
});
