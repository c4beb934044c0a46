//! Program load, reset and boot semantics.

#![allow(clippy::cast_possible_truncation)]

use chip8_core::{
    Fault, Instruction, Keypad, Machine, MachineConfig, Register, RunState, FONT_SPRITES,
    MAX_PROGRAM_BYTES, MEMORY_BYTES, PROGRAM_START,
};
use log as _;
use proptest as _;
use rand as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;

fn seeded() -> Machine {
    Machine::new(MachineConfig {
        rng_seed: Some(0xC8),
        ..MachineConfig::default()
    })
}

#[test]
fn power_on_state_matches_boot_layout() {
    let machine = seeded();

    assert_eq!(machine.registers().pc(), PROGRAM_START);
    assert_eq!(machine.registers().i(), 0);
    assert!(machine.registers().general().iter().all(|&v| v == 0));
    assert!(machine.registers().stack().is_empty());
    assert_eq!(machine.display().lit_count(), 0);
    assert_eq!(machine.timers().delay(), 0);
    assert_eq!(machine.timers().sound(), 0);
    assert_eq!(machine.run_state(), RunState::Ready);
    assert_eq!(
        machine.memory().slice(0, FONT_SPRITES.len()),
        Ok(&FONT_SPRITES[..])
    );
}

#[rstest]
#[case::empty(0)]
#[case::one_instruction(2)]
#[case::odd_length(3)]
#[case::full_program_area(MAX_PROGRAM_BYTES)]
fn programs_up_to_the_limit_load(#[case] len: usize) {
    let mut machine = seeded();
    let program: Vec<u8> = (0..len).map(|i| (i % 251) as u8 | 1).collect();

    assert_eq!(machine.load(&program), Ok(()));
    assert_eq!(machine.memory().slice(PROGRAM_START, len), Ok(&program[..]));
}

#[test]
fn full_program_area_reaches_last_address() {
    let mut machine = seeded();
    let mut program = vec![0; 3584];
    program[3583] = 0xAB;

    machine.load(&program).expect("program fits");

    assert_eq!(machine.memory().read(0x0FFF), Ok(0xAB));
    assert_eq!(machine.memory().as_bytes().len(), MEMORY_BYTES);
}

#[test]
fn oversized_program_is_rejected_without_side_effects() {
    let mut machine = seeded();
    machine.load(&[0x6A, 0x11]).expect("program fits");
    machine.cycle(&Keypad::new());
    let registers_before = machine.registers().clone();
    let memory_before = machine.memory().clone();

    let result = machine.load(&vec![0xEE; 3585]);

    assert_eq!(result, Err(Fault::InvalidProgramLength { len: 3585 }));
    assert_eq!(machine.registers(), &registers_before);
    assert_eq!(machine.memory(), &memory_before);
    assert_eq!(machine.registers().v(Register::VA), 0x11);
    assert_eq!(machine.diagnostics().fault_count_load, 1);
}

#[test]
fn reload_clears_bytes_from_a_longer_previous_program() {
    let mut machine = seeded();
    machine.load(&[0x11; 64]).expect("program fits");
    machine.load(&[0x22, 0x22]).expect("program fits");

    assert_eq!(machine.memory().slice(PROGRAM_START, 4), Ok(&[0x22, 0x22, 0, 0][..]));
    assert_eq!(machine.memory().read(PROGRAM_START + 63), Ok(0));
}

#[test]
fn reload_leaves_machine_state_until_explicit_reset() {
    let mut machine = seeded();
    // LD VA, 0x42; LD DT, VA
    machine.load(&[0x6A, 0x42, 0xFA, 0x15]).expect("program fits");
    machine.cycle(&Keypad::new());
    machine.cycle(&Keypad::new());

    machine.load(&[0x12, 0x00]).expect("program fits");

    assert_eq!(machine.registers().v(Register::VA), 0x42);
    assert_eq!(machine.timers().delay(), 0x42);
    assert_eq!(machine.registers().pc(), PROGRAM_START + 4);
    assert_eq!(machine.diagnostics().instructions_executed, 2);

    machine.reset();

    assert_eq!(machine.registers().v(Register::VA), 0);
    assert_eq!(machine.timers().delay(), 0);
    assert_eq!(machine.registers().pc(), PROGRAM_START);
    assert_eq!(machine.memory().read_word(PROGRAM_START), Ok(0x1200));
}

#[test]
fn reset_restores_font_and_keeps_program() {
    let mut machine = seeded();
    // I = 0; store V0..VF over the font
    let program: Vec<u8> = [
        Instruction::LoadImm {
            x: Register::V0,
            nn: 0x55,
        },
        Instruction::LoadIndex { addr: 0x000 },
        Instruction::StoreRegisters { x: Register::VF },
    ]
    .iter()
    .flat_map(|instruction| instruction.encode().to_be_bytes())
    .collect();
    machine.load(&program).expect("program fits");
    for _ in 0..3 {
        machine.cycle(&Keypad::new());
    }
    assert_eq!(machine.memory().read(0), Ok(0x55));

    machine.reset();

    assert_eq!(
        machine.memory().slice(0, FONT_SPRITES.len()),
        Ok(&FONT_SPRITES[..])
    );
    assert_eq!(machine.memory().slice(PROGRAM_START, program.len()), Ok(&program[..]));
    assert_eq!(machine.registers().v(Register::V0), 0);
    assert_eq!(machine.registers().i(), 0);
    assert_eq!(machine.registers().pc(), PROGRAM_START);
}

#[test]
fn reset_clears_timers_display_stack_and_wait() {
    let mut machine = seeded();
    // CALL 0x204; (pad); LD DT, V0; DRW V0, V0, 5; LD V1, K
    machine
        .load(&[
            0x22, 0x04, 0x00, 0x00, 0xF0, 0x15, 0xD0, 0x05, 0xF1, 0x0A,
        ])
        .expect("program fits");
    machine.registers_mut().set_v(Register::V0, 9);
    for _ in 0..4 {
        machine.cycle(&Keypad::new());
    }
    assert!(machine.run_state().is_waiting_for_key());
    assert_eq!(machine.timers().delay(), 9);
    assert!(machine.display().lit_count() > 0);
    assert_eq!(machine.registers().stack().depth(), 1);

    machine.reset();

    assert_eq!(machine.run_state(), RunState::Ready);
    assert_eq!(machine.timers().delay(), 0);
    assert_eq!(machine.display().lit_count(), 0);
    assert!(machine.registers().stack().is_empty());
    assert_eq!(machine.diagnostics().instructions_executed, 0);
}

#[test]
fn reset_replays_seeded_random_sequence() {
    let mut machine = seeded();
    // RND V0, 0xFF; RND V1, 0xFF
    machine
        .load(&[0xC0, 0xFF, 0xC1, 0xFF])
        .expect("program fits");
    machine.cycle(&Keypad::new());
    machine.cycle(&Keypad::new());
    let first = (machine.registers().v(Register::V0), machine.registers().v(Register::V1));

    machine.reset();
    machine.cycle(&Keypad::new());
    machine.cycle(&Keypad::new());
    let second = (machine.registers().v(Register::V0), machine.registers().v(Register::V1));

    assert_eq!(first, second);
}
