//! Instruction semantics driven through the public `Machine` API.

#![allow(clippy::pedantic, clippy::nursery)]

use chip8_core::{
    font_glyph_addr, Fault, Instruction, Keypad, Machine, MachineConfig, Quirks, Register,
    RunState, ShiftSource, SpriteEdge, StepOutcome, UnknownInstructionPolicy,
};
use log as _;
use proptest as _;
use rand as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;

const X: Register = Register::V1;
const Y: Register = Register::V2;

fn program(instructions: &[Instruction]) -> Vec<u8> {
    instructions
        .iter()
        .flat_map(|instruction| instruction.encode().to_be_bytes())
        .collect()
}

fn machine_with(config: MachineConfig, instructions: &[Instruction]) -> Machine {
    let mut machine = Machine::new(MachineConfig {
        rng_seed: Some(0x5EED),
        ..config
    });
    machine.load(&program(instructions)).expect("program fits");
    machine
}

fn boot(instructions: &[Instruction]) -> Machine {
    machine_with(MachineConfig::default(), instructions)
}

fn with_quirks(quirks: Quirks, instructions: &[Instruction]) -> Machine {
    machine_with(
        MachineConfig {
            quirks,
            ..MachineConfig::default()
        },
        instructions,
    )
}

fn step(machine: &mut Machine) -> StepOutcome {
    let outcome = machine.cycle(&Keypad::new());
    assert!(outcome.made_progress(), "unexpected step outcome {outcome:?}");
    outcome
}

#[rstest]
#[case::add_without_carry(Instruction::AddReg { x: X, y: Y }, 0x10, 0x20, 0x30, 0)]
#[case::add_with_carry(Instruction::AddReg { x: X, y: Y }, 0xFF, 0x02, 0x01, 1)]
#[case::sub_without_borrow(Instruction::Sub { x: X, y: Y }, 0x30, 0x10, 0x20, 1)]
#[case::sub_equal_operands(Instruction::Sub { x: X, y: Y }, 0x10, 0x10, 0x00, 1)]
#[case::sub_with_borrow(Instruction::Sub { x: X, y: Y }, 0x10, 0x30, 0xE0, 0)]
#[case::subn_without_borrow(Instruction::SubReverse { x: X, y: Y }, 0x10, 0x30, 0x20, 1)]
#[case::subn_with_borrow(Instruction::SubReverse { x: X, y: Y }, 0x30, 0x10, 0xE0, 0)]
#[case::shr_shifts_out_one(Instruction::ShiftRight { x: X, y: Y }, 0x05, 0xFF, 0x02, 1)]
#[case::shr_shifts_out_zero(Instruction::ShiftRight { x: X, y: Y }, 0x04, 0xFF, 0x02, 0)]
#[case::shl_shifts_out_one(Instruction::ShiftLeft { x: X, y: Y }, 0x81, 0x00, 0x02, 1)]
#[case::shl_shifts_out_zero(Instruction::ShiftLeft { x: X, y: Y }, 0x41, 0x00, 0x82, 0)]
#[case::move_keeps_flag(Instruction::Move { x: X, y: Y }, 0x01, 0x9A, 0x9A, 0x77)]
#[case::or_keeps_flag(Instruction::Or { x: X, y: Y }, 0xF0, 0x0F, 0xFF, 0x77)]
#[case::and_keeps_flag(Instruction::And { x: X, y: Y }, 0xF0, 0x3C, 0x30, 0x77)]
#[case::xor_keeps_flag(Instruction::Xor { x: X, y: Y }, 0xF0, 0x3C, 0xCC, 0x77)]
#[case::add_imm_wraps_without_flag(Instruction::AddImm { x: X, nn: 0x10 }, 0xF8, 0x00, 0x08, 0x77)]
#[case::load_imm(Instruction::LoadImm { x: X, nn: 0x42 }, 0x00, 0x00, 0x42, 0x77)]
fn register_arithmetic(
    #[case] instruction: Instruction,
    #[case] vx: u8,
    #[case] vy: u8,
    #[case] expected_vx: u8,
    #[case] expected_vf: u8,
) {
    let mut machine = boot(&[instruction]);
    machine.registers_mut().set_v(X, vx);
    machine.registers_mut().set_v(Y, vy);
    machine.registers_mut().set_v(Register::VF, 0x77);

    step(&mut machine);

    assert_eq!(machine.registers().v(X), expected_vx);
    assert_eq!(machine.registers().v(Register::VF), expected_vf);
    assert_eq!(machine.registers().pc(), 0x202);
}

#[rstest]
#[case::add(Instruction::AddReg { x: Register::VF, y: X }, 0xFF, 0x02, 1)]
#[case::sub(Instruction::Sub { x: Register::VF, y: X }, 0x01, 0x02, 0)]
#[case::shr(Instruction::ShiftRight { x: Register::VF, y: X }, 0x03, 0x00, 1)]
fn flag_wins_when_vf_is_destination(
    #[case] instruction: Instruction,
    #[case] vf: u8,
    #[case] v1: u8,
    #[case] expected: u8,
) {
    let mut machine = boot(&[instruction]);
    machine.registers_mut().set_v(Register::VF, vf);
    machine.registers_mut().set_v(X, v1);

    step(&mut machine);

    assert_eq!(machine.registers().v(Register::VF), expected);
}

#[test]
fn shift_reads_vy_under_quirk() {
    let quirks = Quirks {
        shift_source: ShiftSource::Vy,
        ..Quirks::default()
    };
    let mut machine = with_quirks(quirks, &[Instruction::ShiftLeft { x: X, y: Y }]);
    machine.registers_mut().set_v(X, 0x00);
    machine.registers_mut().set_v(Y, 0x81);

    step(&mut machine);

    assert_eq!(machine.registers().v(X), 0x02);
    assert_eq!(machine.registers().v(Y), 0x81);
    assert_eq!(machine.registers().v(Register::VF), 1);
}

#[test]
fn logic_clears_flag_under_quirk() {
    let quirks = Quirks {
        logic_resets_vf: true,
        ..Quirks::default()
    };
    let mut machine = with_quirks(quirks, &[Instruction::Or { x: X, y: Y }]);
    machine.registers_mut().set_v(Register::VF, 0x77);

    step(&mut machine);

    assert_eq!(machine.registers().v(Register::VF), 0);
}

#[rstest]
#[case::se_imm_taken(Instruction::SkipEqImm { x: X, nn: 0x42 }, 0x42, 0x00, 0x204)]
#[case::se_imm_not_taken(Instruction::SkipEqImm { x: X, nn: 0x42 }, 0x41, 0x00, 0x202)]
#[case::sne_imm_taken(Instruction::SkipNeImm { x: X, nn: 0x42 }, 0x41, 0x00, 0x204)]
#[case::sne_imm_not_taken(Instruction::SkipNeImm { x: X, nn: 0x42 }, 0x42, 0x00, 0x202)]
#[case::se_reg_taken(Instruction::SkipEqReg { x: X, y: Y }, 0x07, 0x07, 0x204)]
#[case::se_reg_not_taken(Instruction::SkipEqReg { x: X, y: Y }, 0x07, 0x08, 0x202)]
#[case::sne_reg_taken(Instruction::SkipNeReg { x: X, y: Y }, 0x07, 0x08, 0x204)]
#[case::sne_reg_not_taken(Instruction::SkipNeReg { x: X, y: Y }, 0x07, 0x07, 0x202)]
fn conditional_skips(
    #[case] instruction: Instruction,
    #[case] vx: u8,
    #[case] vy: u8,
    #[case] expected_pc: u16,
) {
    let mut machine = boot(&[instruction]);
    machine.registers_mut().set_v(X, vx);
    machine.registers_mut().set_v(Y, vy);

    step(&mut machine);

    assert_eq!(machine.registers().pc(), expected_pc);
}

#[rstest]
#[case::skp_pressed(Instruction::SkipKeyPressed { x: X }, true, 0x204)]
#[case::skp_released(Instruction::SkipKeyPressed { x: X }, false, 0x202)]
#[case::sknp_pressed(Instruction::SkipKeyReleased { x: X }, true, 0x202)]
#[case::sknp_released(Instruction::SkipKeyReleased { x: X }, false, 0x204)]
fn key_skips(#[case] instruction: Instruction, #[case] pressed: bool, #[case] expected_pc: u16) {
    let mut machine = boot(&[instruction]);
    machine.registers_mut().set_v(X, 0xA);
    let mut keys = Keypad::new();
    keys.set(0xA, pressed);
    keys.press(0x3);

    machine.cycle(&keys);

    assert_eq!(machine.registers().pc(), expected_pc);
}

#[test]
fn call_and_return_restore_pc_and_depth() {
    let mut machine = boot(&[
        Instruction::Call { addr: 0x204 },
        Instruction::Jump { addr: 0x202 },
        Instruction::Ret,
    ]);

    step(&mut machine);
    assert_eq!(machine.registers().pc(), 0x204);
    assert_eq!(machine.registers().stack().depth(), 1);
    assert_eq!(machine.registers().stack().frames(), &[0x202]);

    step(&mut machine);
    assert_eq!(machine.registers().pc(), 0x202);
    assert!(machine.registers().stack().is_empty());
}

#[test]
fn sixteen_nested_calls_fit_and_the_seventeenth_halts() {
    let mut machine = boot(&[Instruction::Call { addr: 0x200 }]);
    for _ in 0..16 {
        step(&mut machine);
    }
    assert!(machine.registers().stack().is_full());

    let outcome = machine.cycle(&Keypad::new());
    assert_eq!(
        outcome,
        StepOutcome::Fault {
            fault: Fault::StackOverflow,
            pc: 0x200
        }
    );
    assert_eq!(machine.registers().stack().depth(), 16);
    assert_eq!(machine.registers().pc(), 0x200);
    assert_eq!(machine.halt_reason(), Some(Fault::StackOverflow));
    assert_eq!(machine.diagnostics().fault_count_stack, 1);
}

#[rstest]
#[case::v0_offset(false, 0x310, 0x304)]
#[case::vx_offset(true, 0x310, 0x312)]
fn jump_with_offset(#[case] uses_vx: bool, #[case] addr: u16, #[case] expected_pc: u16) {
    let quirks = Quirks {
        jump_offset_uses_vx: uses_vx,
        ..Quirks::default()
    };
    let mut machine = with_quirks(quirks, &[Instruction::JumpOffset { addr }]);
    machine.registers_mut().set_v(Register::V0, 0x04);
    machine.registers_mut().set_v(Register::V3, 0x02);

    step(&mut machine);

    assert_eq!(machine.registers().pc(), expected_pc);
}

#[test]
fn sys_is_a_no_op() {
    let mut machine = boot(&[Instruction::Sys { addr: 0x123 }]);
    let before = machine.registers().clone();

    step(&mut machine);

    assert_eq!(machine.registers().general(), before.general());
    assert_eq!(machine.registers().pc(), 0x202);
}

#[test]
fn index_loads_and_wraps() {
    let mut machine = boot(&[
        Instruction::LoadIndex { addr: 0x2F0 },
        Instruction::AddIndex { x: X },
        Instruction::LoadFont { x: Y },
    ]);
    machine.registers_mut().set_v(X, 0x20);
    machine.registers_mut().set_v(Y, 0x1A);

    step(&mut machine);
    assert_eq!(machine.registers().i(), 0x2F0);
    step(&mut machine);
    assert_eq!(machine.registers().i(), 0x310);
    step(&mut machine);
    assert_eq!(machine.registers().i(), font_glyph_addr(0xA));
    assert_eq!(machine.registers().i(), 50);

    let mut machine = boot(&[Instruction::AddIndex { x: X }]);
    machine.registers_mut().set_i(0xFFFF);
    machine.registers_mut().set_v(X, 2);
    step(&mut machine);
    assert_eq!(machine.registers().i(), 0x0001);
}

#[test]
fn bcd_writes_three_digits_at_index() {
    let mut machine = boot(&[Instruction::StoreBcd { x: X }]);
    machine.registers_mut().set_v(X, 254);
    machine.registers_mut().set_i(0x300);

    step(&mut machine);

    assert_eq!(machine.memory().slice(0x300, 3), Ok(&[2, 5, 4][..]));
    assert_eq!(machine.registers().i(), 0x300);
}

#[rstest]
#[case::index_kept(false, 0x300)]
#[case::index_advanced(true, 0x304)]
fn store_and_load_register_ranges(#[case] increments: bool, #[case] expected_i: u16) {
    let quirks = Quirks {
        load_store_increments_i: increments,
        ..Quirks::default()
    };
    let mut machine = with_quirks(quirks, &[Instruction::StoreRegisters { x: Register::V3 }]);
    for (value, reg) in (1_u8..).zip(Register::ALL) {
        machine.registers_mut().set_v(reg, value);
    }
    machine.registers_mut().set_i(0x300);

    step(&mut machine);

    assert_eq!(machine.memory().slice(0x300, 5), Ok(&[1, 2, 3, 4, 0][..]));
    assert_eq!(machine.registers().i(), expected_i);

    let mut machine = with_quirks(quirks, &[Instruction::LoadRegisters { x: Register::V2 }]);
    machine.registers_mut().set_i(font_glyph_addr(0));

    step(&mut machine);

    assert_eq!(&machine.registers().general()[..4], &[0xF0, 0x90, 0x90, 0x00]);
    let expected_i = if increments { 3 } else { 0 };
    assert_eq!(machine.registers().i(), expected_i);
}

#[test]
fn random_is_masked_and_seeded() {
    let program = [
        Instruction::Random { x: X, mask: 0x0F },
        Instruction::Random { x: Y, mask: 0x00 },
    ];
    let mut first = boot(&program);
    let mut second = boot(&program);

    for machine in [&mut first, &mut second] {
        step(machine);
        step(machine);
    }

    assert!(first.registers().v(X) <= 0x0F);
    assert_eq!(first.registers().v(Y), 0);
    assert_eq!(first.registers().v(X), second.registers().v(X));
}

#[test]
fn timer_instructions_read_and_write_counters() {
    let mut machine = boot(&[
        Instruction::SetDelay { x: X },
        Instruction::SetSound { x: X },
        Instruction::LoadDelay { x: Y },
    ]);
    machine.registers_mut().set_v(X, 30);

    step(&mut machine);
    step(&mut machine);
    assert!(machine.is_beeping());
    machine.tick_timers();
    step(&mut machine);

    assert_eq!(machine.registers().v(Y), 29);
    assert_eq!(machine.timers().sound(), 29);
}

#[test]
fn draw_reports_collision_in_vf_and_clear_wipes() {
    let mut machine = boot(&[
        Instruction::LoadIndex { addr: 0x000 },
        Instruction::Draw { x: X, y: Y, rows: 5 },
        Instruction::Draw { x: X, y: Y, rows: 5 },
        Instruction::Draw { x: X, y: Y, rows: 5 },
        Instruction::Cls,
    ]);

    step(&mut machine);
    step(&mut machine);
    assert_eq!(machine.display().lit_count(), 14);
    assert_eq!(machine.registers().v(Register::VF), 0);

    step(&mut machine);
    assert_eq!(machine.display().lit_count(), 0);
    assert_eq!(machine.registers().v(Register::VF), 1);

    step(&mut machine);
    step(&mut machine);
    assert_eq!(machine.display().lit_count(), 0);
}

#[rstest]
#[case::wrap(SpriteEdge::Wrap, &[0, 1, 62, 63])]
#[case::clip(SpriteEdge::Clip, &[62, 63])]
fn sprite_edge_policy(#[case] edge: SpriteEdge, #[case] lit_columns: &[usize]) {
    let quirks = Quirks {
        sprite_edge: edge,
        ..Quirks::default()
    };
    let mut machine = with_quirks(
        quirks,
        &[
            Instruction::LoadIndex { addr: 0x000 },
            Instruction::Draw { x: X, y: Y, rows: 1 },
        ],
    );
    machine.registers_mut().set_v(X, 62);
    machine.registers_mut().set_v(Y, 32);

    step(&mut machine);
    step(&mut machine);

    let lit: Vec<usize> = (0..64).filter(|&col| machine.display().pixel(col, 0)).collect();
    assert_eq!(lit, lit_columns);
}

#[test]
fn key_wait_ignores_keys_held_on_entry() {
    let mut machine = boot(&[
        Instruction::WaitKey { x: Register::V3 },
        Instruction::Jump { addr: 0x202 },
    ]);
    let held = Keypad::from_mask(1 << 5);

    assert!(machine.cycle(&held).made_progress());
    assert!(machine.run_state().is_waiting_for_key());
    assert_eq!(machine.registers().pc(), 0x202);

    assert_eq!(machine.cycle(&held), StepOutcome::WaitingForKey);
    assert_eq!(machine.registers().pc(), 0x202);

    let both = Keypad::from_mask((1 << 5) | (1 << 9));
    assert_eq!(machine.cycle(&both), StepOutcome::KeyReceived { key: 9 });
    assert_eq!(machine.registers().v(Register::V3), 9);
    assert_eq!(machine.run_state(), RunState::Ready);
}

#[test]
fn key_wait_accepts_a_repress_after_release() {
    let mut machine = boot(&[Instruction::WaitKey { x: Register::V3 }]);
    let held = Keypad::from_mask(1 << 5);

    machine.cycle(&held);
    assert_eq!(machine.cycle(&Keypad::new()), StepOutcome::WaitingForKey);
    assert_eq!(machine.cycle(&held), StepOutcome::KeyReceived { key: 5 });
    assert_eq!(machine.registers().v(Register::V3), 5);
}

#[test]
fn unknown_words_are_skipped_by_default() {
    let mut machine = Machine::new(MachineConfig {
        rng_seed: Some(1),
        ..MachineConfig::default()
    });
    machine.load(&[0x51, 0x21, 0x60, 0x07]).expect("program fits");

    let outcome = machine.cycle(&Keypad::new());
    assert_eq!(
        outcome,
        StepOutcome::UnknownInstruction {
            pc: 0x200,
            word: 0x5121
        }
    );
    assert_eq!(machine.registers().pc(), 0x202);
    assert_eq!(machine.run_state(), RunState::Ready);

    let diagnostics = machine.diagnostics();
    assert_eq!(diagnostics.fault_count_decode, 1);
    let unknown = diagnostics.last_unknown_instruction.expect("recorded");
    assert_eq!(unknown.fault, Fault::UnknownInstruction { word: 0x5121 });
    assert_eq!(unknown.pc, 0x200);

    step(&mut machine);
    assert_eq!(machine.registers().v(Register::V0), 7);
}

#[test]
fn unknown_words_halt_under_strict_policy() {
    let mut machine = Machine::new(MachineConfig {
        unknown_instruction: UnknownInstructionPolicy::Halt,
        rng_seed: Some(1),
        ..MachineConfig::default()
    });
    machine.load(&[0xFF, 0xFF]).expect("program fits");

    let outcome = machine.cycle(&Keypad::new());
    assert_eq!(
        outcome,
        StepOutcome::Fault {
            fault: Fault::UnknownInstruction { word: 0xFFFF },
            pc: 0x200
        }
    );
    assert_eq!(machine.registers().pc(), 0x200);
    assert_eq!(
        machine.halt_reason(),
        Some(Fault::UnknownInstruction { word: 0xFFFF })
    );
}

#[test]
fn faulting_store_commits_nothing() {
    let mut machine = boot(&[Instruction::StoreRegisters { x: Register::V3 }]);
    machine.registers_mut().set_i(0xFFE);
    machine.registers_mut().set_v(Register::V0, 0xAA);
    let memory_before = machine.memory().clone();
    let registers_before = machine.registers().clone();

    let outcome = machine.cycle(&Keypad::new());

    assert!(matches!(
        outcome,
        StepOutcome::Fault {
            fault: Fault::OutOfBoundsAccess { .. },
            pc: 0x200
        }
    ));
    assert_eq!(machine.memory(), &memory_before);
    assert_eq!(machine.registers(), &registers_before);
    assert_eq!(machine.diagnostics().fault_count_memory, 1);
}

#[test]
fn faulting_draw_leaves_display_untouched() {
    let mut machine = boot(&[
        Instruction::LoadIndex { addr: 0x000 },
        Instruction::Draw { x: X, y: Y, rows: 5 },
        Instruction::LoadIndex { addr: 0xFFE },
        Instruction::Draw { x: Y, y: Y, rows: 5 },
    ]);
    machine.registers_mut().set_v(X, 8);
    for _ in 0..3 {
        step(&mut machine);
    }
    let display_before = machine.display().clone();

    let outcome = machine.cycle(&Keypad::new());

    assert!(matches!(outcome, StepOutcome::Fault { pc: 0x206, .. }));
    assert_eq!(machine.display(), &display_before);
    assert_eq!(machine.registers().pc(), 0x206);
}

#[test]
fn fetch_past_end_of_memory_halts() {
    let mut machine = boot(&[Instruction::Jump { addr: 0xFFF }]);
    step(&mut machine);

    let outcome = machine.cycle(&Keypad::new());
    assert!(matches!(
        outcome,
        StepOutcome::Fault {
            fault: Fault::OutOfBoundsAccess { .. },
            pc: 0xFFF
        }
    ));
    assert_eq!(machine.registers().pc(), 0xFFF);
    assert!(matches!(
        machine.cycle(&Keypad::new()),
        StepOutcome::Halted(Fault::OutOfBoundsAccess { .. })
    ));
}
