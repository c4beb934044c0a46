//! Throughput harness for chip8-core.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --release -p chip8-core --example performance_harness
//! ```
//!
//! ## Metrics
//!
//! - Instructions per second per thread and in total
//! - Machine-equivalents: how many machines could run in real time at the
//!   default 500 Hz CPU rate with 60 Hz timers
//!
//! Each thread owns its own machine, as a host running many ROMs would.

#![allow(clippy::pedantic)]

use chip8_core::{
    Instruction, Keypad, Machine, MachineConfig, Register, RunBoundary,
    DEFAULT_CYCLES_PER_SECOND,
};
use log as _;
use proptest as _;
use rand as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const NUM_THREADS: usize = 4;
const BATCH_CYCLES: u32 = 10_000;

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    instructions_per_second: f64,
    machine_equivalents: f64,
}

fn encode(instructions: &[Instruction]) -> Vec<u8> {
    instructions
        .iter()
        .flat_map(|instruction| instruction.encode().to_be_bytes())
        .collect()
}

fn alu_loop() -> Vec<u8> {
    encode(&[
        Instruction::AddImm {
            x: Register::V0,
            nn: 1,
        },
        Instruction::AddReg {
            x: Register::V1,
            y: Register::V0,
        },
        Instruction::Xor {
            x: Register::V2,
            y: Register::V1,
        },
        Instruction::Jump { addr: 0x200 },
    ])
}

fn draw_loop() -> Vec<u8> {
    encode(&[
        Instruction::LoadFont { x: Register::V0 },
        Instruction::Draw {
            x: Register::V1,
            y: Register::V2,
            rows: 5,
        },
        Instruction::AddImm {
            x: Register::V1,
            nn: 3,
        },
        Instruction::AddImm {
            x: Register::V0,
            nn: 1,
        },
        Instruction::Jump { addr: 0x200 },
    ])
}

fn benchmark(name: &'static str, program: Vec<u8>, duration: Duration) -> BenchmarkResult {
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tx = tx.clone();
            let program = program.clone();
            thread::spawn(move || {
                let mut machine = Machine::new(MachineConfig {
                    rng_seed: Some(1),
                    ..MachineConfig::default()
                });
                if machine.load(&program).is_err() {
                    return;
                }
                let keys = Keypad::new();
                let start = Instant::now();

                while start.elapsed() < duration {
                    machine.run(&keys, BATCH_CYCLES, RunBoundary::Halted);
                }

                let executed = machine.diagnostics().instructions_executed;
                tx.send((executed, start.elapsed())).ok();
            })
        })
        .collect();

    for handle in handles {
        handle.join().ok();
    }
    drop(tx);

    let mut total_per_second = 0.0;
    for (executed, elapsed) in rx {
        total_per_second += executed as f64 / elapsed.as_secs_f64();
    }

    BenchmarkResult {
        name,
        instructions_per_second: total_per_second,
        machine_equivalents: total_per_second / f64::from(DEFAULT_CYCLES_PER_SECOND),
    }
}

fn print_result(result: &BenchmarkResult) {
    println!("{}:", result.name);
    println!(
        "  instructions/sec: {:>14.0} ({:.0} per thread)",
        result.instructions_per_second,
        result.instructions_per_second / NUM_THREADS as f64
    );
    println!(
        "  machines at {DEFAULT_CYCLES_PER_SECOND} Hz: {:>10.0}",
        result.machine_equivalents
    );
}

fn main() {
    let duration = Duration::from_secs(2);
    println!("chip8-core performance harness ({NUM_THREADS} threads, {duration:?} per benchmark)");
    println!();

    print_result(&benchmark("alu loop", alu_loop(), duration));
    print_result(&benchmark("draw loop", draw_loop(), duration));
}
