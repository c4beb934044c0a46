//! CLI entry point for the `chip8-tool` binary.

use std::env;
use std::fs;
use std::path::Path;

use chip8_core as _;
use chip8_tool::args::{parse_args, Command, DisasmArgs, ParseResult, RunArgs, USAGE_TEXT};
use chip8_tool::session::{disassembly_listing, run_rom};
use log as _;
#[cfg(test)]
use tempfile as _;

fn read_rom(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

fn run_disasm(args: &DisasmArgs) -> Result<(), String> {
    let rom = read_rom(&args.rom)?;
    print!("{}", disassembly_listing(&rom));
    Ok(())
}

fn run_run(args: &RunArgs) -> Result<(), String> {
    let rom = read_rom(&args.rom)?;
    let report = run_rom(&rom, args)?;
    print!("{}", report.render());

    match report.halt {
        Some(record) => Err(format!(
            "machine halted: {} at {:#06X}",
            record.fault, record.pc
        )),
        None => Ok(()),
    }
}

fn main() {
    env_logger::init();

    let result = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            Ok(())
        }
        Ok(ParseResult::Command(Command::Disasm(args))) => run_disasm(&args),
        Ok(ParseResult::Command(Command::Run(args))) => run_run(&args),
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            std::process::exit(1);
        }
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
