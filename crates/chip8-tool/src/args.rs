//! Hand-rolled command-line parsing.

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use chip8_core::{
    MachineConfig, Pacing, Quirks, ShiftSource, SpriteEdge, UnknownInstructionPolicy,
    DEFAULT_CYCLES_PER_SECOND, KEY_COUNT, TIMER_HZ,
};

/// Help text printed for `--help` and after parse errors.
pub const USAGE_TEXT: &str = "\
Usage: chip8-tool <command> [options]

Commands:
  disasm <rom>             Print a disassembly listing of a ROM
  run    <rom> [options]   Run a ROM headless and print the final screen

Run options:
  --cycles-per-sec <n>     CPU rate in instructions per second (default 500)
  --frames <n>             Number of 60 Hz frames to run (default 60)
  --seed <n>               Seed for the random instruction
  --key <hex>              Hold key 0-F from the second frame on (repeatable)
  --strict                 Halt on unknown instructions instead of skipping
  --quirk-shift-vy         Shifts read Vy instead of Vx
  --quirk-clip             Clip sprites at the screen edge instead of wrapping
  --quirk-load-store-i     Fx55/Fx65 advance I
  --quirk-jump-vx          Bnnn adds Vx instead of V0
  --quirk-logic-vf         OR/AND/XOR clear VF

Options:
  -h, --help               Show this help message

Examples:
  chip8-tool disasm pong.ch8
  chip8-tool run pong.ch8 --frames 300 --seed 7
";

/// Default number of frames for `run`.
pub const DEFAULT_FRAMES: u32 = 60;

/// A parsed subcommand.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// `disasm <rom>`.
    Disasm(DisasmArgs),
    /// `run <rom> [options]`.
    Run(RunArgs),
}

/// Arguments for `disasm`.
#[derive(Debug, PartialEq, Eq)]
pub struct DisasmArgs {
    /// ROM path.
    pub rom: PathBuf,
}

/// Arguments for `run`.
#[derive(Debug, PartialEq, Eq)]
pub struct RunArgs {
    /// ROM path.
    pub rom: PathBuf,
    /// CPU rate.
    pub cycles_per_second: u32,
    /// Frames to run.
    pub frames: u32,
    /// Random seed; a fixed default keeps runs reproducible.
    pub seed: Option<u64>,
    /// Bit mask of keys held from the second frame on.
    pub held_keys: u16,
    /// Halt on unknown instructions.
    pub strict: bool,
    /// Instruction variant switches.
    pub quirks: Quirks,
}

impl RunArgs {
    /// Defaults for `rom`.
    #[must_use]
    pub fn new(rom: PathBuf) -> Self {
        Self {
            rom,
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
            frames: DEFAULT_FRAMES,
            seed: None,
            held_keys: 0,
            strict: false,
            quirks: Quirks::default(),
        }
    }

    /// Machine configuration these arguments describe.
    #[must_use]
    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            quirks: self.quirks,
            unknown_instruction: if self.strict {
                UnknownInstructionPolicy::Halt
            } else {
                UnknownInstructionPolicy::Skip
            },
            rng_seed: Some(self.seed.unwrap_or(0)),
            tracing_enabled: false,
        }
    }

    /// Host pacing for these arguments.
    #[must_use]
    pub const fn pacing(&self) -> Pacing {
        Pacing {
            cycles_per_second: self.cycles_per_second,
            timer_hz: TIMER_HZ,
        }
    }
}

/// Outcome of parsing the command line.
#[derive(Debug)]
pub enum ParseResult {
    /// Run a command.
    Command(Command),
    /// Print usage and exit successfully.
    Help,
}

/// Parses arguments following the program name.
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    match first.to_string_lossy().as_ref() {
        "disasm" => parse_disasm_args(args)
            .map(Command::Disasm)
            .map(ParseResult::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_disasm_args(args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut rom: Option<PathBuf> = None;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }
        if rom.is_some() {
            return Err("multiple ROM paths provided".to_string());
        }
        rom = Some(PathBuf::from(arg));
    }

    let rom = rom.ok_or_else(|| "missing ROM path".to_string())?;
    Ok(DisasmArgs { rom })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut rom: Option<PathBuf> = None;
    let mut parsed = RunArgs::new(PathBuf::new());

    while let Some(arg) = args.next() {
        let flag = arg.to_string_lossy().to_string();
        match flag.as_str() {
            "--help" | "-h" => return Err(USAGE_TEXT.to_string()),
            "--cycles-per-sec" => {
                parsed.cycles_per_second = parse_value(&flag, args.next())?;
                if parsed.cycles_per_second == 0 {
                    return Err("--cycles-per-sec must be greater than zero".to_string());
                }
            }
            "--frames" => parsed.frames = parse_value(&flag, args.next())?,
            "--seed" => parsed.seed = Some(parse_value(&flag, args.next())?),
            "--key" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for {flag}"))?;
                let key = parse_key(&value.to_string_lossy())?;
                parsed.held_keys |= 1 << key;
            }
            "--strict" => parsed.strict = true,
            "--quirk-shift-vy" => parsed.quirks.shift_source = ShiftSource::Vy,
            "--quirk-clip" => parsed.quirks.sprite_edge = SpriteEdge::Clip,
            "--quirk-load-store-i" => parsed.quirks.load_store_increments_i = true,
            "--quirk-jump-vx" => parsed.quirks.jump_offset_uses_vx = true,
            "--quirk-logic-vf" => parsed.quirks.logic_resets_vf = true,
            other if other.starts_with('-') => return Err(format!("unknown option: {other}")),
            _ => {
                if rom.is_some() {
                    return Err("multiple ROM paths provided".to_string());
                }
                rom = Some(PathBuf::from(arg));
            }
        }
    }

    parsed.rom = rom.ok_or_else(|| "missing ROM path".to_string())?;
    Ok(parsed)
}

fn parse_value<T: FromStr>(flag: &str, value: Option<OsString>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    let text = value.to_string_lossy();
    text.parse()
        .map_err(|_| format!("invalid value for {flag}: {text}"))
}

fn parse_key(text: &str) -> Result<u8, String> {
    u8::from_str_radix(text, 16)
        .ok()
        .filter(|key| usize::from(*key) < KEY_COUNT)
        .ok_or_else(|| format!("invalid key: {text} (expected 0-F)"))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use chip8_core::{ShiftSource, SpriteEdge, UnknownInstructionPolicy};

    use super::{parse_args, parse_disasm_args, parse_run_args, Command, ParseResult, RunArgs};

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_disasm_command() {
        let result = parse_args(os(&["disasm", "pong.ch8"])).expect("valid disasm args");
        assert!(matches!(
            result,
            ParseResult::Command(Command::Disasm(args)) if args.rom == PathBuf::from("pong.ch8")
        ));
    }

    #[test]
    fn run_defaults() {
        let args = parse_run_args(os(&["pong.ch8"])).expect("valid run args");
        assert_eq!(args, RunArgs::new(PathBuf::from("pong.ch8")));
        assert_eq!(args.pacing().cycles_per_second, 500);
        assert_eq!(args.machine_config().rng_seed, Some(0));
    }

    #[test]
    fn parses_run_options() {
        let args = parse_run_args(os(&[
            "--cycles-per-sec",
            "700",
            "rom.ch8",
            "--frames",
            "10",
            "--seed",
            "42",
            "--key",
            "a",
            "--key",
            "F",
            "--strict",
            "--quirk-shift-vy",
            "--quirk-clip",
            "--quirk-load-store-i",
            "--quirk-jump-vx",
            "--quirk-logic-vf",
        ]))
        .expect("valid run args");

        assert_eq!(args.rom, PathBuf::from("rom.ch8"));
        assert_eq!(args.cycles_per_second, 700);
        assert_eq!(args.frames, 10);
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.held_keys, (1 << 0xA) | (1 << 0xF));

        let config = args.machine_config();
        assert_eq!(config.unknown_instruction, UnknownInstructionPolicy::Halt);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.quirks.shift_source, ShiftSource::Vy);
        assert_eq!(config.quirks.sprite_edge, SpriteEdge::Clip);
        assert!(config.quirks.load_store_increments_i);
        assert!(config.quirks.jump_offset_uses_vx);
        assert!(config.quirks.logic_resets_vf);
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["--help"])).expect("help parses");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["assemble"])).expect_err("unknown command");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_bad_values() {
        let error = parse_run_args(os(&["rom", "--frames", "many"])).expect_err("bad number");
        assert!(error.contains("invalid value for --frames"));

        let error = parse_run_args(os(&["rom", "--key", "10"])).expect_err("bad key");
        assert!(error.contains("invalid key"));

        let error = parse_run_args(os(&["rom", "--cycles-per-sec", "0"])).expect_err("zero rate");
        assert!(error.contains("greater than zero"));

        let error = parse_run_args(os(&["rom", "--seed"])).expect_err("missing value");
        assert!(error.contains("missing value for --seed"));
    }

    #[test]
    fn rejects_missing_or_duplicate_rom() {
        let error = parse_disasm_args(std::iter::empty()).expect_err("missing rom");
        assert!(error.contains("missing ROM path"));

        let error = parse_run_args(os(&["a.ch8", "b.ch8"])).expect_err("two roms");
        assert!(error.contains("multiple ROM paths"));

        let error = parse_disasm_args(os(&["--verbose"])).expect_err("disasm takes no options");
        assert!(error.contains("unknown option"));
    }
}
