//! Headless command-line host for the CHIP-8 interpreter core.

use env_logger as _;
#[cfg(test)]
use tempfile as _;

/// Command-line parsing.
pub mod args;
/// ROM run and disassembly sessions.
pub mod session;
