//! CLI module for Aegis.
//!
//! One binary serves both roles: with no command (or `run`) it starts the
//! sync daemon, otherwise it executes a single command against yabai and
//! exits.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::AegisError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), AegisError> {
    let cli = Cli::parse();
    cli.execute()
}
