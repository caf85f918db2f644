#![allow(clippy::multiple_crate_versions)]

//! Aegis - yabai state sync and notch HUD arbitration.
//!
//! This binary serves as both the daemon and the CLI:
//! - With no arguments or `run`: starts the sync daemon
//! - With a command (e.g., `aegis space focus 2`): runs it and exits

fn main() {
    if let Err(err) = aegis_lib::cli::run() {
        eprintln!("aegis: {err}");
        std::process::exit(1);
    }
}
