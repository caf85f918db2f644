//! Aegis - yabai state sync and notch HUD arbitration for macOS status bars.
//!
//! The library keeps an in-process projection of the window manager's spaces
//! and windows up to date, arbitrates which widgets occupy the area around
//! the notch, and turns user intents into window manager commands.
//!
//! Data flows one way: signals arrive through a FIFO, the router coalesces
//! them into refreshes, the refresher queries yabai and hands snapshots to
//! the state actor, and presentation layers read through subscriptions.

pub mod actor;
pub mod cli;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod events;
pub mod hud;
pub mod logging;
pub mod schema;
pub mod state;
pub mod utils;
pub mod yabai;

#[cfg(test)]
mod testing;
