//! Shared argument types for CLI commands.

use crate::yabai::{FlipAxis, Rotation};

/// Axis argument for `layout flip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFlipAxis {
    /// Mirror horizontally.
    X,
    /// Mirror vertically.
    Y,
}

impl From<CliFlipAxis> for FlipAxis {
    fn from(axis: CliFlipAxis) -> Self {
        match axis {
            CliFlipAxis::X => Self::X,
            CliFlipAxis::Y => Self::Y,
        }
    }
}

/// Parses `90`, `180` or `270` into a [`Rotation`].
///
/// # Errors
///
/// Returns a message naming the accepted values.
pub fn parse_rotation(value: &str) -> Result<Rotation, String> {
    let degrees: u16 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid rotation '{value}'. Expected 90, 180 or 270."))?;
    Rotation::try_from(degrees)
}

/// Parses a 1-based space index.
///
/// # Errors
///
/// Rejects `0` and non-numeric input.
pub fn parse_space_index(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err("Space indexes start at 1.".to_string()),
        Ok(index) => Ok(index),
        Err(_) => Err(format!("Invalid space index '{value}'. Expected a positive integer.")),
    }
}
