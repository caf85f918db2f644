//! Gateway to the yabai control surface.
//!
//! Every operation is one `yabai -m ...` invocation (or a short fixed sequence
//! for compound verbs), bounded by a timeout. Queries are parsed into the
//! canonical models in [`crate::state`]; commands never touch local
//! state. Retry policy belongs to the caller.
//!
//! - [`client`] - process runner and the [`Gateway`] implementation
//! - [`locate`] - finding the yabai executable
//! - [`parse`] - tolerant parsing of query output
//! - [`signals`] - idempotent signal registration

pub mod client;
pub mod locate;
pub mod parse;
pub mod signals;

use std::fmt;
use std::future::Future;
use std::time::Duration;

pub use client::YabaiGateway;
use thiserror::Error;

use crate::state::{Space, Window};

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while talking to yabai.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The yabai binary could not be located.
    #[error("yabai binary not found: {0}")]
    BinaryNotFound(String),

    /// The process could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish in time and was killed.
    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    /// The process exited unsuccessfully.
    #[error("`{command}` exited with status {code:?}: {stderr}")]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process wrote something that is not UTF-8.
    #[error("`{command}` returned invalid UTF-8")]
    InvalidUtf8 { command: String },

    /// The whole payload could not be understood.
    #[error("malformed {what} output: {reason}")]
    Malformed { what: &'static str, reason: String },
}

/// Layout rotation accepted by `space --rotate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(format!("rotation must be 90, 180 or 270 degrees, got {other}")),
        }
    }
}

/// Axis accepted by `space --mirror`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlipAxis {
    X,
    Y,
}

impl fmt::Display for FlipAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("x-axis"),
            Self::Y => f.write_str("y-axis"),
        }
    }
}

/// Query and command contract of the external window manager.
///
/// Implementations must be cheap to share: the router, the command executor
/// and focus-follow timers all hold the same instance.
pub trait Gateway: Send + Sync + 'static {
    /// Lists every space on every display.
    fn list_spaces(&self) -> impl Future<Output = GatewayResult<Vec<Space>>> + Send;

    /// Lists windows, optionally restricted to one space index.
    fn list_windows(
        &self,
        space: Option<u32>,
    ) -> impl Future<Output = GatewayResult<Vec<Window>>> + Send;

    fn focus_space(&self, index: u32) -> impl Future<Output = GatewayResult<()>> + Send;

    fn create_space(&self) -> impl Future<Output = GatewayResult<()>> + Send;

    fn destroy_space(&self, index: u32) -> impl Future<Output = GatewayResult<()>> + Send;

    fn focus_window(&self, id: u64) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Moves a window to a space, then positions it relative to
    /// `insert_before` either in the tiling order or, with `stack`, inside the
    /// destination stack. Without a target a stacked window joins the end of
    /// the destination stack.
    fn move_window(
        &self,
        id: u64,
        to_space: u32,
        insert_before: Option<u64>,
        stack: bool,
    ) -> impl Future<Output = GatewayResult<()>> + Send;

    fn rotate_layout(&self, rotation: Rotation) -> impl Future<Output = GatewayResult<()>> + Send;

    fn flip_layout(&self, axis: FlipAxis) -> impl Future<Output = GatewayResult<()>> + Send;

    fn balance_layout(&self) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Switches the focused space between tiled and floating.
    fn toggle_layout(&self) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Stacks every window of the focused space, or unstacks them.
    fn toggle_stack_all(&self) -> impl Future<Output = GatewayResult<()>> + Send;
}
