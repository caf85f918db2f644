//! Space, window and layout control commands.
//!
//! Each command maps to one [`Intent`] and runs through the same
//! [`CommandExecutor`] the daemon uses.

use std::sync::Arc;

use clap::Subcommand;

use super::types::{CliFlipAxis, parse_rotation, parse_space_index};
use crate::actor::{StateActor, StateActorHandle};
use crate::commands::{CommandExecutor, Intent, WindowMove};
use crate::config::AegisConfig;
use crate::error::AegisError;
use crate::hud::{HudCoordinator, HudSettings};
use crate::state::{BundleIconResolver, StateStore};
use crate::yabai::{Gateway, Rotation, YabaiGateway};

/// Space subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum SpaceCommands {
    /// Focus a space by its Mission Control index.
    Focus {
        #[arg(value_parser = parse_space_index)]
        index: u32,
    },

    /// Create a new space on the focused display.
    Create,

    /// Destroy a space by its Mission Control index.
    Destroy {
        #[arg(value_parser = parse_space_index)]
        index: u32,
    },
}

impl SpaceCommands {
    #[must_use]
    pub const fn intent(&self) -> Intent {
        match self {
            Self::Focus { index } => Intent::FocusSpace { index: *index },
            Self::Create => Intent::CreateSpace,
            Self::Destroy { index } => Intent::DestroySpace { index: *index },
        }
    }
}

/// Window subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum WindowCommands {
    /// Focus a window by id.
    Focus { id: u64 },

    /// Move a window to another space.
    #[command(after_long_help = r#"Examples:
  aegis window move 5 --to 2                        # Move window 5 to space 2
  aegis window move 5 --to 2 --before 9             # Place it next to window 9
  aegis window move 5 --to 2 --before 9 --stack     # Stack it onto window 9
  aegis window move 5 --to 2 --stack                # Stack it onto the last window
  aegis window move 5 --to 2 --follow               # Move, then focus space 2"#)]
    Move {
        /// Window to move.
        id: u64,

        /// Destination space index.
        #[arg(long, value_parser = parse_space_index)]
        to: u32,

        /// Window on the destination space to insert before.
        #[arg(long, value_name = "WINDOW_ID")]
        before: Option<u64>,

        /// Join a stack instead of the tiling order: the --before window's,
        /// or the last window's on the destination space.
        #[arg(long)]
        stack: bool,

        /// Focus the destination space afterwards when the window changed spaces.
        #[arg(long)]
        follow: bool,
    },
}

impl WindowCommands {
    #[must_use]
    pub const fn intent(&self) -> Intent {
        match self {
            Self::Focus { id } => Intent::FocusWindow { id: *id },
            Self::Move { id, to, before, stack, follow } => {
                let target =
                    WindowMove { id: *id, to_space: *to, insert_before: *before, stack: *stack };
                if *follow { Intent::DropWindow(target) } else { Intent::MoveWindow(target) }
            }
        }
    }
}

/// Layout subcommands for the focused space.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum LayoutCommands {
    /// Rotate the tiling tree.
    Rotate {
        /// 90, 180 or 270.
        #[arg(value_parser = parse_rotation)]
        degrees: Rotation,
    },

    /// Mirror the tiling tree along an axis.
    Flip {
        #[arg(value_enum)]
        axis: CliFlipAxis,
    },

    /// Reset every split to equal size.
    Balance,

    /// Switch between tiled and floating.
    Toggle,

    /// Switch between tiled and stacked.
    Stack,
}

impl LayoutCommands {
    #[must_use]
    pub fn intent(&self) -> Intent {
        match self {
            Self::Rotate { degrees } => Intent::RotateLayout(*degrees),
            Self::Flip { axis } => Intent::FlipLayout((*axis).into()),
            Self::Balance => Intent::BalanceLayout,
            Self::Toggle => Intent::ToggleLayout,
            Self::Stack => Intent::ToggleStackAll,
        }
    }
}

/// Executes one intent and waits for any focus-follow it scheduled.
///
/// # Errors
///
/// Returns the executor's error when the intent fails.
pub async fn dispatch(
    intent: Intent,
    gateway: Arc<YabaiGateway>,
    config: &AegisConfig,
) -> Result<(), AegisError> {
    let mut executor = CommandExecutor::new(Arc::clone(&gateway), &config.commands);

    // A drop only follows when the window leaves its space, which needs the
    // current window set.
    let projection = if let Intent::DropWindow(target) = intent {
        let (actor, reader) = spawn_projection(config);
        prime_windows(&gateway, &actor, target.id).await;
        executor = executor.with_reader(reader);
        Some(actor)
    } else {
        None
    };

    let result = executor.dispatch(intent).await;
    executor.settle().await;

    if let Some(actor) = projection {
        stop_projection(&actor);
    }
    result
}

/// Stops the throwaway projection actor; returns whether it was still running.
fn stop_projection(actor: &StateActorHandle) -> bool {
    match actor.shutdown() {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!("cli: projection already stopped: {err}");
            false
        }
    }
}

fn spawn_projection(config: &AegisConfig) -> (StateActorHandle, crate::actor::StoreReader) {
    let store = StateStore::new(Box::new(BundleIconResolver::new(Vec::new())), config.icons.clone());
    let hud = HudCoordinator::new(HudSettings::from(&config.hud));
    StateActor::spawn(store, hud)
}

async fn prime_windows(gateway: &YabaiGateway, actor: &StateActorHandle, window_id: u64) {
    match gateway.list_windows(None).await {
        Ok(windows) => {
            if let Err(err) = actor.replace_windows(windows).await {
                tracing::debug!("cli: could not load windows: {err}");
            }
            // Round-trips through the actor so the reader sees the new set.
            if let Ok(space) = actor.get_space_of_window(window_id).await {
                tracing::debug!("cli: window {window_id} is on space {space:?}");
            }
        }
        Err(err) => tracing::debug!("cli: window query failed, focus-follow is unconditional: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_stop_projection_tolerates_stopped_actor() {
        let (actor, _reader) = spawn_projection(&AegisConfig::default());

        assert!(stop_projection(&actor));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!actor.is_alive());
        assert!(!stop_projection(&actor));
    }
}
