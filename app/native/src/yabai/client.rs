//! Process-backed [`Gateway`] implementation.
//!
//! Each call spawns `yabai -m <args>` with piped output and waits for it under
//! a deadline. A process that misses the deadline is killed when its handle is
//! dropped, so a wedged yabai never leaves stray children behind.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use smallvec::{SmallVec, smallvec};
use tokio::process::Command;

use super::locate::locate_yabai;
use super::parse::{self, YabaiLayout};
use super::{FlipAxis, Gateway, GatewayError, GatewayResult, Rotation};
use crate::config::YabaiConfig;
use crate::state::{Space, Window};

/// Arguments of a single `yabai -m` invocation.
pub(crate) type Args = SmallVec<[String; 6]>;

macro_rules! args {
    ($($arg:expr),* $(,)?) => {{
        let args: $crate::yabai::client::Args = smallvec![$($arg.to_string()),*];
        args
    }};
}

/// Talks to yabai through its command line client.
#[derive(Debug)]
pub struct YabaiGateway {
    binary: String,
    resolved: OnceLock<PathBuf>,
    timeout: Duration,
}

impl YabaiGateway {
    #[must_use]
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            resolved: OnceLock::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &YabaiConfig) -> Self {
        Self::new(config.binary.clone(), config.timeout())
    }

    /// Resolves the binary once and caches the absolute path.
    fn binary_path(&self) -> GatewayResult<&PathBuf> {
        if let Some(path) = self.resolved.get() {
            return Ok(path);
        }

        let path = locate_yabai(&self.binary, std::env::var_os("PATH").as_deref())?;
        tracing::debug!("yabai: resolved binary to {}", path.display());
        Ok(self.resolved.get_or_init(|| path))
    }

    /// Runs one `yabai -m` invocation and returns its stdout.
    ///
    /// # Errors
    ///
    /// Returns an error when the binary is missing, the process cannot be
    /// spawned, exceeds the deadline, or exits unsuccessfully.
    pub async fn run(&self, args: &[String]) -> GatewayResult<String> {
        let binary = self.binary_path()?;
        let command = describe(args);
        tracing::trace!("yabai: running `{command}`");

        let child = Command::new(binary)
            .arg("-m")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(GatewayError::Spawn { command, source }),
            Err(_) => {
                tracing::warn!("yabai: `{command}` timed out after {:?}", self.timeout);
                return Err(GatewayError::Timeout { command, after: self.timeout });
            }
        };

        if !output.status.success() {
            return Err(GatewayError::NonZeroExit {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| GatewayError::InvalidUtf8 { command })
    }

    async fn run_all(&self, steps: &[Args]) -> GatewayResult<()> {
        for step in steps {
            self.run(step).await?;
        }
        Ok(())
    }

    async fn focused_space_layout(&self) -> GatewayResult<YabaiLayout> {
        let raw = self.run(&args!["query", "--spaces", "--space"]).await?;
        parse::parse_space_layout(&raw)
    }
}

impl Gateway for YabaiGateway {
    async fn list_spaces(&self) -> GatewayResult<Vec<Space>> {
        let raw = self.run(&args!["query", "--spaces"]).await?;
        parse::parse_spaces(&raw)
    }

    async fn list_windows(&self, space: Option<u32>) -> GatewayResult<Vec<Window>> {
        let raw = self.run(&list_windows_args(space)).await?;
        parse::parse_windows(&raw)
    }

    async fn focus_space(&self, index: u32) -> GatewayResult<()> {
        self.run(&args!["space", "--focus", index]).await.map(drop)
    }

    async fn create_space(&self) -> GatewayResult<()> {
        self.run(&args!["space", "--create"]).await.map(drop)
    }

    async fn destroy_space(&self, index: u32) -> GatewayResult<()> {
        self.run(&args!["space", index, "--destroy"]).await.map(drop)
    }

    async fn focus_window(&self, id: u64) -> GatewayResult<()> {
        self.run(&args!["window", "--focus", id]).await.map(drop)
    }

    async fn move_window(
        &self,
        id: u64,
        to_space: u32,
        insert_before: Option<u64>,
        stack: bool,
    ) -> GatewayResult<()> {
        let target = match insert_before {
            Some(target) => Some(target),
            None if stack => {
                let windows = self.list_windows(Some(to_space)).await?;
                stack_anchor(&windows, id)
            }
            None => None,
        };

        self.run_all(&move_window_steps(id, to_space, target, stack)).await
    }

    async fn rotate_layout(&self, rotation: Rotation) -> GatewayResult<()> {
        self.run(&args!["space", "--rotate", rotation.degrees()]).await.map(drop)
    }

    async fn flip_layout(&self, axis: FlipAxis) -> GatewayResult<()> {
        self.run(&args!["space", "--mirror", axis]).await.map(drop)
    }

    async fn balance_layout(&self) -> GatewayResult<()> {
        self.run(&args!["space", "--balance"]).await.map(drop)
    }

    async fn toggle_layout(&self) -> GatewayResult<()> {
        let current = self.focused_space_layout().await?;
        self.run(&set_layout_args(toggled_layout(current))).await.map(drop)
    }

    async fn toggle_stack_all(&self) -> GatewayResult<()> {
        let current = self.focused_space_layout().await?;
        self.run(&set_layout_args(toggled_stack(current))).await.map(drop)
    }
}

fn describe(args: &[String]) -> String { format!("yabai -m {}", args.join(" ")) }

pub(crate) fn list_windows_args(space: Option<u32>) -> Args {
    match space {
        Some(index) => args!["query", "--windows", "--space", index],
        None => args!["query", "--windows"],
    }
}

pub(crate) fn set_layout_args(layout: YabaiLayout) -> Args {
    args!["space", "--layout", layout.as_str()]
}

/// Picks the window a stacked move should join when no target was given:
/// the top of the destination stack, ignoring the moved window itself.
pub(crate) fn stack_anchor(windows: &[Window], moved: u64) -> Option<u64> {
    windows
        .iter()
        .filter(|window| window.id != moved)
        .max_by_key(|window| window.stack_index)
        .map(|window| window.id)
}

/// Expands a move into its ordered `yabai -m` invocations.
pub(crate) fn move_window_steps(
    id: u64,
    to_space: u32,
    target: Option<u64>,
    stack: bool,
) -> SmallVec<[Args; 2]> {
    let mut steps: SmallVec<[Args; 2]> = smallvec![args!["window", id, "--space", to_space]];

    match target {
        Some(target) if target == id => {}
        Some(target) if stack => steps.push(args!["window", target, "--stack", id]),
        Some(target) => steps.push(args!["window", id, "--warp", target]),
        None => {}
    }

    steps
}

pub(crate) const fn toggled_layout(current: YabaiLayout) -> YabaiLayout {
    match current {
        YabaiLayout::Float => YabaiLayout::Bsp,
        YabaiLayout::Bsp | YabaiLayout::Stack => YabaiLayout::Float,
    }
}

pub(crate) const fn toggled_stack(current: YabaiLayout) -> YabaiLayout {
    match current {
        YabaiLayout::Stack => YabaiLayout::Bsp,
        YabaiLayout::Bsp | YabaiLayout::Float => YabaiLayout::Stack,
    }
}
