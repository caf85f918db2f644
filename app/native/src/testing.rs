//! Test doubles shared by unit tests.

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::state::{Space, Window};
use crate::yabai::{FlipAxis, Gateway, GatewayError, GatewayResult, Rotation};

/// A gateway call as observed by [`FakeGateway`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    ListSpaces,
    ListWindows(Option<u32>),
    FocusSpace(u32),
    CreateSpace,
    DestroySpace(u32),
    FocusWindow(u64),
    MoveWindow {
        id: u64,
        to_space: u32,
        insert_before: Option<u64>,
        stack: bool,
    },
    RotateLayout(Rotation),
    FlipLayout(FlipAxis),
    BalanceLayout,
    ToggleLayout,
    ToggleStackAll,
}

/// Records calls with their (virtual) time and serves canned snapshots.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: Mutex<Vec<(Instant, Call)>>,
    pub spaces: Mutex<Vec<Space>>,
    pub windows: Mutex<Vec<Window>>,
    /// Calls matching this predicate fail with a non-zero exit.
    pub failing: Mutex<Option<fn(&Call) -> bool>>,
}

impl FakeGateway {
    pub fn calls(&self) -> Vec<Call> { self.calls.lock().iter().map(|(_, call)| call.clone()).collect() }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> { self.calls.lock().clone() }

    pub fn fail_when(&self, predicate: fn(&Call) -> bool) { *self.failing.lock() = Some(predicate); }

    fn record(&self, call: Call) -> GatewayResult<()> {
        let fails = self.failing.lock().is_some_and(|predicate| predicate(&call));
        let command = format!("{call:?}");
        self.calls.lock().push((Instant::now(), call));

        if fails {
            return Err(GatewayError::NonZeroExit { command, code: Some(1), stderr: "fake failure".to_string() });
        }
        Ok(())
    }
}

impl Gateway for FakeGateway {
    async fn list_spaces(&self) -> GatewayResult<Vec<Space>> {
        self.record(Call::ListSpaces)?;
        Ok(self.spaces.lock().clone())
    }

    async fn list_windows(&self, space: Option<u32>) -> GatewayResult<Vec<Window>> {
        self.record(Call::ListWindows(space))?;
        let windows = self.windows.lock();
        Ok(windows.iter().filter(|w| space.is_none_or(|index| w.space == index)).cloned().collect())
    }

    async fn focus_space(&self, index: u32) -> GatewayResult<()> { self.record(Call::FocusSpace(index)) }

    async fn create_space(&self) -> GatewayResult<()> { self.record(Call::CreateSpace) }

    async fn destroy_space(&self, index: u32) -> GatewayResult<()> {
        self.record(Call::DestroySpace(index))
    }

    async fn focus_window(&self, id: u64) -> GatewayResult<()> { self.record(Call::FocusWindow(id)) }

    async fn move_window(
        &self,
        id: u64,
        to_space: u32,
        insert_before: Option<u64>,
        stack: bool,
    ) -> GatewayResult<()> {
        self.record(Call::MoveWindow { id, to_space, insert_before, stack })
    }

    async fn rotate_layout(&self, rotation: Rotation) -> GatewayResult<()> {
        self.record(Call::RotateLayout(rotation))
    }

    async fn flip_layout(&self, axis: FlipAxis) -> GatewayResult<()> { self.record(Call::FlipLayout(axis)) }

    async fn balance_layout(&self) -> GatewayResult<()> { self.record(Call::BalanceLayout) }

    async fn toggle_layout(&self) -> GatewayResult<()> { self.record(Call::ToggleLayout) }

    async fn toggle_stack_all(&self) -> GatewayResult<()> { self.record(Call::ToggleStackAll) }
}
