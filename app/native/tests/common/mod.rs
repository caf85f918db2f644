//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use aegis_lib::actor::{StateActor, StateActorHandle, StoreReader};
use aegis_lib::config::{HudConfig, IconsConfig};
use aegis_lib::events::{EventRouter, RouterHandle, RouterSettings, SyncPipeline};
use aegis_lib::hud::{HudCoordinator, HudSettings};
use aegis_lib::state::{
    BundleIconResolver, STANDARD_WINDOW_ROLE, STANDARD_WINDOW_SUBROLE, Space, SpaceKind,
    StateStore, Window,
};
use aegis_lib::yabai::{FlipAxis, Gateway, GatewayResult, Rotation};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Gateway call as seen by [`RecordingGateway`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    ListSpaces,
    ListWindows(Option<u32>),
    FocusSpace(u32),
    MoveWindow { id: u64, to_space: u32, insert_before: Option<u64>, stack: bool },
    Other(&'static str),
}

/// In-memory window manager that records every call.
#[derive(Default)]
pub struct RecordingGateway {
    pub calls: Mutex<Vec<(Instant, Recorded)>>,
    pub spaces: Mutex<Vec<Space>>,
    pub windows: Mutex<Vec<Window>>,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<Recorded> { self.calls.lock().iter().map(|(_, c)| c.clone()).collect() }

    pub fn count(&self, call: &Recorded) -> usize {
        self.calls.lock().iter().filter(|(_, c)| c == call).count()
    }

    pub fn time_of(&self, call: &Recorded) -> Option<Instant> {
        self.calls.lock().iter().find(|(_, c)| c == call).map(|(at, _)| *at)
    }

    fn record(&self, call: Recorded) { self.calls.lock().push((Instant::now(), call)); }
}

impl Gateway for RecordingGateway {
    async fn list_spaces(&self) -> GatewayResult<Vec<Space>> {
        self.record(Recorded::ListSpaces);
        Ok(self.spaces.lock().clone())
    }

    async fn list_windows(&self, space: Option<u32>) -> GatewayResult<Vec<Window>> {
        self.record(Recorded::ListWindows(space));
        Ok(self.windows.lock().clone())
    }

    async fn focus_space(&self, index: u32) -> GatewayResult<()> {
        self.record(Recorded::FocusSpace(index));
        // The window manager moves focus; mirror that in the canned data.
        for space in self.spaces.lock().iter_mut() {
            space.is_focused = space.index == index;
        }
        Ok(())
    }

    async fn create_space(&self) -> GatewayResult<()> {
        self.record(Recorded::Other("create_space"));
        Ok(())
    }

    async fn destroy_space(&self, _index: u32) -> GatewayResult<()> {
        self.record(Recorded::Other("destroy_space"));
        Ok(())
    }

    async fn focus_window(&self, _id: u64) -> GatewayResult<()> {
        self.record(Recorded::Other("focus_window"));
        Ok(())
    }

    async fn move_window(
        &self,
        id: u64,
        to_space: u32,
        insert_before: Option<u64>,
        stack: bool,
    ) -> GatewayResult<()> {
        self.record(Recorded::MoveWindow { id, to_space, insert_before, stack });
        for window in self.windows.lock().iter_mut().filter(|w| w.id == id) {
            window.space = to_space;
        }
        Ok(())
    }

    async fn rotate_layout(&self, _rotation: Rotation) -> GatewayResult<()> {
        self.record(Recorded::Other("rotate_layout"));
        Ok(())
    }

    async fn flip_layout(&self, _axis: FlipAxis) -> GatewayResult<()> {
        self.record(Recorded::Other("flip_layout"));
        Ok(())
    }

    async fn balance_layout(&self) -> GatewayResult<()> {
        self.record(Recorded::Other("balance_layout"));
        Ok(())
    }

    async fn toggle_layout(&self) -> GatewayResult<()> {
        self.record(Recorded::Other("toggle_layout"));
        Ok(())
    }

    async fn toggle_stack_all(&self) -> GatewayResult<()> {
        self.record(Recorded::Other("toggle_stack_all"));
        Ok(())
    }
}

pub fn space(index: u32, kind: SpaceKind, focused: bool) -> Space {
    Space {
        id: u64::from(index) + 100,
        index,
        kind,
        display: 1,
        is_focused: focused,
        is_visible: focused,
        is_native_fullscreen: kind == SpaceKind::Fullscreen,
        ..Space::default()
    }
}

pub fn window(id: u64, app: &str, space: u32) -> Window {
    Window {
        id,
        pid: 1,
        app: app.to_string(),
        title: format!("{app} {id}"),
        space,
        display: 1,
        role: STANDARD_WINDOW_ROLE.to_string(),
        subrole: STANDARD_WINDOW_SUBROLE.to_string(),
        is_visible: true,
        ..Window::default()
    }
}

/// Actor, router and gateway wired the way the daemon wires them.
pub struct Harness {
    pub gateway: Arc<RecordingGateway>,
    pub actor: StateActorHandle,
    pub reader: StoreReader,
    pub router: RouterHandle,
}

impl Harness {
    pub fn start(gateway: RecordingGateway, settings: RouterSettings) -> Self {
        let gateway = Arc::new(gateway);
        let store = StateStore::new(Box::new(BundleIconResolver::new(Vec::new())), IconsConfig::default());
        let hud = HudCoordinator::new(HudSettings::from(&HudConfig::default()));
        let (actor, reader) = StateActor::spawn(store, hud);
        let router =
            EventRouter::spawn(SyncPipeline::new(Arc::clone(&gateway), actor.clone()), settings);
        Self { gateway, actor, reader, router }
    }
}

pub fn quick_settings() -> RouterSettings {
    RouterSettings {
        debounce: Duration::from_millis(100),
        max_debounce: Duration::from_millis(500),
        fallback: None,
    }
}

/// Polls `condition` every 5 ms for up to `limit`.
pub async fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
