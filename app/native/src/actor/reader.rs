//! Read-only view of the projection for presentation consumers.

use eyeball::Subscriber;

use crate::hud::HudLayout;
use crate::state::{Space, Window, WindowIcon};

/// Read-only access to everything the state actor publishes.
///
/// Cloning is cheap. Each clone observes independently, so one consumer
/// awaiting a change never steals it from another.
#[derive(Clone)]
pub struct StoreReader {
    pub(super) spaces: Subscriber<Vec<Space>>,
    pub(super) windows: Subscriber<Vec<Window>>,
    pub(super) icons: Subscriber<Vec<WindowIcon>>,
    pub(super) layout: Subscriber<HudLayout>,
    pub(super) overlays: Subscriber<u32>,
}

impl StoreReader {
    // ========================================================================
    // Snapshots
    // ========================================================================

    #[must_use]
    pub fn spaces(&self) -> Vec<Space> { self.spaces.get() }

    #[must_use]
    pub fn windows(&self) -> Vec<Window> { self.windows.get() }

    #[must_use]
    pub fn icons(&self) -> Vec<WindowIcon> { self.icons.get() }

    #[must_use]
    pub fn hud_layout(&self) -> HudLayout { self.layout.get() }

    #[must_use]
    pub fn overlay_count(&self) -> u32 { self.overlays.get() }

    #[must_use]
    pub fn focused_space(&self) -> Option<Space> {
        self.spaces().into_iter().find(|space| space.is_focused)
    }

    /// Index of the space the window was on in the last snapshot.
    #[must_use]
    pub fn space_of_window(&self, window_id: u64) -> Option<u32> {
        self.windows().iter().find(|window| window.id == window_id).map(|window| window.space)
    }

    // ========================================================================
    // Change streams
    // ========================================================================

    #[must_use]
    pub fn subscribe_spaces(&self) -> Subscriber<Vec<Space>> { self.spaces.clone() }

    #[must_use]
    pub fn subscribe_windows(&self) -> Subscriber<Vec<Window>> { self.windows.clone() }

    #[must_use]
    pub fn subscribe_icons(&self) -> Subscriber<Vec<WindowIcon>> { self.icons.clone() }

    #[must_use]
    pub fn subscribe_hud_layout(&self) -> Subscriber<HudLayout> { self.layout.clone() }

    #[must_use]
    pub fn subscribe_overlay_count(&self) -> Subscriber<u32> { self.overlays.clone() }
}

impl std::fmt::Debug for StoreReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreReader")
            .field("spaces", &self.spaces.get().len())
            .field("windows", &self.windows.get().len())
            .field("overlays", &self.overlays.get())
            .finish_non_exhaustive()
    }
}
