//! Canonical models mirrored from the window manager.
//!
//! These types are what the gateway produces and what the store publishes:
//! - `Space` is a virtual desktop (id and index from yabai)
//! - `Window` is an application surface (id from yabai)
//! - `WindowIcon` is the presentation projection of a displayable `Window`
//!
//! Relations:
//! - `Window.space` → `Space.index`
//! - `Space.windows` → list of `Window.id`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Accessibility role of regular application windows.
pub const STANDARD_WINDOW_ROLE: &str = "AXWindow";

/// Accessibility subrole of regular application windows.
pub const STANDARD_WINDOW_SUBROLE: &str = "AXStandardWindow";

// ============================================================================
// Geometry Types
// ============================================================================

/// A rectangle with position and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Whether both sides are positive. yabai reports hidden and minimized
    /// windows with an empty frame.
    #[must_use]
    pub fn is_valid(&self) -> bool { self.width > 0.0 && self.height > 0.0 }
}

// ============================================================================
// Space
// ============================================================================

/// How a space arranges its windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpaceKind {
    /// Managed by the tiling engine (yabai `bsp` or `stack`).
    #[default]
    Tiled,
    /// Windows float freely (yabai `float`).
    Floating,
    /// A macOS native fullscreen space.
    Fullscreen,
}

impl SpaceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tiled => "tiled",
            Self::Floating => "floating",
            Self::Fullscreen => "fullscreen",
        }
    }
}

/// A virtual desktop tracked by the window manager.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// Window manager space id (stable while the space exists).
    pub id: u64,

    /// Mission Control index (1-based, changes when spaces are reordered).
    pub index: u32,

    /// User label, if one was assigned.
    pub label: Option<String>,

    /// Layout kind.
    pub kind: SpaceKind,

    /// Display index this space belongs to.
    pub display: u32,

    /// Whether this space has keyboard focus.
    pub is_focused: bool,

    /// Whether this space is currently shown on its display.
    pub is_visible: bool,

    /// Whether this is a macOS native fullscreen space.
    pub is_native_fullscreen: bool,

    /// Ids of the windows on this space, in the window manager's order.
    pub windows: SmallVec<[u64; 8]>,
}

impl Space {
    /// Returns the label when set, otherwise the index as a string.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.index.to_string())
    }
}

// ============================================================================
// Window
// ============================================================================

/// An application window tracked by the window manager.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Window manager window id.
    pub id: u64,

    /// Owning process id.
    pub pid: i32,

    /// Owning application name.
    pub app: String,

    /// Window title.
    pub title: String,

    /// Index of the space this window is on.
    pub space: u32,

    /// Display index this window is on.
    pub display: u32,

    /// Frame in screen coordinates, when reported.
    pub frame: Option<Rect>,

    /// Accessibility role (e.g. "AXWindow").
    pub role: String,

    /// Accessibility subrole (e.g. "AXStandardWindow", "AXDialog").
    pub subrole: String,

    /// Position in a stack; 0 when not stacked.
    pub stack_index: u32,

    /// Whether this window has keyboard focus.
    pub is_focused: bool,

    /// Whether this window is in native fullscreen.
    pub is_native_fullscreen: bool,

    /// Whether this window floats above the tiling layout.
    pub is_floating: bool,

    /// Whether this window is minimized to the Dock.
    pub is_minimized: bool,

    /// Whether the owning application is hidden.
    pub is_hidden: bool,

    /// Whether this window is currently on screen.
    pub is_visible: bool,
}

impl Window {
    /// Whether this window is part of a stacked group.
    #[must_use]
    pub const fn is_stacked(&self) -> bool { self.stack_index > 0 }

    /// Whether this window is a regular application window.
    ///
    /// Dialogs, sheets, popovers and other system surfaces are excluded from
    /// icon projection.
    #[must_use]
    pub fn is_displayable(&self) -> bool {
        self.role == STANDARD_WINDOW_ROLE && self.subrole == STANDARD_WINDOW_SUBROLE
    }
}

// ============================================================================
// Presentation projections
// ============================================================================

/// Application icon resolved for a window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIcon {
    /// Application name the icon was resolved for.
    pub app: String,

    /// Application bundle the renderer loads the icon from, when found.
    pub bundle_path: Option<PathBuf>,
}

/// Read-only projection of a displayable window for icon strips.
///
/// Rebuilt wholesale whenever the window set changes; never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowIcon {
    /// The projected window.
    pub window: Window,

    /// Resolved application icon.
    pub icon: AppIcon,

    /// Width reserved for the title label, in points.
    pub label_width: f64,
}

impl WindowIcon {
    #[must_use]
    pub const fn id(&self) -> u64 { self.window.id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(role: &str, subrole: &str) -> Window {
        Window {
            id: 1,
            role: role.to_string(),
            subrole: subrole.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_window_is_displayable() {
        assert!(window("AXWindow", "AXStandardWindow").is_displayable());
    }

    #[test]
    fn test_dialog_and_system_surfaces_are_not_displayable() {
        assert!(!window("AXWindow", "AXDialog").is_displayable());
        assert!(!window("AXWindow", "AXFloatingWindow").is_displayable());
        assert!(!window("AXPopover", "").is_displayable());
        assert!(!window("", "").is_displayable());
    }

    #[test]
    fn test_stack_index_marks_stacked_windows() {
        let mut w = window("AXWindow", "AXStandardWindow");
        assert!(!w.is_stacked());
        w.stack_index = 2;
        assert!(w.is_stacked());
    }

    #[test]
    fn test_space_display_name_prefers_label() {
        let mut space = Space { index: 3, ..Default::default() };
        assert_eq!(space.display_name(), "3");
        space.label = Some("code".to_string());
        assert_eq!(space.display_name(), "code");
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::new(0.0, 0.0, 10.0, 10.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 0.0, 10.0).is_valid());
    }
}
