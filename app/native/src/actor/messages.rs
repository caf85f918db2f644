//! Message types for the state actor.
//!
//! All writes to the projection go through these messages:
//! - `StateMessage` - snapshots and HUD updates sent to the actor
//! - `StateQuery` - requests for state data (with response channel)
//! - `QueryResult` - responses from queries

use tokio::sync::oneshot;

use crate::hud::{HudLayout, HudModuleKind};
use crate::state::{Space, Window, WindowIcon};

// ============================================================================
// State Messages
// ============================================================================

/// Messages sent to the state actor.
#[derive(Debug)]
pub enum StateMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Snapshots (from the router's refresh pipeline)
    // ════════════════════════════════════════════════════════════════════════
    /// Replace the space collection.
    ReplaceSpaces(Vec<Space>),

    /// Replace the window collection and rebuild icons.
    ReplaceWindows(Vec<Window>),

    /// Re-resolve application icons.
    RefreshIcons,

    // ════════════════════════════════════════════════════════════════════════
    // HUD (from presentation consumers)
    // ════════════════════════════════════════════════════════════════════════
    /// Show, resize or hide a HUD module.
    SetModule {
        kind: HudModuleKind,
        visible: bool,
        width: f64,
    },

    OverlayShown,

    OverlayHidden,

    /// Force the overlay counter back to zero.
    ResetOverlayState,

    // ════════════════════════════════════════════════════════════════════════
    // Internal
    // ════════════════════════════════════════════════════════════════════════
    /// Query the current state.
    Query {
        query: StateQuery,
        respond_to: oneshot::Sender<QueryResult>,
    },

    /// Shutdown the actor gracefully.
    Shutdown,
}

impl StateMessage {
    /// Returns a human-readable name for this message type.
    ///
    /// Used for logging, especially in panic recovery.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReplaceSpaces(_) => "ReplaceSpaces",
            Self::ReplaceWindows(_) => "ReplaceWindows",
            Self::RefreshIcons => "RefreshIcons",
            Self::SetModule { .. } => "SetModule",
            Self::OverlayShown => "OverlayShown",
            Self::OverlayHidden => "OverlayHidden",
            Self::ResetOverlayState => "ResetOverlayState",
            Self::Query { .. } => "Query",
            Self::Shutdown => "Shutdown",
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Queries that can be executed against the state.
#[derive(Debug, Clone)]
pub enum StateQuery {
    // Snapshots
    GetSpaces,
    GetWindows,
    GetIcons,
    GetHudLayout,
    GetOverlayCount,

    // Lookups
    GetFocusedSpace,
    GetSpaceOfWindow { window_id: u64 },
}

/// Results from queries.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Spaces(Vec<Space>),
    Windows(Vec<Window>),
    Icons(Vec<WindowIcon>),
    Space(Option<Space>),
    SpaceIndex(Option<u32>),
    Layout(HudLayout),
    Count(u32),
}

impl QueryResult {
    #[must_use]
    pub fn into_spaces(self) -> Option<Vec<Space>> {
        match self {
            Self::Spaces(spaces) => Some(spaces),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_windows(self) -> Option<Vec<Window>> {
        match self {
            Self::Windows(windows) => Some(windows),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_icons(self) -> Option<Vec<WindowIcon>> {
        match self {
            Self::Icons(icons) => Some(icons),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_space(self) -> Option<Option<Space>> {
        match self {
            Self::Space(space) => Some(space),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_space_index(self) -> Option<Option<u32>> {
        match self {
            Self::SpaceIndex(index) => Some(index),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_layout(self) -> Option<HudLayout> {
        match self {
            Self::Layout(layout) => Some(layout),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_count(self) -> Option<u32> {
        match self {
            Self::Count(count) => Some(count),
            _ => None,
        }
    }
}
