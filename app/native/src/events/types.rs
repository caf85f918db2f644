//! Event kinds and refresh plans.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A notification from the window manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    SpaceChanged,
    SpaceDestroyed,
    WindowFocused,
    WindowCreated,
    WindowDestroyed,
    WindowMoved,
    AppFrontSwitched,
    Unknown,
}

impl EventKind {
    /// Parses a yabai event name.
    ///
    /// Accepts the window manager's snake_case names and their camelCase
    /// spelling. Anything else is [`EventKind::Unknown`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "space_changed" | "spaceChanged" => Self::SpaceChanged,
            "space_destroyed" | "spaceDestroyed" => Self::SpaceDestroyed,
            "window_focused" | "windowFocused" => Self::WindowFocused,
            "window_created" | "windowCreated" => Self::WindowCreated,
            "window_destroyed" | "windowDestroyed" => Self::WindowDestroyed,
            "window_moved" | "windowMoved" => Self::WindowMoved,
            "application_front_switched" | "appFrontSwitched" => Self::AppFrontSwitched,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpaceChanged => "space_changed",
            Self::SpaceDestroyed => "space_destroyed",
            Self::WindowFocused => "window_focused",
            Self::WindowCreated => "window_created",
            Self::WindowDestroyed => "window_destroyed",
            Self::WindowMoved => "window_moved",
            Self::AppFrontSwitched => "application_front_switched",
            Self::Unknown => "unknown",
        }
    }

    /// What has to be re-read after this event.
    #[must_use]
    pub const fn scope(self) -> RefreshPlan {
        match self {
            Self::WindowCreated | Self::WindowDestroyed | Self::WindowMoved | Self::SpaceDestroyed => {
                RefreshPlan::FULL
            }
            Self::SpaceChanged => RefreshPlan::SPACES_AND_FOCUS,
            Self::WindowFocused => RefreshPlan::FOCUS,
            Self::AppFrontSwitched => RefreshPlan::ICONS,
            Self::Unknown => RefreshPlan::NONE,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// The parts of the projection a refresh re-reads.
///
/// Plans combine with `|`. A plan that re-reads windows already covers focus
/// and icons, so those flags are dropped from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RefreshPlan {
    pub spaces: bool,
    pub windows: bool,
    /// Window focus flags only.
    pub focus: bool,
    /// Application icon metadata only.
    pub icons: bool,
}

impl RefreshPlan {
    pub const NONE: Self = Self { spaces: false, windows: false, focus: false, icons: false };
    pub const FULL: Self = Self { spaces: true, windows: true, focus: false, icons: false };
    pub const SPACES_AND_FOCUS: Self = Self { spaces: true, windows: false, focus: true, icons: false };
    pub const FOCUS: Self = Self { spaces: false, windows: false, focus: true, icons: false };
    pub const ICONS: Self = Self { spaces: false, windows: false, focus: false, icons: true };

    #[must_use]
    pub const fn is_empty(self) -> bool { !(self.spaces || self.windows || self.focus || self.icons) }

    /// Whether the window list has to be queried.
    #[must_use]
    pub const fn reads_windows(self) -> bool { self.windows || self.focus }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        let windows = self.windows || other.windows;
        Self {
            spaces: self.spaces || other.spaces,
            windows,
            focus: !windows && (self.focus || other.focus),
            icons: !windows && (self.icons || other.icons),
        }
    }
}

impl BitOr for RefreshPlan {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self { self.union(rhs) }
}

impl BitOrAssign for RefreshPlan {
    fn bitor_assign(&mut self, rhs: Self) { *self = self.union(rhs); }
}

impl fmt::Display for RefreshPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let parts = [
            (self.spaces, "spaces"),
            (self.windows, "windows"),
            (self.focus, "focus"),
            (self.icons, "icons"),
        ];
        let names: Vec<&str> =
            parts.iter().filter(|(enabled, _)| *enabled).map(|(_, name)| *name).collect();
        f.write_str(&names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_spellings() {
        assert_eq!(EventKind::parse("space_changed"), EventKind::SpaceChanged);
        assert_eq!(EventKind::parse("spaceChanged"), EventKind::SpaceChanged);
        assert_eq!(EventKind::parse("application_front_switched"), EventKind::AppFrontSwitched);
        assert_eq!(EventKind::parse("appFrontSwitched"), EventKind::AppFrontSwitched);
        assert_eq!(EventKind::parse("window_moved\r"), EventKind::WindowMoved);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(EventKind::parse(""), EventKind::Unknown);
        assert_eq!(EventKind::parse("display_added"), EventKind::Unknown);
        assert_eq!(EventKind::parse("WINDOW_MOVED"), EventKind::Unknown);
    }

    #[test]
    fn test_scopes() {
        assert_eq!(EventKind::WindowCreated.scope(), RefreshPlan::FULL);
        assert_eq!(EventKind::SpaceDestroyed.scope(), RefreshPlan::FULL);
        assert_eq!(EventKind::SpaceChanged.scope(), RefreshPlan::SPACES_AND_FOCUS);
        assert_eq!(EventKind::WindowFocused.scope(), RefreshPlan::FOCUS);
        assert_eq!(EventKind::AppFrontSwitched.scope(), RefreshPlan::ICONS);
        assert!(EventKind::Unknown.scope().is_empty());
    }

    #[test]
    fn test_full_subsumes_focus_and_icons() {
        assert_eq!(RefreshPlan::FOCUS | RefreshPlan::FULL, RefreshPlan::FULL);
        assert_eq!(RefreshPlan::ICONS | RefreshPlan::FULL | RefreshPlan::FOCUS, RefreshPlan::FULL);
    }

    #[test]
    fn test_partial_scopes_accumulate() {
        let mut plan = RefreshPlan::NONE;
        plan |= RefreshPlan::FOCUS;
        plan |= RefreshPlan::ICONS;
        assert!(plan.focus && plan.icons);
        assert!(!plan.spaces);
        assert!(plan.reads_windows());
        assert_eq!(plan.to_string(), "focus+icons");
    }

    #[test]
    fn test_union_is_idempotent() {
        for kind in [
            EventKind::SpaceChanged,
            EventKind::WindowFocused,
            EventKind::WindowMoved,
            EventKind::AppFrontSwitched,
        ] {
            assert_eq!(kind.scope() | kind.scope(), kind.scope());
        }
        assert_eq!(RefreshPlan::NONE.to_string(), "none");
    }

    #[test]
    fn test_event_name_round_trip() {
        for kind in [
            EventKind::SpaceChanged,
            EventKind::SpaceDestroyed,
            EventKind::WindowFocused,
            EventKind::WindowCreated,
            EventKind::WindowDestroyed,
            EventKind::WindowMoved,
            EventKind::AppFrontSwitched,
        ] {
            assert_eq!(EventKind::parse(kind.as_str()), kind);
        }
    }
}
