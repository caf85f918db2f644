//! HUD module and layout types.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::HudConfig;

/// The overlay widgets that share the notch area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HudModuleKind {
    Music,
    Volume,
    Brightness,
}

impl HudModuleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Volume => "volume",
            Self::Brightness => "brightness",
        }
    }
}

/// A module the consumer asked to show.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HudModule {
    pub kind: HudModuleKind,
    /// Content width in points, excluding the companion element.
    pub width: f64,
    pub visible: bool,
}

/// Physical exclusion zone at the top center of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotchGeometry {
    pub screen_width: f64,
    pub notch_width: f64,
    pub notch_height: f64,
    /// Breathing room added around the occupied area.
    pub padding: f64,
}

impl NotchGeometry {
    #[must_use]
    pub fn center(&self) -> f64 { self.screen_width / 2.0 }

    #[must_use]
    pub fn notch_start(&self) -> f64 { self.center() - self.notch_width / 2.0 }

    #[must_use]
    pub fn notch_end(&self) -> f64 { self.center() + self.notch_width / 2.0 }
}

/// Companion element widths (album art, volume glyph, brightness glyph).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompanionWidths {
    pub music: f64,
    pub volume: f64,
    pub brightness: f64,
}

impl CompanionWidths {
    #[must_use]
    pub const fn of(&self, kind: HudModuleKind) -> f64 {
        match kind {
            HudModuleKind::Music => self.music,
            HudModuleKind::Volume => self.volume,
            HudModuleKind::Brightness => self.brightness,
        }
    }
}

/// Everything the placement engine needs, taken from the `hud` config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudSettings {
    pub geometry: NotchGeometry,
    pub spacing: f64,
    pub companions: CompanionWidths,
}

impl From<&HudConfig> for HudSettings {
    fn from(config: &HudConfig) -> Self {
        Self {
            geometry: NotchGeometry {
                screen_width: config.screen_width,
                notch_width: config.notch_width,
                notch_height: config.notch_height,
                padding: config.notch_padding,
            },
            spacing: config.module_spacing,
            companions: CompanionWidths {
                music: config.music_companion_width,
                volume: config.volume_companion_width,
                brightness: config.brightness_companion_width,
            },
        }
    }
}

/// A module with its resolved horizontal span in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedModule {
    pub kind: HudModuleKind,
    pub width: f64,
    pub start: f64,
    pub end: f64,
}

/// Published result of a placement pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HudLayout {
    /// Active modules, left to right.
    pub modules: SmallVec<[PlacedModule; 3]>,
    /// Extent covered by every span; 0 when nothing is shown.
    pub total_width: f64,
    /// Whether content extends beyond the notch.
    pub is_occluding: bool,
    /// How far neighbouring content has to move outward.
    pub push_offset: f64,
    pub left_edge: f64,
    pub right_edge: f64,
    /// Incremented on every recomputation.
    pub version: u64,
    /// The focused space is native fullscreen; renderers should stay hidden.
    pub suppressed: bool,
}

impl HudLayout {
    #[must_use]
    pub fn contains(&self, kind: HudModuleKind) -> bool {
        self.modules.iter().any(|module| module.kind == kind)
    }
}
