//! Notch HUD layout arbitration.
//!
//! Music, volume and brightness overlays compete for the area around the
//! notch. The coordinator decides where each one goes and counts how many
//! overlays are on screen so consumers can tell when the notch is busy.

mod coordinator;
mod types;

pub use coordinator::HudCoordinator;
pub use types::{
    CompanionWidths, HudLayout, HudModule, HudModuleKind, HudSettings, NotchGeometry,
    PlacedModule,
};
