//! State projection of the window manager.
//!
//! This module contains:
//! - Core types (`Space`, `Window`, `WindowIcon`, `Rect`, etc.)
//! - The `StateStore` with observable collections
//! - Icon resolution for the window projection

pub mod icons;
mod store;
mod types;

pub use icons::{BundleIconResolver, IconResolver};
pub use store::StateStore;
pub use types::{
    AppIcon, Rect, STANDARD_WINDOW_ROLE, STANDARD_WINDOW_SUBROLE, Space, SpaceKind, Window,
    WindowIcon,
};
