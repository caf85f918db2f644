//! Event ingestion and routing.
//!
//! ```text
//! yabai signal ──► aegis event <name> ──► FIFO ──► Ingestion (OS thread)
//!                                                       │ EventKind
//!                                                       ▼
//!   CommandExecutor / CLI ── RefreshPlan ──►  EventRouter (debounce, serialize)
//!                                                       │ RefreshPlan
//!                                                       ▼
//!                                           Refresher (Gateway ──► StateActor)
//! ```
//!
//! Delivery is advisory. A lost event is repaired by the periodic fallback
//! refresh or by any later event touching the same scope.

pub mod pipe;
pub mod refresh;
pub mod router;
mod types;

pub use pipe::{Ingestion, PipeSettings, write_event};
pub use refresh::{Refresher, SyncPipeline};
pub use router::{EventRouter, RouterHandle, RouterInput, RouterSettings};
pub use types::{EventKind, RefreshPlan};
