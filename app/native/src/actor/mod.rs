//! State actor module.
//!
//! The state actor owns the projection store and the HUD coordinator and
//! processes messages sequentially, so every write happens on one task
//! without locks. Everyone else either sends messages through a
//! [`StateActorHandle`] or watches through a [`StoreReader`].
//!
//! # Panic Recovery
//!
//! If a message handler panics:
//! 1. The panic is caught and logged
//! 2. The actor continues processing subsequent messages
//! 3. State may be partially inconsistent until the next full refresh

mod handle;
mod messages;
mod reader;

use std::panic::{AssertUnwindSafe, catch_unwind};

pub use handle::{ActorError, StateActorHandle};
pub use messages::{QueryResult, StateMessage, StateQuery};
pub use reader::StoreReader;
use tokio::sync::mpsc;

use crate::hud::HudCoordinator;
use crate::state::StateStore;

/// Channel buffer size for the state actor.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// The state actor that owns the projection.
pub struct StateActor {
    store: StateStore,
    hud: HudCoordinator,
    receiver: mpsc::Receiver<StateMessage>,
}

impl StateActor {
    /// Spawn the actor on the current tokio runtime.
    ///
    /// Returns the write handle and a reader subscribed to every collection.
    #[must_use]
    pub fn spawn(store: StateStore, hud: HudCoordinator) -> (StateActorHandle, StoreReader) {
        tracing::debug!("actor: spawning state actor");
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let reader = StoreReader {
            spaces: store.subscribe_spaces(),
            windows: store.subscribe_windows(),
            icons: store.subscribe_icons(),
            layout: hud.subscribe_layout(),
            overlays: hud.subscribe_overlays(),
        };

        let actor = Self { store, hud, receiver };
        tokio::spawn(actor.run());

        (StateActorHandle::new(sender), reader)
    }

    /// Run the actor's message loop.
    async fn run(mut self) {
        tracing::trace!("actor: message loop starting");

        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, StateMessage::Shutdown) {
                tracing::debug!("actor: received shutdown message");
                return;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.handle_message(msg);
            }));

            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());

                tracing::error!("actor: PANIC while handling '{msg_name}': {panic_msg}");
                tracing::error!(
                    "actor: recovered from panic - state may be stale until the next refresh"
                );
            }
        }

        tracing::debug!("actor: channel closed, exiting");
    }

    fn handle_message(&mut self, msg: StateMessage) {
        match msg {
            StateMessage::ReplaceSpaces(spaces) => {
                if self.store.replace_spaces(spaces) {
                    self.hud.set_suppressed(self.store.focused_space_is_fullscreen());
                }
            }
            StateMessage::ReplaceWindows(windows) => {
                self.store.replace_windows(windows);
            }
            StateMessage::RefreshIcons => {
                self.store.refresh_icons();
            }

            StateMessage::SetModule { kind, visible, width } => {
                let layout = self.hud.set_module(kind, visible, width);
                tracing::trace!(
                    "actor: hud layout v{} width={} occluding={}",
                    layout.version,
                    layout.total_width,
                    layout.is_occluding
                );
            }
            StateMessage::OverlayShown => {
                self.hud.overlay_shown();
            }
            StateMessage::OverlayHidden => {
                self.hud.overlay_hidden();
            }
            StateMessage::ResetOverlayState => self.hud.reset_overlay_state(),

            StateMessage::Query { query, respond_to } => {
                let result = self.execute_query(query);
                if respond_to.send(result).is_err() {
                    tracing::warn!("actor: failed to send query response (channel closed)");
                }
            }

            // Handled in run()
            StateMessage::Shutdown => {}
        }
    }

    fn execute_query(&self, query: StateQuery) -> QueryResult {
        match query {
            StateQuery::GetSpaces => QueryResult::Spaces(self.store.spaces().to_vec()),
            StateQuery::GetWindows => QueryResult::Windows(self.store.windows().to_vec()),
            StateQuery::GetIcons => QueryResult::Icons(self.store.icons().to_vec()),
            StateQuery::GetHudLayout => QueryResult::Layout(self.hud.layout().clone()),
            StateQuery::GetOverlayCount => QueryResult::Count(self.hud.overlay_count()),
            StateQuery::GetFocusedSpace => QueryResult::Space(self.store.focused_space().cloned()),
            StateQuery::GetSpaceOfWindow { window_id } => QueryResult::SpaceIndex(
                self.store.windows().iter().find(|w| w.id == window_id).map(|w| w.space),
            ),
        }
    }
}
