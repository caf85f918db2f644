//! Handle for communicating with the state actor.
//!
//! The `StateActorHandle` provides a cloneable interface for sending messages
//! to the state actor. It is the only way to write to the projection.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::messages::{QueryResult, StateMessage, StateQuery};
use crate::hud::{HudLayout, HudModuleKind};
use crate::state::{Space, Window, WindowIcon};

/// Error types for actor communication.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to actor: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from actor: channel closed")]
    ReceiveFailed,

    /// The actor answered with a result of the wrong kind.
    #[error("Unexpected query result: {0}")]
    UnexpectedResult(&'static str),

    /// Query timed out.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
}

/// Handle for communicating with the state actor.
///
/// This handle is cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct StateActorHandle {
    sender: mpsc::Sender<StateMessage>,
}

impl StateActorHandle {
    /// Create a new handle with the given sender.
    pub(crate) const fn new(sender: mpsc::Sender<StateMessage>) -> Self { Self { sender } }

    // ========================================================================
    // Fire-and-forget sending
    // ========================================================================

    /// Send a message to the actor without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, msg: StateMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message to the actor and wait for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn send_async(&self, msg: StateMessage) -> Result<(), ActorError> {
        self.sender.send(msg).await.map_err(|_| ActorError::SendFailed)
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Execute a query and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed, or
    /// [`ActorError::ReceiveFailed`] if the response channel is closed.
    pub async fn query(&self, query: StateQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(StateMessage::Query { query, respond_to: tx })
            .await
            .map_err(|_| ActorError::SendFailed)?;

        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Execute a query with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the query doesn't complete in time,
    /// or any error from [`Self::query`].
    pub async fn query_timeout(
        &self,
        query: StateQuery,
        timeout: Duration,
    ) -> Result<QueryResult, ActorError> {
        tokio::time::timeout(timeout, self.query(query))
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    // ========================================================================
    // Convenience methods
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn replace_spaces(&self, spaces: Vec<Space>) -> Result<(), ActorError> {
        self.send_async(StateMessage::ReplaceSpaces(spaces)).await
    }

    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn replace_windows(&self, windows: Vec<Window>) -> Result<(), ActorError> {
        self.send_async(StateMessage::ReplaceWindows(windows)).await
    }

    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn refresh_icons(&self) -> Result<(), ActorError> {
        self.send_async(StateMessage::RefreshIcons).await
    }

    /// Show (`visible`) or remove a HUD module.
    ///
    /// Waits for queue space so a burst of updates is never dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn set_module(
        &self,
        kind: HudModuleKind,
        visible: bool,
        width: f64,
    ) -> Result<(), ActorError> {
        self.send_async(StateMessage::SetModule { kind, visible, width }).await
    }

    /// Counts one more visible overlay.
    ///
    /// Overlay messages are delivered with backpressure: a dropped
    /// `overlay_hidden` would leave the counter stuck above zero.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn overlay_shown(&self) -> Result<(), ActorError> {
        self.send_async(StateMessage::OverlayShown).await
    }

    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn overlay_hidden(&self) -> Result<(), ActorError> {
        self.send_async(StateMessage::OverlayHidden).await
    }

    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn reset_overlay_state(&self) -> Result<(), ActorError> {
        self.send_async(StateMessage::ResetOverlayState).await
    }

    /// Get all spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_spaces(&self) -> Result<Vec<Space>, ActorError> {
        self.query(StateQuery::GetSpaces)
            .await?
            .into_spaces()
            .ok_or(ActorError::UnexpectedResult("spaces"))
    }

    /// Get all windows.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_windows(&self) -> Result<Vec<Window>, ActorError> {
        self.query(StateQuery::GetWindows)
            .await?
            .into_windows()
            .ok_or(ActorError::UnexpectedResult("windows"))
    }

    /// Get the icon strip projection.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_icons(&self) -> Result<Vec<WindowIcon>, ActorError> {
        self.query(StateQuery::GetIcons)
            .await?
            .into_icons()
            .ok_or(ActorError::UnexpectedResult("icons"))
    }

    /// Get the focused space, if yabai reported one.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_focused_space(&self) -> Result<Option<Space>, ActorError> {
        self.query(StateQuery::GetFocusedSpace)
            .await?
            .into_space()
            .ok_or(ActorError::UnexpectedResult("focused space"))
    }

    /// Get the index of the space a window is on.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_space_of_window(&self, window_id: u64) -> Result<Option<u32>, ActorError> {
        self.query(StateQuery::GetSpaceOfWindow { window_id })
            .await?
            .into_space_index()
            .ok_or(ActorError::UnexpectedResult("space index"))
    }

    /// Get the current HUD layout.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_hud_layout(&self) -> Result<HudLayout, ActorError> {
        self.query(StateQuery::GetHudLayout)
            .await?
            .into_layout()
            .ok_or(ActorError::UnexpectedResult("hud layout"))
    }

    /// Get the number of visible overlays.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn get_overlay_count(&self) -> Result<u32, ActorError> {
        self.query(StateQuery::GetOverlayCount)
            .await?
            .into_count()
            .ok_or(ActorError::UnexpectedResult("overlay count"))
    }

    /// Ask the actor to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor already stopped.
    pub fn shutdown(&self) -> Result<(), ActorError> { self.send(StateMessage::Shutdown) }

    /// Check if the actor is still running (channel is open).
    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }

    /// Get the number of messages waiting in the queue.
    #[must_use]
    pub fn pending_messages(&self) -> usize { self.sender.max_capacity() - self.sender.capacity() }
}

impl std::fmt::Debug for StateActorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateActorHandle")
            .field("alive", &self.is_alive())
            .field("pending", &self.pending_messages())
            .finish()
    }
}
