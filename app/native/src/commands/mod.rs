//! User intents and their execution.
//!
//! Every action a presentation layer or the CLI can take is an [`Intent`].
//! The executor turns it into gateway calls, reports failures to the caller
//! and, on success, asks the router to re-read whatever the intent touched.
//! It never writes to the projection itself.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::actor::StoreReader;
use crate::config::CommandsConfig;
use crate::error::AegisError;
use crate::events::{RefreshPlan, RouterHandle};
use crate::yabai::{FlipAxis, Gateway, Rotation};

/// An action requested by a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    FocusSpace { index: u32 },
    CreateSpace,
    DestroySpace { index: u32 },
    FocusWindow { id: u64 },
    /// Move a window without following it.
    MoveWindow(WindowMove),
    /// A window dropped onto a space; focus follows it there.
    DropWindow(WindowMove),
    RotateLayout(Rotation),
    FlipLayout(FlipAxis),
    BalanceLayout,
    ToggleLayout,
    ToggleStackAll,
}

/// Target of a window move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMove {
    pub id: u64,
    pub to_space: u32,
    /// Window to insert before (or stack onto).
    pub insert_before: Option<u64>,
    /// Join the destination stack instead of the tiling order.
    pub stack: bool,
}

impl Intent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FocusSpace { .. } => "focus-space",
            Self::CreateSpace => "create-space",
            Self::DestroySpace { .. } => "destroy-space",
            Self::FocusWindow { .. } => "focus-window",
            Self::MoveWindow(_) => "move-window",
            Self::DropWindow(_) => "drop-window",
            Self::RotateLayout(_) => "rotate-layout",
            Self::FlipLayout(_) => "flip-layout",
            Self::BalanceLayout => "balance-layout",
            Self::ToggleLayout => "toggle-layout",
            Self::ToggleStackAll => "toggle-stack-all",
        }
    }

    /// What the router should re-read after the intent succeeded.
    #[must_use]
    pub const fn refresh_scope(&self) -> RefreshPlan {
        match self {
            Self::FocusSpace { .. } => RefreshPlan::SPACES_AND_FOCUS,
            Self::FocusWindow { .. } => RefreshPlan::FOCUS,
            Self::CreateSpace
            | Self::DestroySpace { .. }
            | Self::MoveWindow(_)
            | Self::DropWindow(_)
            | Self::RotateLayout(_)
            | Self::FlipLayout(_)
            | Self::BalanceLayout
            | Self::ToggleLayout
            | Self::ToggleStackAll => RefreshPlan::FULL,
        }
    }

    fn validate(&self) -> Result<(), AegisError> {
        let index = match self {
            Self::FocusSpace { index } | Self::DestroySpace { index } => *index,
            Self::MoveWindow(target) | Self::DropWindow(target) => target.to_space,
            _ => return Ok(()),
        };

        if index == 0 {
            return Err(AegisError::InvalidArguments(format!(
                "{}: space indexes start at 1",
                self.name()
            )));
        }
        Ok(())
    }
}

/// Executes intents against a gateway.
pub struct CommandExecutor<G> {
    gateway: Arc<G>,
    router: Option<RouterHandle>,
    reader: Option<StoreReader>,
    focus_follow_delay: Duration,
    follow_ups: Mutex<Vec<JoinHandle<()>>>,
}

impl<G: Gateway> CommandExecutor<G> {
    #[must_use]
    pub fn new(gateway: Arc<G>, config: &CommandsConfig) -> Self {
        Self {
            gateway,
            router: None,
            reader: None,
            focus_follow_delay: config.focus_follow_delay(),
            follow_ups: Mutex::new(Vec::new()),
        }
    }

    /// Requests refreshes from `router` after successful intents.
    #[must_use]
    pub fn with_router(mut self, router: RouterHandle) -> Self {
        self.router = Some(router);
        self
    }

    /// Reads window locations from `reader` when handling drops.
    #[must_use]
    pub fn with_reader(mut self, reader: StoreReader) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Runs one intent.
    ///
    /// # Errors
    ///
    /// Returns [`AegisError::InvalidArguments`] for out-of-range arguments and
    /// [`AegisError::CommandFailure`] when the gateway rejects the command.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), AegisError> {
        intent.validate()?;
        tracing::debug!("commands: {} {intent:?}", intent.name());

        let result = match intent {
            Intent::FocusSpace { index } => self.gateway.focus_space(index).await,
            Intent::CreateSpace => self.gateway.create_space().await,
            Intent::DestroySpace { index } => self.gateway.destroy_space(index).await,
            Intent::FocusWindow { id } => self.gateway.focus_window(id).await,
            Intent::MoveWindow(target) => self.move_window(target).await,
            Intent::DropWindow(target) => return self.drop_window(target).await,
            Intent::RotateLayout(rotation) => self.gateway.rotate_layout(rotation).await,
            Intent::FlipLayout(axis) => self.gateway.flip_layout(axis).await,
            Intent::BalanceLayout => self.gateway.balance_layout().await,
            Intent::ToggleLayout => self.gateway.toggle_layout().await,
            Intent::ToggleStackAll => self.gateway.toggle_stack_all().await,
        };

        if let Err(err) = result {
            tracing::warn!("commands: {} failed: {err}", intent.name());
            return Err(err.into());
        }

        self.request_refresh(intent.refresh_scope());
        Ok(())
    }

    async fn move_window(&self, target: WindowMove) -> crate::yabai::GatewayResult<()> {
        self.gateway
            .move_window(target.id, target.to_space, target.insert_before, target.stack)
            .await
    }

    /// Moves the window, then follows it when it left its space.
    async fn drop_window(&self, target: WindowMove) -> Result<(), AegisError> {
        // Read before moving: afterwards the projection may already show the
        // window at its destination.
        let source = self.reader.as_ref().and_then(|reader| reader.space_of_window(target.id));

        if let Err(err) = self.move_window(target).await {
            tracing::warn!("commands: drop of window {} failed: {err}", target.id);
            return Err(err.into());
        }

        self.request_refresh(Intent::DropWindow(target).refresh_scope());

        if source != Some(target.to_space) {
            self.follow_focus(target.to_space);
        }
        Ok(())
    }

    /// Focuses `space` after the configured delay. Best effort.
    fn follow_focus(&self, space: u32) {
        let gateway = Arc::clone(&self.gateway);
        let delay = self.focus_follow_delay;
        let router = self.router.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match gateway.focus_space(space).await {
                Ok(()) => {
                    if let Some(router) = router {
                        router.request(RefreshPlan::SPACES_AND_FOCUS);
                    }
                }
                Err(err) => tracing::info!("commands: focus-follow to space {space} failed: {err}"),
            }
        });

        let mut follow_ups = self.follow_ups.lock();
        follow_ups.retain(|task| !task.is_finished());
        follow_ups.push(task);
    }

    fn request_refresh(&self, plan: RefreshPlan) {
        if let Some(router) = &self.router {
            router.request(plan);
        }
    }

    /// Waits for scheduled focus-follow tasks.
    ///
    /// Short-lived callers (the CLI) use this so a follow-up is not lost when
    /// the process exits.
    pub async fn settle(&self) {
        let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *self.follow_ups.lock());
        for task in pending {
            if let Err(err) = task.await {
                tracing::warn!("commands: focus-follow task failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::StateActor;
    use crate::config::{HudConfig, IconsConfig};
    use crate::events::RouterInput;
    use crate::hud::{HudCoordinator, HudSettings};
    use crate::state::{BundleIconResolver, StateStore, Window};
    use crate::testing::{Call, FakeGateway};

    const DELAY: Duration = Duration::from_millis(150);

    fn executor(gateway: &Arc<FakeGateway>) -> CommandExecutor<FakeGateway> {
        CommandExecutor::new(Arc::clone(gateway), &CommandsConfig::default())
    }

    async fn reader_with(windows: Vec<Window>) -> StoreReader {
        let store = StateStore::new(Box::new(BundleIconResolver::default()), IconsConfig::default());
        let hud = HudCoordinator::new(HudSettings::from(&HudConfig::default()));
        let (handle, reader) = StateActor::spawn(store, hud);
        handle.replace_windows(windows).await.unwrap();
        // A query round-trip guarantees the snapshot was applied.
        handle.get_windows().await.unwrap();
        reader
    }

    fn drop_of(id: u64, to_space: u32, insert_before: Option<u64>) -> Intent {
        Intent::DropWindow(WindowMove { id, to_space, insert_before, stack: false })
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_across_spaces_moves_then_follows_focus() {
        let gateway = Arc::new(FakeGateway::default());
        let reader = reader_with(vec![Window { id: 5, space: 1, ..Default::default() }]).await;
        let executor = executor(&gateway).with_reader(reader);

        let started = tokio::time::Instant::now();
        executor.dispatch(drop_of(5, 2, Some(9))).await.unwrap();
        assert_eq!(
            gateway.calls(),
            vec![Call::MoveWindow { id: 5, to_space: 2, insert_before: Some(9), stack: false }]
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        let calls = gateway.timed_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, Call::FocusSpace(2));
        assert!(calls[1].0 - started >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_within_same_space_does_not_follow() {
        let gateway = Arc::new(FakeGateway::default());
        let reader = reader_with(vec![Window { id: 5, space: 2, ..Default::default() }]).await;
        let executor = executor(&gateway).with_reader(reader);

        executor.dispatch(drop_of(5, 2, Some(9))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_of_unknown_window_follows() {
        let gateway = Arc::new(FakeGateway::default());
        let executor = executor(&gateway);

        executor.dispatch(drop_of(77, 3, None)).await.unwrap();
        executor.settle().await;

        assert_eq!(gateway.calls().last(), Some(&Call::FocusSpace(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_move_propagates_and_skips_follow() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.fail_when(|call| matches!(call, Call::MoveWindow { .. }));
        let executor = executor(&gateway);

        let err = executor.dispatch(drop_of(5, 2, None)).await.unwrap_err();
        assert!(matches!(err, AegisError::CommandFailure(_)));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_focus_follow_is_not_propagated() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.fail_when(|call| matches!(call, Call::FocusSpace(_)));
        let executor = executor(&gateway);

        assert!(executor.dispatch(drop_of(5, 2, None)).await.is_ok());
        executor.settle().await;
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_success_requests_refresh_of_scope() {
        let gateway = Arc::new(FakeGateway::default());
        let (router, mut rx) = RouterHandle::channel();
        let executor = executor(&gateway).with_router(router);

        executor.dispatch(Intent::FocusWindow { id: 3 }).await.unwrap();
        assert_eq!(rx.try_recv().ok(), Some(RouterInput::Refresh(RefreshPlan::FOCUS)));

        executor.dispatch(Intent::BalanceLayout).await.unwrap();
        assert_eq!(rx.try_recv().ok(), Some(RouterInput::Refresh(RefreshPlan::FULL)));
    }

    #[tokio::test]
    async fn test_failure_requests_no_refresh() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.fail_when(|call| matches!(call, Call::ToggleLayout));
        let (router, mut rx) = RouterHandle::channel();
        let executor = executor(&gateway).with_router(router);

        let err = executor.dispatch(Intent::ToggleLayout).await.unwrap_err();
        assert!(err.to_string().contains("fake failure"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_zero_space_index_is_rejected_before_calling_gateway() {
        let gateway = Arc::new(FakeGateway::default());
        let executor = executor(&gateway);

        let err = executor.dispatch(Intent::FocusSpace { index: 0 }).await.unwrap_err();
        assert!(matches!(err, AegisError::InvalidArguments(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_plain_move_does_not_follow() {
        let gateway = Arc::new(FakeGateway::default());
        let executor = executor(&gateway);

        let target = WindowMove { id: 5, to_space: 4, insert_before: None, stack: true };
        executor.dispatch(Intent::MoveWindow(target)).await.unwrap();
        executor.settle().await;

        assert_eq!(
            gateway.calls(),
            vec![Call::MoveWindow { id: 5, to_space: 4, insert_before: None, stack: true }]
        );
    }
}
