//! Executes refresh plans against the gateway.

use std::future::Future;
use std::sync::Arc;

use super::types::RefreshPlan;
use crate::actor::StateActorHandle;
use crate::error::AegisError;
use crate::yabai::Gateway;

/// Runs a refresh plan to completion.
///
/// The router owns exactly one refresher and never calls it concurrently.
pub trait Refresher: Send + Sync + 'static {
    fn refresh(&self, plan: RefreshPlan) -> impl Future<Output = Result<(), AegisError>> + Send;
}

/// Queries the gateway and hands the snapshots to the state actor.
pub struct SyncPipeline<G> {
    gateway: Arc<G>,
    actor: StateActorHandle,
}

impl<G: Gateway> SyncPipeline<G> {
    #[must_use]
    pub const fn new(gateway: Arc<G>, actor: StateActorHandle) -> Self { Self { gateway, actor } }
}

impl<G: Gateway> Refresher for SyncPipeline<G> {
    /// Every part of the plan is attempted; the first failure is returned
    /// after the remaining parts ran.
    async fn refresh(&self, plan: RefreshPlan) -> Result<(), AegisError> {
        let mut first_error: Option<AegisError> = None;

        if plan.spaces {
            match self.gateway.list_spaces().await {
                Ok(spaces) => self.actor.replace_spaces(spaces).await?,
                Err(err) => {
                    tracing::warn!("refresh: listing spaces failed: {err}");
                    first_error.get_or_insert(err.into());
                }
            }
        }

        if plan.reads_windows() {
            match self.gateway.list_windows(None).await {
                Ok(windows) => self.actor.replace_windows(windows).await?,
                Err(err) => {
                    tracing::warn!("refresh: listing windows failed: {err}");
                    first_error.get_or_insert(err.into());
                }
            }
        }

        if plan.icons {
            self.actor.refresh_icons().await?;
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::StateActor;
    use crate::config::{HudConfig, IconsConfig};
    use crate::hud::{HudCoordinator, HudSettings};
    use crate::state::{BundleIconResolver, Space, StateStore};
    use crate::testing::{Call, FakeGateway};

    fn pipeline(
        gateway: FakeGateway,
    ) -> (SyncPipeline<FakeGateway>, Arc<FakeGateway>, StateActorHandle) {
        let gateway = Arc::new(gateway);
        let store =
            StateStore::new(Box::new(BundleIconResolver::new(Vec::new())), IconsConfig::default());
        let hud = HudCoordinator::new(HudSettings::from(&HudConfig::default()));
        let (actor, _reader) = StateActor::spawn(store, hud);
        (SyncPipeline::new(Arc::clone(&gateway), actor.clone()), gateway, actor)
    }

    #[tokio::test]
    async fn test_focus_plan_only_reads_windows() {
        let (pipeline, gateway, _actor) = pipeline(FakeGateway::default());
        pipeline.refresh(RefreshPlan::FOCUS).await.unwrap();
        assert_eq!(gateway.calls(), vec![Call::ListWindows(None)]);
    }

    #[tokio::test]
    async fn test_full_plan_reads_spaces_then_windows() {
        let fake = FakeGateway::default();
        fake.spaces.lock().push(Space { id: 1, index: 1, is_focused: true, ..Space::default() });
        let (pipeline, gateway, actor) = pipeline(fake);

        pipeline.refresh(RefreshPlan::FULL).await.unwrap();

        assert_eq!(gateway.calls(), vec![Call::ListSpaces, Call::ListWindows(None)]);
        assert_eq!(actor.get_spaces().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_part_does_not_skip_the_rest() {
        let fake = FakeGateway::default();
        fake.fail_when(|call| *call == Call::ListSpaces);
        let (pipeline, gateway, _actor) = pipeline(fake);

        let err = pipeline.refresh(RefreshPlan::FULL).await.unwrap_err();

        assert!(matches!(err, AegisError::CommandFailure(_)));
        assert_eq!(gateway.calls(), vec![Call::ListSpaces, Call::ListWindows(None)]);
    }

    #[tokio::test]
    async fn test_empty_plan_touches_nothing() {
        let (pipeline, gateway, _actor) = pipeline(FakeGateway::default());
        pipeline.refresh(RefreshPlan::NONE).await.unwrap();
        assert!(gateway.calls().is_empty());
    }
}
