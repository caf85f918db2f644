//! Debouncing event router.
//!
//! Events and refresh requests arrive on one channel. The router folds them
//! into a [`RefreshPlan`], waits for the burst to settle, then runs the plan.
//! Refreshes never overlap: whatever arrives while one is running is merged
//! into a single follow-up that starts as soon as it completes.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::refresh::Refresher;
use super::types::{EventKind, RefreshPlan};
use crate::config::EventsConfig;

/// Channel buffer size for the router.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Input accepted by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterInput {
    /// A notification from the ingestion channel.
    Event(EventKind),
    /// An explicit refresh request (commands, CLI, startup).
    Refresh(RefreshPlan),
    Shutdown,
}

impl RouterInput {
    const fn plan(self) -> RefreshPlan {
        match self {
            Self::Event(kind) => kind.scope(),
            Self::Refresh(plan) => plan,
            Self::Shutdown => RefreshPlan::NONE,
        }
    }
}

/// Timing of the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterSettings {
    /// Quiet period after the last trigger before a refresh starts.
    pub debounce: Duration,
    /// Upper bound on how long a burst can postpone its refresh.
    pub max_debounce: Duration,
    /// Periodic full refresh; `None` disables it.
    pub fallback: Option<Duration>,
}

impl Default for RouterSettings {
    fn default() -> Self { Self::from(&EventsConfig::default()) }
}

impl From<&EventsConfig> for RouterSettings {
    fn from(config: &EventsConfig) -> Self {
        Self {
            debounce: config.debounce(),
            max_debounce: config.max_debounce().max(config.debounce()),
            fallback: config.fallback_refresh(),
        }
    }
}

/// Cloneable sender side of the router.
#[derive(Clone, Debug)]
pub struct RouterHandle {
    sender: mpsc::Sender<RouterInput>,
}

impl RouterHandle {
    /// Creates a handle and the receiving end a router will consume.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<RouterInput>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        (Self { sender }, receiver)
    }

    /// Posts an event from a non-async thread, waiting for buffer space.
    ///
    /// Returns `false` once the router is gone.
    pub fn post_blocking(&self, kind: EventKind) -> bool {
        self.sender.blocking_send(RouterInput::Event(kind)).is_ok()
    }

    /// Posts an event without waiting. Dropped (and logged) when the buffer
    /// is full; the fallback refresh covers the gap.
    pub fn post(&self, kind: EventKind) {
        if let Err(err) = self.sender.try_send(RouterInput::Event(kind)) {
            tracing::debug!("router: dropped event {kind}: {err}");
        }
    }

    /// Requests a refresh of `plan` through the same queue as events.
    pub fn request(&self, plan: RefreshPlan) {
        if let Err(err) = self.sender.try_send(RouterInput::Refresh(plan)) {
            tracing::warn!("router: refresh request ({plan}) not queued: {err}");
        }
    }

    /// Stops the router after any in-flight refresh.
    ///
    /// Returns whether the stop request was queued.
    pub fn shutdown(&self) -> bool {
        match self.sender.try_send(RouterInput::Shutdown) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("router: already stopped");
                false
            }
            Err(err) => {
                tracing::warn!("router: shutdown not queued: {err}");
                false
            }
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }
}

/// Owns the debounce state and the refresher.
pub struct EventRouter<R> {
    refresher: R,
    receiver: mpsc::Receiver<RouterInput>,
    settings: RouterSettings,
}

/// Outcome of waiting for input.
enum Next {
    Plan(RefreshPlan),
    Stop,
}

impl<R: Refresher> EventRouter<R> {
    #[must_use]
    pub const fn new(
        refresher: R,
        receiver: mpsc::Receiver<RouterInput>,
        settings: RouterSettings,
    ) -> Self {
        Self { refresher, receiver, settings }
    }

    /// Spawns a router on the current runtime and returns its handle.
    #[must_use]
    pub fn spawn(refresher: R, settings: RouterSettings) -> RouterHandle {
        let (handle, receiver) = RouterHandle::channel();
        tokio::spawn(Self::new(refresher, receiver, settings).run());
        handle
    }

    /// Runs until shut down or every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!(
            "router: started (debounce={:?}, max={:?}, fallback={:?})",
            self.settings.debounce,
            self.settings.max_debounce,
            self.settings.fallback
        );

        let mut fallback = self.settings.fallback.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let Next::Plan(first) = self.wait_for_trigger(&mut fallback).await else {
                break;
            };

            let Next::Plan(mut plan) = self.debounce(first).await else {
                break;
            };

            loop {
                self.execute(plan).await;

                match self.drain_pending() {
                    Next::Plan(pending) if !pending.is_empty() => {
                        tracing::trace!("router: follow-up refresh ({pending})");
                        plan = pending;
                    }
                    Next::Plan(_) => break,
                    Next::Stop => {
                        tracing::debug!("router: stopped");
                        return;
                    }
                }
            }
        }

        tracing::debug!("router: stopped");
    }

    /// Waits for the first input with a non-empty scope.
    async fn wait_for_trigger(&mut self, fallback: &mut Option<Interval>) -> Next {
        loop {
            let input = tokio::select! {
                input = self.receiver.recv() => input,
                () = tick(fallback) => Some(RouterInput::Refresh(RefreshPlan::FULL)),
            };

            match input {
                None | Some(RouterInput::Shutdown) => return Next::Stop,
                Some(input) => {
                    let plan = input.plan();
                    if plan.is_empty() {
                        tracing::trace!("router: ignoring {input:?}");
                        continue;
                    }
                    return Next::Plan(plan);
                }
            }
        }
    }

    /// Collects triggers until the quiet period elapses.
    ///
    /// Each trigger restarts the quiet period, but never past `max_debounce`
    /// after the first one.
    async fn debounce(&mut self, mut plan: RefreshPlan) -> Next {
        let started = Instant::now();
        let cap = started + self.settings.max_debounce;
        let mut deadline = (started + self.settings.debounce).min(cap);

        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => return Next::Plan(plan),
                input = self.receiver.recv() => match input {
                    // Every handle is gone: run what was collected, then stop.
                    None => return Next::Plan(plan),
                    Some(RouterInput::Shutdown) => return Next::Stop,
                    Some(input) => {
                        let scope = input.plan();
                        if !scope.is_empty() {
                            plan |= scope;
                            deadline = (Instant::now() + self.settings.debounce).min(cap);
                        }
                    }
                },
            }
        }
    }

    /// Merges everything queued during a refresh.
    fn drain_pending(&mut self) -> Next {
        let mut plan = RefreshPlan::NONE;
        while let Ok(input) = self.receiver.try_recv() {
            if input == RouterInput::Shutdown {
                return Next::Stop;
            }
            plan |= input.plan();
        }
        Next::Plan(plan)
    }

    async fn execute(&self, plan: RefreshPlan) {
        tracing::debug!("router: refreshing {plan}");
        if let Err(err) = self.refresher.refresh(plan).await {
            tracing::warn!("router: refresh ({plan}) failed: {err}");
        }
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
