//! Long-running sync daemon.
//!
//! Wires the gateway, router, ingestion thread and state actor together and
//! runs until Ctrl-C or SIGTERM.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::actor::{StateActor, StateActorHandle, StoreReader};
use crate::commands::CommandExecutor;
use crate::config::{AegisConfig, CommandsConfig};
use crate::error::AegisError;
use crate::events::{
    EventRouter, Ingestion, PipeSettings, RefreshPlan, RouterHandle, RouterSettings, SyncPipeline,
};
use crate::hud::{HudCoordinator, HudSettings};
use crate::state::{BundleIconResolver, Space, StateStore};
use crate::yabai::YabaiGateway;
use crate::yabai::signals::{self, SignalTarget};

/// Starts the daemon on a multi-threaded runtime and blocks until shutdown.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn run(config: &AegisConfig) -> Result<(), AegisError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("aegis-worker")
        .build()?;

    runtime.block_on(async {
        let daemon = Daemon::start(config);
        wait_for_shutdown().await;
        daemon.stop().await;
    });
    Ok(())
}

/// The running set of tasks behind one daemon instance.
pub struct Daemon {
    gateway: Arc<YabaiGateway>,
    actor: StateActorHandle,
    reader: StoreReader,
    router: RouterHandle,
    ingestion: Option<Ingestion>,
    commands: CommandsConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl Daemon {
    /// Spawns every component on the current runtime.
    ///
    /// Nothing here is fatal: a missing pipe degrades to fallback refreshes
    /// and a failed signal registration is logged.
    #[must_use]
    pub fn start(config: &AegisConfig) -> Self {
        let gateway = Arc::new(YabaiGateway::from_config(&config.yabai));

        let store = StateStore::new(
            Box::new(BundleIconResolver::from_config(&config.icons)),
            config.icons.clone(),
        );
        let hud = HudCoordinator::new(HudSettings::from(&config.hud));
        let (actor, reader) = StateActor::spawn(store, hud);

        let router = EventRouter::spawn(
            SyncPipeline::new(Arc::clone(&gateway), actor.clone()),
            RouterSettings::from(&config.events),
        );

        let ingestion = match Ingestion::start(PipeSettings::from(&config.events), router.clone()) {
            Ok(ingestion) => Some(ingestion),
            Err(err) => {
                let err = AegisError::IngestionUnavailable(err.to_string());
                tracing::warn!("daemon: {err}, relying on fallback refresh");
                None
            }
        };

        let mut tasks = vec![tokio::spawn(log_focus_changes(reader.clone()))];

        if config.events.register_signals {
            tasks.push(tokio::spawn(install_signals(Arc::clone(&gateway), config.clone())));
        }

        router.request(RefreshPlan::FULL);
        tracing::info!("daemon: started");

        Self {
            gateway,
            actor,
            reader,
            router,
            ingestion,
            commands: config.commands.clone(),
            tasks,
        }
    }

    /// Read access to the projection for presentation layers.
    #[must_use]
    pub const fn reader(&self) -> &StoreReader { &self.reader }

    /// Writer handle, for HUD module and overlay updates.
    #[must_use]
    pub const fn actor(&self) -> &StateActorHandle { &self.actor }

    /// An executor wired to this daemon's router and projection.
    #[must_use]
    pub fn executor(&self) -> CommandExecutor<YabaiGateway> {
        CommandExecutor::new(Arc::clone(&self.gateway), &self.commands)
            .with_router(self.router.clone())
            .with_reader(self.reader.clone())
    }

    /// Whether the ingestion thread is reading.
    #[must_use]
    pub fn is_ingesting(&self) -> bool { self.ingestion.as_ref().is_some_and(Ingestion::is_running) }

    /// Stops ingestion, then the router, then the actor.
    pub async fn stop(mut self) {
        if let Some(ingestion) = self.ingestion.take()
            && let Err(err) = tokio::task::spawn_blocking(move || ingestion.stop()).await
        {
            tracing::warn!("daemon: ingestion did not stop cleanly: {err}");
        }

        self.router.shutdown();
        if let Err(err) = self.actor.shutdown() {
            tracing::debug!("daemon: actor already stopped: {err}");
        }

        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::info!("daemon: stopped");
    }
}

async fn install_signals(gateway: Arc<YabaiGateway>, config: AegisConfig) {
    let target = match SignalTarget::for_current_exe(&config.events) {
        Ok(target) => target,
        Err(err) => {
            tracing::warn!("daemon: cannot locate own executable for signals: {err}");
            return;
        }
    };

    if let Err(err) = signals::register_signals(&gateway, &target).await {
        tracing::warn!("daemon: signal registration failed: {err}");
    }
}

/// Stand-in menu bar: logs every focused-space change.
async fn log_focus_changes(reader: StoreReader) {
    let mut spaces = reader.subscribe_spaces();
    let mut last = focus_summary(&spaces.get());

    while let Some(current) = spaces.next().await {
        let summary = focus_summary(&current);
        if summary != last {
            if let Some(summary) = &summary {
                tracing::info!("menubar: {summary}");
            }
            last = summary;
        }
    }
}

/// One-line description of the focused space, if any.
fn focus_summary(spaces: &[Space]) -> Option<String> {
    let focused = spaces.iter().find(|space| space.is_focused)?;
    Some(format!(
        "space {} of {} focused ({}, {} windows)",
        focused.display_name(),
        spaces.len(),
        focused.kind.as_str(),
        focused.windows.len()
    ))
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!("daemon: cannot listen for SIGTERM: {err}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("daemon: shutdown requested");
}
