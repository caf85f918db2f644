//! Idempotent registration of the yabai signals that feed the event pipe.
//!
//! Every signal is labelled `<prefix><event>` so re-registering replaces the
//! previous entry instead of stacking duplicates, and bulk removal can find
//! everything this process installed.

use std::path::{Path, PathBuf};

use serde_json::Value;
use smallvec::SmallVec;

use super::client::{Args, YabaiGateway};
use super::{GatewayResult, parse};
use crate::config::EventsConfig;

/// Window manager events forwarded into the pipe.
pub const SIGNAL_EVENTS: [&str; 7] = [
    "space_changed",
    "space_destroyed",
    "window_focused",
    "window_created",
    "window_destroyed",
    "window_moved",
    "application_front_switched",
];

/// What a registered signal should run.
#[derive(Clone, Debug)]
pub struct SignalTarget {
    /// Label prefix shared by every signal this process owns.
    pub label_prefix: String,
    /// Executable invoked by yabai (normally this binary).
    pub executable: PathBuf,
    /// Pipe the producer writes to.
    pub pipe: PathBuf,
}

impl SignalTarget {
    /// Targets this executable and the configured pipe.
    ///
    /// # Errors
    ///
    /// Returns an error when the path of the running executable is unknown.
    pub fn for_current_exe(config: &EventsConfig) -> std::io::Result<Self> {
        Ok(Self {
            label_prefix: config.signal_label_prefix.clone(),
            executable: std::env::current_exe()?,
            pipe: config.resolved_pipe_path(),
        })
    }

    #[must_use]
    pub fn label(&self, event: &str) -> String { format!("{}{event}", self.label_prefix) }

    /// Shell command yabai runs when `event` fires.
    #[must_use]
    pub fn action(&self, event: &str) -> String {
        format!(
            "{} event {event} --pipe {}",
            shell_quote(&self.executable),
            shell_quote(&self.pipe)
        )
    }

    pub(crate) fn add_args(&self, event: &str) -> Args {
        let mut args = SmallVec::new();
        args.push("signal".to_string());
        args.push("--add".to_string());
        args.push(format!("event={event}"));
        args.push(format!("label={}", self.label(event)));
        args.push(format!("action={}", self.action(event)));
        args
    }
}

fn remove_args(label: &str) -> Args {
    let mut args = SmallVec::new();
    args.push("signal".to_string());
    args.push("--remove".to_string());
    args.push(label.to_string());
    args
}

/// Single-quotes a path for `sh -c`, leaving plain paths untouched.
fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let plain = raw.chars().all(|c| c.is_ascii_alphanumeric() || "/._-+:@%".contains(c));
    if plain && !raw.is_empty() {
        raw.into_owned()
    } else {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
}

/// Extracts the labels of `signal --list` output that start with `prefix`.
pub(crate) fn owned_labels(raw: &str, prefix: &str) -> GatewayResult<Vec<String>> {
    let labels = parse::split_records(raw, "signal")?
        .into_iter()
        .filter_map(|record| match record.get("label") {
            Some(Value::String(label)) if label.starts_with(prefix) => Some(label.clone()),
            _ => None,
        })
        .collect();
    Ok(labels)
}

/// Installs one signal per forwarded event, replacing earlier registrations.
///
/// # Errors
///
/// Returns the first `signal --add` failure. Failed removals of signals that
/// were never registered are expected and ignored.
pub async fn register_signals(gateway: &YabaiGateway, target: &SignalTarget) -> GatewayResult<usize> {
    for event in SIGNAL_EVENTS {
        if let Err(err) = gateway.run(&remove_args(&target.label(event))).await {
            tracing::trace!("signals: nothing to remove for {event}: {err}");
        }
        gateway.run(&target.add_args(event)).await?;
    }

    tracing::info!(
        "signals: registered {} yabai signals with prefix '{}'",
        SIGNAL_EVENTS.len(),
        target.label_prefix
    );
    Ok(SIGNAL_EVENTS.len())
}

/// Removes every signal whose label starts with `prefix`.
///
/// # Errors
///
/// Returns an error when the signal list cannot be read or a removal fails.
pub async fn remove_signals(gateway: &YabaiGateway, prefix: &str) -> GatewayResult<usize> {
    let raw = gateway.run(&["signal".to_string(), "--list".to_string()]).await?;
    let labels = owned_labels(&raw, prefix)?;

    for label in &labels {
        gateway.run(&remove_args(label)).await?;
    }

    tracing::info!("signals: removed {} yabai signals with prefix '{prefix}'", labels.len());
    Ok(labels.len())
}
