//! Error types for Aegis.
//!
//! This module provides the unified error type surfaced to callers of the
//! sync core (the CLI, the daemon and any presentation layer). Lower layers
//! keep their own typed errors (`GatewayError`, `ActorError`, `ConfigError`)
//! and convert into `AegisError` at the boundary.

use serde::Serialize;
use thiserror::Error;

use crate::actor::ActorError;
use crate::config::ConfigError;
use crate::yabai::GatewayError;

/// Errors that can occur while syncing with or driving the window manager.
///
/// Serializes as `{"kind": ..., "message": ...}` so presentation layers can
/// show failed intents without parsing strings.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum AegisError {
    /// The event endpoint is missing or closed. Never fatal.
    #[error("Event ingestion unavailable: {0}")]
    IngestionUnavailable(String),
    /// A query returned a record that could not be understood.
    #[error("Parse failure: {0}")]
    ParseFailure(String),
    /// A control verb failed, timed out, or could not be started.
    #[error("Command failed: {0}")]
    CommandFailure(String),
    /// A layout invariant would have been broken and was clamped instead.
    #[error("Layout invariant violation: {0}")]
    LayoutInvariantViolation(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// The state actor could not be reached.
    #[error("Actor error: {0}")]
    ActorError(String),
}

impl From<GatewayError> for AegisError {
    fn from(err: GatewayError) -> Self { Self::CommandFailure(err.to_string()) }
}

impl From<ActorError> for AegisError {
    fn from(err: ActorError) -> Self { Self::ActorError(err.to_string()) }
}

impl From<ConfigError> for AegisError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<std::io::Error> for AegisError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for AegisError {
    fn from(err: serde_json::Error) -> Self { Self::ParseFailure(err.to_string()) }
}
