//! Configuration types for Aegis.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Every field has a default, so an empty object is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Window manager control surface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct YabaiConfig {
    /// Binary name or absolute path of the window manager CLI.
    /// Default: "yabai"
    pub binary: String,

    /// Upper bound for a single invocation, in milliseconds.
    /// A hung window manager never stalls callers longer than this.
    /// Default: 800
    pub timeout_ms: u64,
}

impl Default for YabaiConfig {
    fn default() -> Self {
        Self {
            binary: "yabai".to_string(),
            timeout_ms: 800,
        }
    }
}

impl YabaiConfig {
    /// Returns the invocation timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

/// Event ingestion and refresh scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EventsConfig {
    /// Path of the named pipe the window manager signals write to.
    /// Supports `~` and environment variables.
    /// Default: "$TMPDIR/aegis_yabai_events.fifo"
    pub pipe_path: String,

    /// Create the pipe when it is missing.
    /// Default: true
    pub create_pipe: bool,

    /// How often the reader wakes up to check for stop requests and
    /// endpoint re-creation, in milliseconds.
    /// Default: 500
    pub poll_interval_ms: u64,

    /// Coalescing window for bursts of events, in milliseconds.
    /// Default: 100
    pub debounce_ms: u64,

    /// Upper bound on how long a continuous burst can postpone a refresh.
    /// Default: 500
    pub max_debounce_ms: u64,

    /// Interval of the fallback full refresh, in seconds. 0 disables it.
    /// Default: 30
    pub fallback_refresh_secs: u64,

    /// Register window manager signals on startup.
    /// Default: true
    pub register_signals: bool,

    /// Label prefix used for every registered signal.
    /// Default: "aegis_"
    pub signal_label_prefix: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            pipe_path: "$TMPDIR/aegis_yabai_events.fifo".to_string(),
            create_pipe: true,
            poll_interval_ms: 500,
            debounce_ms: 100,
            max_debounce_ms: 500,
            fallback_refresh_secs: 30,
            register_signals: true,
            signal_label_prefix: "aegis_".to_string(),
        }
    }
}

impl EventsConfig {
    /// Returns the pipe path with `~` and environment variables expanded.
    ///
    /// An unset `TMPDIR` falls back to `/tmp`.
    #[must_use]
    pub fn resolved_pipe_path(&self) -> PathBuf {
        let tmp_fallback = |name: &str| -> Result<Option<String>, std::env::VarError> {
            match std::env::var(name) {
                Ok(value) => Ok(Some(value.trim_end_matches('/').to_string())),
                Err(_) if name == "TMPDIR" => Ok(Some("/tmp".to_string())),
                Err(_) => Ok(None),
            }
        };

        let home = || dirs::home_dir().map(|path| path.to_string_lossy().into_owned());

        shellexpand::full_with_context(&self.pipe_path, home, tmp_fallback).map_or_else(
            |_| PathBuf::from(&self.pipe_path),
            |expanded| PathBuf::from(expanded.as_ref()),
        )
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }

    #[must_use]
    pub const fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }

    #[must_use]
    pub const fn max_debounce(&self) -> Duration { Duration::from_millis(self.max_debounce_ms) }

    /// Returns the fallback refresh interval, or `None` when disabled.
    #[must_use]
    pub const fn fallback_refresh(&self) -> Option<Duration> {
        if self.fallback_refresh_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.fallback_refresh_secs))
        }
    }
}

/// Notch geometry and HUD placement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HudConfig {
    /// Width of the display hosting the notch, in points.
    /// Default: 1512
    pub screen_width: f64,

    /// Width of the notch cutout, in points.
    /// Default: 185
    pub notch_width: f64,

    /// Height of the notch cutout, in points.
    /// Default: 32
    pub notch_height: f64,

    /// Padding around the notch; half of it is added to each outer edge.
    /// Default: 16
    pub notch_padding: f64,

    /// Gap between adjacent HUD modules.
    /// Default: 8
    pub module_spacing: f64,

    /// Width of the album art shown next to the music module.
    /// Default: 24
    pub music_companion_width: f64,

    /// Width of the speaker glyph shown next to the volume module.
    /// Default: 18
    pub volume_companion_width: f64,

    /// Width of the sun glyph shown next to the brightness module.
    /// Default: 18
    pub brightness_companion_width: f64,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            screen_width: 1512.0,
            notch_width: 185.0,
            notch_height: 32.0,
            notch_padding: 16.0,
            module_spacing: 8.0,
            music_companion_width: 24.0,
            volume_companion_width: 18.0,
            brightness_companion_width: 18.0,
        }
    }
}

/// Window icon projection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct IconsConfig {
    /// Average advance of one terminal column of label text, in points.
    /// Default: 7
    pub label_char_width: f64,

    /// Labels never reserve more than this width.
    /// Default: 120
    pub max_label_width: f64,

    /// Directories searched for `<App>.app` bundles.
    pub search_paths: Vec<String>,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            label_char_width: 7.0,
            max_label_width: 120.0,
            search_paths: vec![
                "/Applications".to_string(),
                "/System/Applications".to_string(),
                "/System/Applications/Utilities".to_string(),
                "~/Applications".to_string(),
            ],
        }
    }
}

/// User intent execution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CommandsConfig {
    /// Delay before focusing the destination space after a cross-space drop,
    /// in milliseconds.
    /// Default: 150
    pub focus_follow_delay_ms: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self { Self { focus_follow_delay_ms: 150 } }
}

impl CommandsConfig {
    #[must_use]
    pub const fn focus_follow_delay(&self) -> Duration {
        Duration::from_millis(self.focus_follow_delay_ms)
    }
}

/// Root configuration for Aegis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AegisConfig {
    /// JSON Schema reference (ignored at runtime).
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Log filter used when `AEGIS_LOG` is not set (e.g. "info", "aegis=debug").
    pub log_level: Option<String>,

    /// Window manager control surface.
    pub yabai: YabaiConfig,

    /// Event ingestion and refresh scheduling.
    pub events: EventsConfig,

    /// Notch HUD layout.
    pub hud: HudConfig,

    /// Window icon projection.
    pub icons: IconsConfig,

    /// User intent execution.
    pub commands: CommandsConfig,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/aegis/config.json, \
        ~/Library/Application Support/aegis/config.json, or ~/.aegis.json"
    )]
    NotFound,

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration file names, in lookup order.
const CONFIG_FILE_NAMES: [&str; 2] = ["config.jsonc", "config.json"];

/// Returns the candidate configuration paths in priority order.
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let aegis_dir = PathBuf::from(xdg_config).join("aegis");
        for filename in CONFIG_FILE_NAMES {
            paths.push(aegis_dir.join(filename));
        }
    }

    if let Some(home) = dirs::home_dir() {
        let aegis_dir = home.join(".config").join("aegis");
        for filename in CONFIG_FILE_NAMES {
            let path = aegis_dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    // macOS native: ~/Library/Application Support/aegis/
    if let Some(config_dir) = dirs::config_dir() {
        let aegis_dir = config_dir.join("aegis");
        for filename in CONFIG_FILE_NAMES {
            let path = aegis_dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".aegis.json"));
    }

    paths
}

/// Loads the configuration from the first existing default location.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when no file exists, or the read/parse
/// error of the first file found.
pub fn load_config() -> Result<(AegisConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads the configuration from a specific path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSONC.
pub fn load_config_from_path(path: &Path) -> Result<(AegisConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let config: AegisConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}
