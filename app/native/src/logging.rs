//! Tracing subscriber setup.
//!
//! Filter precedence: `AEGIS_LOG`, then the config file's `logLevel`, then
//! the number of `-v` flags.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "AEGIS_LOG";

/// Maps a `-v` count to a default level.
#[must_use]
pub const fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the filter without installing it.
#[must_use]
pub fn build_filter(verbose: u8, config_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        config_level
            .filter(|level| !level.trim().is_empty())
            .and_then(|level| EnvFilter::try_new(level.trim()).ok())
            .unwrap_or_else(|| EnvFilter::new(level_for_verbosity(verbose)))
    })
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(verbose: u8, config_level: Option<&str>) {
    let filter = build_filter(verbose, config_level);
    let _ = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}
