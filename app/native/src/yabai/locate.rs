//! Finding the yabai executable.
//!
//! Launch agents start with a bare `PATH`, so Homebrew's prefixes are
//! searched after it.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, access};

use super::{GatewayError, GatewayResult};
use crate::utils::path::expand;

/// Install prefixes of the Homebrew formula, Apple Silicon first.
const HOMEBREW_BIN_DIRS: [&str; 2] = ["/opt/homebrew/bin", "/usr/local/bin"];

/// Resolves the configured yabai binary to an executable path.
///
/// A value containing `/` (after `~` expansion) is used as is; a bare name is
/// looked up in `search_path`, then in the Homebrew prefixes.
///
/// # Errors
///
/// Returns [`GatewayError::BinaryNotFound`] naming what was tried.
pub fn locate_yabai(configured: &str, search_path: Option<&OsStr>) -> GatewayResult<PathBuf> {
    let configured = configured.trim();
    if configured.is_empty() {
        return Err(GatewayError::BinaryNotFound("no yabai binary configured".to_string()));
    }

    if configured.contains('/') {
        let path = expand(configured);
        return if is_executable(&path) {
            Ok(path)
        } else {
            Err(GatewayError::BinaryNotFound(format!("{} is not executable", path.display())))
        };
    }

    let path_dirs = search_path.map(std::env::split_paths).into_iter().flatten();
    let homebrew_dirs = HOMEBREW_BIN_DIRS.iter().map(PathBuf::from);

    path_dirs
        .chain(homebrew_dirs)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(configured))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| {
            GatewayError::BinaryNotFound(format!("'{configured}' is not on PATH or in Homebrew"))
        })
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file()) && access(path, AccessFlags::X_OK).is_ok()
}
