//! Window icon projection.
//!
//! Icons are looked up by application name in a list of application
//! directories and cached for the lifetime of the resolver; the cache is
//! dropped when the front application changes so freshly installed apps are
//! picked up.

use std::collections::HashMap;
use std::path::PathBuf;

use unicode_width::UnicodeWidthStr;

use super::types::{AppIcon, Window, WindowIcon};
use crate::config::IconsConfig;
use crate::utils::path::expand;

/// Resolves the icon for an application.
pub trait IconResolver: Send {
    fn resolve(&mut self, app: &str) -> AppIcon;

    /// Forgets every cached lookup.
    fn clear(&mut self);
}

/// Finds `<App>.app` bundles in a fixed list of directories.
#[derive(Debug, Default)]
pub struct BundleIconResolver {
    search_paths: Vec<PathBuf>,
    cache: HashMap<String, Option<PathBuf>>,
}

impl BundleIconResolver {
    #[must_use]
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths, cache: HashMap::new() }
    }

    #[must_use]
    pub fn from_config(config: &IconsConfig) -> Self {
        Self::new(config.search_paths.iter().map(|path| expand(path)).collect())
    }

    fn find_bundle(&self, app: &str) -> Option<PathBuf> {
        let bundle = format!("{app}.app");
        self.search_paths
            .iter()
            .map(|dir| dir.join(&bundle))
            .find(|candidate| candidate.is_dir())
    }
}

impl IconResolver for BundleIconResolver {
    fn resolve(&mut self, app: &str) -> AppIcon {
        let bundle_path = match self.cache.get(app) {
            Some(cached) => cached.clone(),
            None => {
                let found = self.find_bundle(app);
                if found.is_none() {
                    tracing::debug!("icons: no bundle found for '{app}'");
                }
                self.cache.insert(app.to_string(), found.clone());
                found
            }
        };

        AppIcon { app: app.to_string(), bundle_path }
    }

    fn clear(&mut self) { self.cache.clear(); }
}

/// Width reserved for a label, proportional to its display columns.
#[must_use]
pub fn label_width(text: &str, config: &IconsConfig) -> f64 {
    let columns = u32::try_from(text.width()).unwrap_or(u32::MAX);
    (f64::from(columns) * config.label_char_width).min(config.max_label_width)
}

/// Builds one icon per displayable window, in the order given.
pub fn project_icons(
    windows: &[Window],
    resolver: &mut dyn IconResolver,
    config: &IconsConfig,
) -> Vec<WindowIcon> {
    windows
        .iter()
        .filter(|window| window.is_displayable())
        .map(|window| {
            let label = if window.title.is_empty() { &window.app } else { &window.title };
            WindowIcon {
                icon: resolver.resolve(&window.app),
                label_width: label_width(label, config),
                window: window.clone(),
            }
        })
        .collect()
}
