//! The projection store.
//!
//! Uses `eyeball` observables so consumers can subscribe to each collection.
//! The store itself is plain data owned by the state actor; it never runs
//! concurrently with itself.

use eyeball::{Observable, Subscriber};

use super::icons::{IconResolver, project_icons};
use super::types::{Space, Window, WindowIcon};
use crate::config::IconsConfig;

/// Canonical mirror of the window manager's spaces and windows.
///
/// Collections are replaced wholesale and compared by content: writing data
/// equal to what is already stored does not notify subscribers.
///
/// - `spaces` is ordered by `Space.index`
/// - `windows` is ordered by `Window.id`
/// - `icons` follows `windows`, restricted to displayable windows
pub struct StateStore {
    spaces: Observable<Vec<Space>>,
    windows: Observable<Vec<Window>>,
    icons: Observable<Vec<WindowIcon>>,
    resolver: Box<dyn IconResolver>,
    icons_config: IconsConfig,
}

impl StateStore {
    #[must_use]
    pub fn new(resolver: Box<dyn IconResolver>, icons_config: IconsConfig) -> Self {
        Self {
            spaces: Observable::new(Vec::new()),
            windows: Observable::new(Vec::new()),
            icons: Observable::new(Vec::new()),
            resolver,
            icons_config,
        }
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Replaces every space. Returns whether anything changed.
    pub fn replace_spaces(&mut self, mut spaces: Vec<Space>) -> bool {
        spaces.sort_by_key(|space| space.index);
        let changed = Observable::set_if_not_eq(&mut self.spaces, spaces).is_some();
        if changed {
            tracing::debug!("store: spaces changed ({})", self.spaces().len());
        }
        changed
    }

    /// Replaces every window and rebuilds the icon projection.
    ///
    /// Returns whether the window set changed.
    pub fn replace_windows(&mut self, mut windows: Vec<Window>) -> bool {
        windows.sort_by_key(|window| window.id);
        windows.dedup_by_key(|window| window.id);

        if Observable::get(&self.windows) == &windows {
            return false;
        }

        Observable::set(&mut self.windows, windows);
        tracing::debug!("store: windows changed ({})", self.windows().len());
        self.rebuild_icons();
        true
    }

    /// Drops cached icon lookups and rebuilds the projection.
    ///
    /// Returns whether the published icons changed.
    pub fn refresh_icons(&mut self) -> bool {
        self.resolver.clear();
        self.rebuild_icons()
    }

    fn rebuild_icons(&mut self) -> bool {
        let windows = Observable::get(&self.windows).as_slice();
        let icons = project_icons(windows, self.resolver.as_mut(), &self.icons_config);
        Observable::set_if_not_eq(&mut self.icons, icons).is_some()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[must_use]
    pub fn spaces(&self) -> &[Space] { Observable::get(&self.spaces).as_slice() }

    #[must_use]
    pub fn windows(&self) -> &[Window] { Observable::get(&self.windows).as_slice() }

    #[must_use]
    pub fn icons(&self) -> &[WindowIcon] { Observable::get(&self.icons).as_slice() }

    /// The focused space, if the last snapshot had one.
    #[must_use]
    pub fn focused_space(&self) -> Option<&Space> { self.spaces().iter().find(|space| space.is_focused) }

    #[must_use]
    pub fn focused_space_is_fullscreen(&self) -> bool {
        self.focused_space().is_some_and(|space| space.is_native_fullscreen)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    #[must_use]
    pub fn subscribe_spaces(&self) -> Subscriber<Vec<Space>> { Observable::subscribe(&self.spaces) }

    #[must_use]
    pub fn subscribe_windows(&self) -> Subscriber<Vec<Window>> {
        Observable::subscribe(&self.windows)
    }

    #[must_use]
    pub fn subscribe_icons(&self) -> Subscriber<Vec<WindowIcon>> {
        Observable::subscribe(&self.icons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::icons::BundleIconResolver;
    use crate::state::types::{STANDARD_WINDOW_ROLE, STANDARD_WINDOW_SUBROLE};
    use crate::state::AppIcon;

    fn store() -> StateStore {
        StateStore::new(Box::new(BundleIconResolver::default()), IconsConfig::default())
    }

    fn space(id: u64, index: u32, focused: bool) -> Space {
        Space { id, index, is_focused: focused, ..Default::default() }
    }

    fn window(id: u64, subrole: &str) -> Window {
        Window {
            id,
            app: "Finder".to_string(),
            role: STANDARD_WINDOW_ROLE.to_string(),
            subrole: subrole.to_string(),
            ..Default::default()
        }
    }

    /// Counts lookups.
    struct CountingResolver {
        lookups: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl IconResolver for CountingResolver {
        fn resolve(&mut self, app: &str) -> AppIcon {
            self.lookups.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            AppIcon { app: app.to_string(), bundle_path: None }
        }

        fn clear(&mut self) {}
    }

    #[test]
    fn test_replace_spaces_sorts_by_index() {
        let mut store = store();
        assert!(store.replace_spaces(vec![space(9, 3, false), space(4, 1, true), space(6, 2, false)]));
        let indexes: Vec<u32> = store.spaces().iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(store.focused_space().map(|s| s.id), Some(4));
    }

    #[tokio::test]
    async fn test_equal_replacement_does_not_notify() {
        let mut store = store();
        let mut subscriber = store.subscribe_spaces();

        assert!(store.replace_spaces(vec![space(1, 1, true)]));
        assert_eq!(subscriber.next().await.map(|spaces| spaces.len()), Some(1));

        assert!(!store.replace_spaces(vec![space(1, 1, true)]));
        let next = tokio::time::timeout(std::time::Duration::from_millis(20), subscriber.next());
        assert!(next.await.is_err());
    }

    #[test]
    fn test_one_icon_per_displayable_window_in_id_order() {
        let mut store = store();
        store.replace_windows(vec![
            window(30, STANDARD_WINDOW_SUBROLE),
            window(10, STANDARD_WINDOW_SUBROLE),
            window(20, "AXDialog"),
            window(5, "AXFloatingWindow"),
        ]);

        let ids: Vec<u64> = store.icons().iter().map(WindowIcon::id).collect();
        assert_eq!(ids, vec![10, 30]);
        let window_ids: Vec<u64> = store.windows().iter().map(|w| w.id).collect();
        assert_eq!(window_ids, vec![5, 10, 20, 30]);
    }

    #[test]
    fn test_unchanged_windows_skip_icon_rebuild() {
        let lookups = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let resolver = CountingResolver { lookups: lookups.clone() };
        let mut store = StateStore::new(Box::new(resolver), IconsConfig::default());

        assert!(store.replace_windows(vec![window(1, STANDARD_WINDOW_SUBROLE)]));
        assert!(!store.replace_windows(vec![window(1, STANDARD_WINDOW_SUBROLE)]));
        assert_eq!(lookups.load(std::sync::atomic::Ordering::SeqCst), 1);

        store.refresh_icons();
        assert_eq!(lookups.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_focus_change_is_a_content_change() {
        let mut store = store();
        let mut focused = window(1, STANDARD_WINDOW_SUBROLE);
        store.replace_windows(vec![focused.clone()]);

        focused.is_focused = true;
        assert!(store.replace_windows(vec![focused]));
        assert!(store.windows()[0].is_focused);
    }

    #[test]
    fn test_fullscreen_follows_focused_space() {
        let mut store = store();
        assert!(!store.focused_space_is_fullscreen());

        let mut fullscreen = space(2, 2, true);
        fullscreen.is_native_fullscreen = true;
        store.replace_spaces(vec![space(1, 1, false), fullscreen]);
        assert!(store.focused_space_is_fullscreen());
    }
}
