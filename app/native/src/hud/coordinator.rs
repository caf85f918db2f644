//! Placement of overlay widgets around the notch.
//!
//! The notch straddles the screen midpoint. Music owns the middle: its
//! companion (album art) fills the left wing and its content the right wing.
//! Volume attaches to the left of music, brightness to the right; without
//! music either one takes the center itself.

use eyeball::{Observable, Subscriber};
use smallvec::SmallVec;

use super::types::{HudLayout, HudModule, HudModuleKind, HudSettings, PlacedModule};
use crate::error::AegisError;

/// Owns the active module set and the overlay activity counter.
///
/// Lives on the state actor; nothing else mutates it.
pub struct HudCoordinator {
    settings: HudSettings,
    modules: SmallVec<[HudModule; 3]>,
    suppressed: bool,
    version: u64,
    layout: Observable<HudLayout>,
    overlays: Observable<u32>,
}

impl HudCoordinator {
    #[must_use]
    pub fn new(settings: HudSettings) -> Self {
        let mut coordinator = Self {
            settings,
            modules: SmallVec::new(),
            suppressed: false,
            version: 0,
            layout: Observable::new(HudLayout::default()),
            overlays: Observable::new(0),
        };
        let initial = coordinator.compute();
        Observable::set(&mut coordinator.layout, initial);
        coordinator
    }

    /// Shows, resizes or removes a module and publishes the new layout.
    pub fn set_module(&mut self, kind: HudModuleKind, visible: bool, width: f64) -> &HudLayout {
        let width = if width.is_finite() && width >= 0.0 {
            width
        } else {
            let err = AegisError::LayoutInvariantViolation(format!(
                "{} width must be a non-negative number, got {width}",
                kind.as_str()
            ));
            tracing::warn!("hud: {err}; clamping to 0");
            0.0
        };

        self.modules.retain(|module| module.kind != kind);
        if visible {
            self.modules.push(HudModule { kind, width, visible });
            self.modules.sort_by_key(|module| module.kind);
        }

        self.publish()
    }

    /// Marks the layout suppressed while a native fullscreen space is focused.
    pub fn set_suppressed(&mut self, suppressed: bool) {
        if self.suppressed != suppressed {
            tracing::debug!("hud: suppressed={suppressed}");
            self.suppressed = suppressed;
            self.publish();
        }
    }

    fn publish(&mut self) -> &HudLayout {
        self.version += 1;
        let layout = self.compute();
        Observable::set(&mut self.layout, layout);
        Observable::get(&self.layout)
    }

    fn placed(&self, kind: HudModuleKind) -> Option<&HudModule> {
        self.modules.iter().find(|module| module.kind == kind)
    }

    /// Span of a module centered on the notch.
    fn centered_span(&self, kind: HudModuleKind, width: f64) -> (f64, f64) {
        let geometry = &self.settings.geometry;
        let companion = self.settings.companions.of(kind);
        (geometry.notch_start() - companion, geometry.notch_end() + width)
    }

    fn compute(&self) -> HudLayout {
        let companions = &self.settings.companions;
        let spacing = self.settings.spacing;
        let geometry = &self.settings.geometry;

        let music = self.placed(HudModuleKind::Music).map(|module| {
            let (start, end) = self.centered_span(HudModuleKind::Music, module.width);
            PlacedModule { kind: module.kind, width: module.width, start, end }
        });

        let mut placed: SmallVec<[PlacedModule; 3]> = SmallVec::new();

        if let Some(module) = self.placed(HudModuleKind::Volume) {
            let extent = companions.of(HudModuleKind::Volume) + module.width;
            let (start, end) = match &music {
                Some(music) => (music.start - spacing - extent, music.start - spacing),
                None => self.centered_span(HudModuleKind::Volume, module.width),
            };
            placed.push(PlacedModule { kind: module.kind, width: module.width, start, end });
        }

        if let Some(music) = music {
            placed.push(music);
        }

        if let Some(module) = self.placed(HudModuleKind::Brightness) {
            let extent = companions.of(HudModuleKind::Brightness) + module.width;
            let (start, end) = match &music {
                Some(music) => (music.end + spacing, music.end + spacing + extent),
                None => self.centered_span(HudModuleKind::Brightness, module.width),
            };
            placed.push(PlacedModule { kind: module.kind, width: module.width, start, end });
        }

        placed.sort_by(|a, b| a.start.total_cmp(&b.start));

        let half_padding = geometry.padding / 2.0;
        let min_start = placed.iter().map(|m| m.start).reduce(f64::min);
        let max_end = placed.iter().map(|m| m.end).reduce(f64::max);

        let (total_width, push_offset, left_edge, right_edge) = match (min_start, max_end) {
            (Some(start), Some(end)) => {
                let overflow = (geometry.notch_start() - start).max(end - geometry.notch_end());
                (end - start, overflow.max(0.0), start - half_padding, end + half_padding)
            }
            _ => (
                0.0,
                0.0,
                geometry.notch_start() - half_padding,
                geometry.notch_end() + half_padding,
            ),
        };

        HudLayout {
            modules: placed,
            total_width,
            is_occluding: push_offset > 0.0,
            push_offset,
            left_edge,
            right_edge,
            version: self.version,
            suppressed: self.suppressed,
        }
    }

    // ========================================================================
    // Overlay activity
    // ========================================================================

    /// Records that an overlay became visible. Returns the new count.
    pub fn overlay_shown(&mut self) -> u32 {
        let count = Observable::get(&self.overlays).saturating_add(1);
        Observable::set(&mut self.overlays, count);
        count
    }

    /// Records that an overlay went away. Returns the new count.
    ///
    /// A hide without a matching show is logged and ignored; the count never
    /// goes below zero.
    pub fn overlay_hidden(&mut self) -> u32 {
        let current = *Observable::get(&self.overlays);
        if current == 0 {
            let err = AegisError::LayoutInvariantViolation(
                "overlay hidden while no overlay was shown".to_string(),
            );
            tracing::warn!("hud: {err}");
            return 0;
        }

        Observable::set(&mut self.overlays, current - 1);
        current - 1
    }

    /// Forces the overlay count back to zero.
    pub fn reset_overlay_state(&mut self) {
        let previous = Observable::set(&mut self.overlays, 0);
        if previous != 0 {
            tracing::warn!("hud: overlay count reset from {previous} to 0");
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[must_use]
    pub fn layout(&self) -> &HudLayout { Observable::get(&self.layout) }

    #[must_use]
    pub fn left_edge(&self) -> f64 { self.layout().left_edge }

    #[must_use]
    pub fn right_edge(&self) -> f64 { self.layout().right_edge }

    #[must_use]
    pub fn overlay_count(&self) -> u32 { *Observable::get(&self.overlays) }

    #[must_use]
    pub fn subscribe_layout(&self) -> Subscriber<HudLayout> { Observable::subscribe(&self.layout) }

    #[must_use]
    pub fn subscribe_overlays(&self) -> Subscriber<u32> { Observable::subscribe(&self.overlays) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hud::types::{CompanionWidths, NotchGeometry};

    const EPS: f64 = 1e-9;

    fn settings() -> HudSettings {
        HudSettings {
            geometry: NotchGeometry {
                screen_width: 1512.0,
                notch_width: 200.0,
                notch_height: 32.0,
                padding: 20.0,
            },
            spacing: 8.0,
            companions: CompanionWidths { music: 40.0, volume: 24.0, brightness: 24.0 },
        }
    }

    fn coordinator() -> HudCoordinator { HudCoordinator::new(settings()) }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < EPS }

    #[test]
    fn test_empty_layout_hugs_the_notch() {
        let hud = coordinator();
        assert!(hud.layout().modules.is_empty());
        assert!(close(hud.layout().total_width, 0.0));
        assert!(close(hud.left_edge(), 756.0 - 100.0 - 10.0));
        assert!(close(hud.right_edge(), 756.0 + 100.0 + 10.0));
        assert!(!hud.layout().is_occluding);
    }

    #[test]
    fn test_hidden_module_is_removed_immediately() {
        let mut hud = coordinator();
        hud.set_module(HudModuleKind::Volume, true, 40.0);
        assert!(hud.layout().contains(HudModuleKind::Volume));

        let layout = hud.set_module(HudModuleKind::Volume, false, 40.0);
        assert!(layout.modules.is_empty());
        assert!(close(layout.total_width, 0.0));
    }

    #[test]
    fn test_music_edges_equidistant_when_width_matches_companion() {
        let mut hud = coordinator();
        hud.set_module(HudModuleKind::Music, true, 40.0);
        let center = 756.0;
        assert!(close(center - hud.left_edge(), hud.right_edge() - center));

        hud.set_module(HudModuleKind::Music, true, 90.0);
        assert!(!close(center - hud.left_edge(), hud.right_edge() - center));
    }

    #[test]
    fn test_music_span_straddles_notch() {
        let mut hud = coordinator();
        let layout = hud.set_module(HudModuleKind::Music, true, 60.0).clone();
        let music = layout.modules[0];
        assert!(close(music.start, 656.0 - 40.0));
        assert!(close(music.end, 856.0 + 60.0));
        assert!(close(layout.total_width, 300.0));
        assert!(close(layout.push_offset, 60.0));
        assert!(layout.is_occluding);
    }

    #[test]
    fn test_volume_and_brightness_attach_to_music() {
        let mut hud = coordinator();
        hud.set_module(HudModuleKind::Brightness, true, 30.0);
        hud.set_module(HudModuleKind::Music, true, 60.0);
        let layout = hud.set_module(HudModuleKind::Volume, true, 30.0).clone();

        let kinds: Vec<HudModuleKind> = layout.modules.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![HudModuleKind::Volume, HudModuleKind::Music, HudModuleKind::Brightness]
        );

        let (volume, music, brightness) = (layout.modules[0], layout.modules[1], layout.modules[2]);
        assert!(close(volume.end, music.start - 8.0));
        assert!(close(volume.end - volume.start, 24.0 + 30.0));
        assert!(close(brightness.start, music.end + 8.0));
        assert!(close(layout.total_width, brightness.end - volume.start));
        assert!(close(hud.left_edge(), volume.start - 10.0));
        assert!(close(hud.right_edge(), brightness.end + 10.0));
    }

    #[test]
    fn test_volume_alone_centers_on_notch() {
        let mut hud = coordinator();
        let layout = hud.set_module(HudModuleKind::Volume, true, 40.0).clone();
        assert!(close(layout.modules[0].start, 656.0 - 24.0));
        assert!(close(layout.modules[0].end, 856.0 + 40.0));
    }

    #[test]
    fn test_every_call_bumps_version() {
        let mut hud = coordinator();
        let first = hud.layout().version;
        hud.set_module(HudModuleKind::Music, true, 40.0);
        hud.set_module(HudModuleKind::Music, true, 40.0);
        hud.set_module(HudModuleKind::Music, false, 0.0);
        assert_eq!(hud.layout().version, first + 3);
    }

    #[test]
    fn test_negative_width_is_clamped() {
        let mut hud = coordinator();
        let layout = hud.set_module(HudModuleKind::Music, true, -5.0);
        assert!(close(layout.modules[0].width, 0.0));
    }

    #[test]
    fn test_suppression_is_published_once() {
        let mut hud = coordinator();
        let version = hud.layout().version;
        hud.set_suppressed(true);
        hud.set_suppressed(true);
        assert!(hud.layout().suppressed);
        assert_eq!(hud.layout().version, version + 1);
    }

    #[test]
    fn test_overlay_count_never_negative() {
        let mut hud = coordinator();
        assert_eq!(hud.overlay_hidden(), 0);
        assert_eq!(hud.overlay_shown(), 1);
        assert_eq!(hud.overlay_shown(), 2);
        assert_eq!(hud.overlay_hidden(), 1);
        assert_eq!(hud.overlay_hidden(), 0);
        assert_eq!(hud.overlay_hidden(), 0);
        assert_eq!(hud.overlay_count(), 0);
    }

    #[test]
    fn test_overlay_count_random_sequences_stay_non_negative() {
        let mut hud = coordinator();
        let mut shown = 0_u32;
        // Deterministic pseudo-random walk biased toward hides.
        let mut seed = 0x2545_f491_u32;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed % 3 == 0 {
                shown += 1;
                hud.overlay_shown();
            } else {
                shown = shown.saturating_sub(1);
                hud.overlay_hidden();
            }
            assert_eq!(hud.overlay_count(), shown);
        }
    }

    #[test]
    fn test_reset_overlay_state() {
        let mut hud = coordinator();
        hud.overlay_shown();
        hud.overlay_shown();
        hud.reset_overlay_state();
        assert_eq!(hud.overlay_count(), 0);
    }

    #[tokio::test]
    async fn test_layout_subscribers_see_updates() {
        let mut hud = coordinator();
        let mut layouts = hud.subscribe_layout();
        hud.set_module(HudModuleKind::Brightness, true, 30.0);
        let layout = layouts.next().await.unwrap();
        assert!(layout.contains(HudModuleKind::Brightness));
    }
}
