//! In-process map surface for tests and offline runs.
//!
//! Records every surface interaction so tests can assert on overlay
//! lifecycles, listener ordering, viewport moves, and info windows without a
//! real rendering SDK.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use domain::geometry::{Geometry, LatLng, RectBounds};

use super::surface::{
    ClickHandler, InfoContent, MapSurface, Overlay, OverlaySpec, ShapeKind,
};

/// One observed surface interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Rendered { kind: ShapeKind },
    ListenerAttached,
    ListenerDetached,
    Removed { kind: ShapeKind },
    Viewport { center: LatLng, zoom: u8 },
    InfoWindow { position: LatLng, title: String },
}

#[derive(Default)]
struct SurfaceLog {
    events: Mutex<Vec<SurfaceEvent>>,
    handlers: Mutex<HashMap<u64, ClickHandler>>,
    live: AtomicUsize,
    next_id: AtomicU64,
}

impl SurfaceLog {
    fn push(&self, event: SurfaceEvent) {
        self.events.lock().expect("surface log poisoned").push(event);
    }
}

/// Map surface that renders nothing and remembers everything.
#[derive(Default)]
pub struct HeadlessSurface {
    log: Arc<SurfaceLog>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything that happened on this surface, in order.
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.log.events.lock().expect("surface log poisoned").clone()
    }

    pub fn clear_events(&self) {
        self.log.events.lock().expect("surface log poisoned").clear();
    }

    /// Overlays currently present on the surface.
    pub fn live_overlays(&self) -> usize {
        self.log.live.load(Ordering::Relaxed)
    }

    /// Click handlers currently attached.
    pub fn attached_listeners(&self) -> usize {
        self.log.handlers.lock().expect("surface log poisoned").len()
    }

    /// Fires a click on every overlay that still has a handler attached.
    pub fn click_all(&self, position: Option<LatLng>) {
        let handlers = self.log.handlers.lock().expect("surface log poisoned");
        for handler in handlers.values() {
            handler(position);
        }
    }

    /// Info windows opened so far, as `(position, title)` pairs.
    pub fn info_windows(&self) -> Vec<(LatLng, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::InfoWindow { position, title } => Some((position, title)),
                _ => None,
            })
            .collect()
    }
}

impl MapSurface for HeadlessSurface {
    fn render(&self, spec: &OverlaySpec) -> Box<dyn Overlay> {
        let id = self.log.next_id.fetch_add(1, Ordering::Relaxed);
        self.log.live.fetch_add(1, Ordering::Relaxed);
        self.log.push(SurfaceEvent::Rendered {
            kind: ShapeKind::of(&spec.geometry),
        });
        Box::new(HeadlessOverlay {
            id,
            geometry: spec.geometry.clone(),
            log: Arc::clone(&self.log),
            on_map: true,
        })
    }

    fn set_viewport(&self, center: LatLng, zoom: u8) {
        self.log.push(SurfaceEvent::Viewport { center, zoom });
    }

    fn open_info_window(&self, position: LatLng, content: InfoContent) {
        self.log.push(SurfaceEvent::InfoWindow {
            position,
            title: content.title,
        });
    }
}

struct HeadlessOverlay {
    id: u64,
    geometry: Geometry,
    log: Arc<SurfaceLog>,
    on_map: bool,
}

impl Overlay for HeadlessOverlay {
    fn kind(&self) -> ShapeKind {
        ShapeKind::of(&self.geometry)
    }

    fn circle_center(&self) -> Option<LatLng> {
        match &self.geometry {
            Geometry::Circle { center, .. } => Some(*center),
            _ => None,
        }
    }

    fn circle_radius_meters(&self) -> Option<f64> {
        match &self.geometry {
            Geometry::Circle { radius_meters, .. } => Some(*radius_meters),
            _ => None,
        }
    }

    fn polygon_path(&self) -> Option<Vec<LatLng>> {
        match &self.geometry {
            Geometry::Polygon { path } => Some(path.clone()),
            _ => None,
        }
    }

    fn rectangle_bounds(&self) -> Option<RectBounds> {
        match &self.geometry {
            Geometry::Rectangle { bounds } => Some(*bounds),
            _ => None,
        }
    }

    fn set_click_handler(&mut self, handler: ClickHandler) {
        self.log
            .handlers
            .lock()
            .expect("surface log poisoned")
            .insert(self.id, handler);
        self.log.push(SurfaceEvent::ListenerAttached);
    }

    fn clear_click_handler(&mut self) {
        let removed = self
            .log
            .handlers
            .lock()
            .expect("surface log poisoned")
            .remove(&self.id);
        if removed.is_some() {
            self.log.push(SurfaceEvent::ListenerDetached);
        }
    }

    fn remove(&mut self) {
        if !self.on_map {
            return;
        }
        self.on_map = false;
        self.log.live.fetch_sub(1, Ordering::Relaxed);
        self.log.push(SurfaceEvent::Removed { kind: self.kind() });
    }
}

impl Drop for HeadlessOverlay {
    fn drop(&mut self) {
        // A dropped overlay must not linger on the surface or keep a handler.
        self.clear_click_handler();
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle() -> OverlaySpec {
        OverlaySpec::new(Geometry::Circle {
            center: LatLng::new(12.9, 77.6),
            radius_meters: 100.0,
        })
    }

    #[test]
    fn test_render_and_remove_tracks_live_count() {
        let surface = HeadlessSurface::new();
        let mut overlay = surface.render(&circle());
        assert_eq!(surface.live_overlays(), 1);

        overlay.remove();
        assert_eq!(surface.live_overlays(), 0);

        // Removing twice is a no-op.
        overlay.remove();
        assert_eq!(surface.live_overlays(), 0);
    }

    #[test]
    fn test_drop_without_remove_cleans_up() {
        let surface = HeadlessSurface::new();
        {
            let mut overlay = surface.render(&circle());
            overlay.set_click_handler(Box::new(|_| {}));
            assert_eq!(surface.attached_listeners(), 1);
        }
        assert_eq!(surface.live_overlays(), 0);
        assert_eq!(surface.attached_listeners(), 0);
    }

    #[test]
    fn test_click_reaches_handler() {
        let surface = HeadlessSurface::new();
        let mut overlay = surface.render(&circle());

        let clicked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicked);
        overlay.set_click_handler(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        surface.click_all(Some(LatLng::new(1.0, 1.0)));
        assert_eq!(clicked.load(Ordering::Relaxed), 1);

        overlay.clear_click_handler();
        surface.click_all(Some(LatLng::new(1.0, 1.0)));
        assert_eq!(clicked.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_live_geometry_readers_match_kind() {
        let surface = HeadlessSurface::new();
        let overlay = surface.render(&circle());
        assert_eq!(overlay.kind(), ShapeKind::Circle);
        assert_eq!(overlay.circle_center(), Some(LatLng::new(12.9, 77.6)));
        assert_eq!(overlay.circle_radius_meters(), Some(100.0));
        assert_eq!(overlay.polygon_path(), None);
        assert_eq!(overlay.rectangle_bounds(), None);
    }
}
