//! Overlay lifecycle management.
//!
//! The registry owns every overlay rendered for the visible record set and is
//! the only writer of that collection. Each overlay is paired with guaranteed
//! disposal on every exit path: refresh, record deletion, and teardown.

use std::sync::Arc;

use tracing::debug;

use domain::geometry::{DecodeError, Geometry, DEFAULT_CIRCLE_RADIUS_METERS};
use domain::models::Geozone;

use super::surface::{
    InfoContent, MapSurface, Overlay, OverlaySpec, OverlayStyle, ShapeKind,
};

/// Reads the live geometry off a rendered overlay back into a normalized
/// [`Geometry`]. This is the path exercised when the user finishes drawing a
/// shape or drags an existing one.
pub fn geometry_from_overlay(overlay: &dyn Overlay) -> Result<Geometry, DecodeError> {
    match overlay.kind() {
        ShapeKind::Circle => {
            let center = overlay
                .circle_center()
                .ok_or(DecodeError::MissingCoordinates)?;
            let radius_meters = overlay
                .circle_radius_meters()
                .unwrap_or(DEFAULT_CIRCLE_RADIUS_METERS);
            Ok(Geometry::Circle {
                center,
                radius_meters,
            })
        }
        ShapeKind::Polygon => {
            let path = overlay
                .polygon_path()
                .ok_or(DecodeError::MissingCoordinates)?;
            if path.is_empty() {
                return Err(DecodeError::CoordinateArity {
                    expected: 1,
                    found: 0,
                });
            }
            Ok(Geometry::Polygon { path })
        }
        ShapeKind::Rectangle => {
            let bounds = overlay
                .rectangle_bounds()
                .ok_or(DecodeError::MissingCoordinates)?;
            Ok(Geometry::Rectangle { bounds })
        }
    }
}

/// Detaches listeners and removes the shape from the surface, in that order.
pub fn dispose_overlay(overlay: &mut dyn Overlay) {
    // Listener removal must precede map removal so a late click cannot fire
    // against a shape that is already gone.
    overlay.clear_click_handler();
    overlay.remove();
}

/// A rendered overlay tied to the record it visualizes.
///
/// Runtime-only: the handle owns the overlay's lifetime (and that of its
/// click listener); the record id is a lookup key, not ownership.
pub struct OverlayHandle {
    record_id: String,
    overlay: Box<dyn Overlay>,
    disposed: bool,
}

impl OverlayHandle {
    pub fn new(record_id: String, overlay: Box<dyn Overlay>) -> Self {
        Self {
            record_id,
            overlay,
            disposed: false,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn overlay(&self) -> &dyn Overlay {
        self.overlay.as_ref()
    }

    /// Detaches the click listener and removes the shape. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        dispose_overlay(self.overlay.as_mut());
    }
}

impl Drop for OverlayHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Owns the overlays for the currently visible record set.
///
/// Exactly one live overlay exists per visible record with decodable
/// geometry. Only [`OverlayRegistry::sync`] and
/// [`OverlayRegistry::remove_record`] mutate the collection.
pub struct OverlayRegistry {
    surface: Arc<dyn MapSurface>,
    handles: Vec<OverlayHandle>,
}

impl OverlayRegistry {
    pub fn new(surface: Arc<dyn MapSurface>) -> Self {
        Self {
            surface,
            handles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, record_id: &str) -> bool {
        self.handles.iter().any(|h| h.record_id == record_id)
    }

    pub fn record_ids(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.record_id.clone()).collect()
    }

    pub fn handles(&self) -> &[OverlayHandle] {
        &self.handles
    }

    /// Rebuilds the overlay set for a new visible record set.
    ///
    /// Every previously held overlay is disposed first, then one overlay is
    /// created per record with decodable geometry. Records without a drawn
    /// shape are valid business data and are skipped; records whose geometry
    /// fails to decode are skipped with a log line, never a user-facing
    /// error. Callers only ever observe the old set or the new one.
    pub fn sync(&mut self, records: &[Geozone], style: &OverlayStyle) {
        // Dropping the old handles detaches their listeners before removal.
        self.handles = Vec::new();

        let mut next = Vec::with_capacity(records.len());
        for record in records {
            match record.geometry() {
                Ok(Some(geometry)) => next.push(self.spawn(record, geometry, style)),
                Ok(None) => {}
                Err(err) => {
                    debug!(id = %record.id, error = %err, "Skipping record with undecodable geometry");
                }
            }
        }
        self.handles = next;
    }

    /// Removes and disposes the overlay matching `record_id`.
    ///
    /// Returns `true` when a handle was removed; all other handles are left
    /// untouched.
    pub fn remove_record(&mut self, record_id: &str) -> bool {
        let before = self.handles.len();
        self.handles.retain(|h| h.record_id != record_id);
        self.handles.len() != before
    }

    /// Disposes every held overlay.
    pub fn clear(&mut self) {
        self.handles.clear();
    }

    fn spawn(&self, record: &Geozone, geometry: Geometry, style: &OverlayStyle) -> OverlayHandle {
        let spec = OverlaySpec::styled(geometry.clone(), style.clone());
        let mut overlay = self.surface.render(&spec);

        let content = InfoContent {
            title: record.name.clone(),
            address: record.final_address.clone(),
            radius_meters: match &geometry {
                Geometry::Circle { radius_meters, .. } => Some(*radius_meters),
                _ => None,
            },
        };
        // Circles can report a click without a point; anchor at the center then.
        let fallback = match &geometry {
            Geometry::Circle { center, .. } => Some(*center),
            _ => None,
        };
        let surface = Arc::clone(&self.surface);
        overlay.set_click_handler(Box::new(move |click| {
            if let Some(position) = click.or(fallback) {
                surface.open_info_window(position, content.clone());
            }
        }));

        OverlayHandle::new(record.id.clone(), overlay)
    }
}

impl Drop for OverlayRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
