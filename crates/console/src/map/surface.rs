//! Abstraction over the map rendering and drawing SDK.
//!
//! The engine never talks to a concrete SDK; it renders shapes, attaches
//! click handlers, and moves the viewport through these traits. A real
//! adapter wraps the vendor SDK; [`crate::map::headless`] provides an
//! in-process implementation for tests and offline runs.

use serde::Deserialize;

use domain::geometry::{Geometry, LatLng, RectBounds};

/// Handler invoked when an overlay is clicked. The position is the click
/// point when the SDK reports one.
pub type ClickHandler = Box<dyn Fn(Option<LatLng>) + Send>;

/// The three shape kinds an overlay can render as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Polygon,
    Rectangle,
}

impl ShapeKind {
    pub fn of(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Polygon { .. } => ShapeKind::Polygon,
            Geometry::Rectangle { .. } => ShapeKind::Rectangle,
        }
    }
}

/// Visual styling applied to rendered overlays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverlayStyle {
    #[serde(default = "default_fill_color")]
    pub fill_color: String,

    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,

    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,

    #[serde(default = "default_stroke_weight")]
    pub stroke_weight: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            fill_color: default_fill_color(),
            fill_opacity: default_fill_opacity(),
            stroke_color: default_stroke_color(),
            stroke_weight: default_stroke_weight(),
        }
    }
}

fn default_fill_color() -> String {
    "#4285F4".to_string()
}
fn default_fill_opacity() -> f64 {
    0.3
}
fn default_stroke_color() -> String {
    "#4285F4".to_string()
}
fn default_stroke_weight() -> u32 {
    2
}

/// Construction parameters for one overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub geometry: Geometry,
    pub style: OverlayStyle,
}

impl OverlaySpec {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            style: OverlayStyle::default(),
        }
    }

    pub fn styled(geometry: Geometry, style: OverlayStyle) -> Self {
        Self { geometry, style }
    }
}

/// Content of the info panel anchored to a clicked overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoContent {
    pub title: String,
    pub address: String,
    /// Shown for circle overlays only.
    pub radius_meters: Option<f64>,
}

/// One rendered, interactive shape on the map surface.
///
/// The per-kind readers return `Some` only for the matching kind; reading a
/// polygon path off a circle overlay yields `None`.
pub trait Overlay: Send {
    fn kind(&self) -> ShapeKind;

    /// Center of a circle overlay.
    fn circle_center(&self) -> Option<LatLng>;

    /// Radius of a circle overlay, in meters.
    fn circle_radius_meters(&self) -> Option<f64>;

    /// Vertex path of a polygon overlay, in drawing order.
    fn polygon_path(&self) -> Option<Vec<LatLng>>;

    /// Corner bounds of a rectangle overlay.
    fn rectangle_bounds(&self) -> Option<RectBounds>;

    /// Attaches the click handler, replacing any previous one.
    fn set_click_handler(&mut self, handler: ClickHandler);

    /// Detaches the click handler, if any.
    fn clear_click_handler(&mut self);

    /// Takes the shape off the map surface. Idempotent.
    fn remove(&mut self);
}

/// The map surface the engine renders onto.
pub trait MapSurface: Send + Sync {
    /// Renders a new overlay described by `spec`.
    fn render(&self, spec: &OverlaySpec) -> Box<dyn Overlay>;

    /// Re-centers and zooms the viewport.
    fn set_viewport(&self, center: LatLng, zoom: u8);

    /// Opens the shared info panel anchored at `position`.
    fn open_info_window(&self, position: LatLng, content: InfoContent);
}
