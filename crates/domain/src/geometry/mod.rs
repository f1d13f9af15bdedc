//! Normalized geometry shapes for geozone boundaries.
//!
//! The backend stores boundaries in two historical encodings (a nested
//! `geoCodeData.geometry` object and a flat `shapeData` payload). Everything
//! past the codec boundary works with the single [`Geometry`] variant defined
//! here.

mod codec;

pub use codec::{decode, encode, DecodeError, DEFAULT_CIRCLE_RADIUS_METERS};

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Corner pair of a rectangle, always `[northEast, southWest]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectBounds {
    pub north_east: LatLng,
    pub south_west: LatLng,
}

/// A geozone boundary shape.
///
/// Polygon vertex order is load-bearing: it defines the boundary path.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Circle { center: LatLng, radius_meters: f64 },
    Polygon { path: Vec<LatLng> },
    Rectangle { bounds: RectBounds },
}

impl Geometry {
    /// Canonical type tag as written by the current backend generation.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Geometry::Circle { .. } => "Circle",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::Rectangle { .. } => "Rectangle",
        }
    }

    /// The coordinate used to represent this shape as a single point:
    /// the center for circles, the first vertex for polygons, and the
    /// north-east corner for rectangles.
    pub fn representative_point(&self) -> Option<LatLng> {
        match self {
            Geometry::Circle { center, .. } => Some(*center),
            Geometry::Polygon { path } => path.first().copied(),
            Geometry::Rectangle { bounds } => Some(bounds.north_east),
        }
    }
}
