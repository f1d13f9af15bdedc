//! Conversion between backend geometry payloads and [`Geometry`].
//!
//! The backend emits `{ "type": tag, "coordinates": ..., "radius": ... }`
//! objects. Type tags vary in casing across record generations and numeric
//! fields occasionally arrive as strings, so decoding is tolerant on both
//! counts. Anything else is a [`DecodeError`].

use serde_json::{json, Value};
use thiserror::Error;

use super::{Geometry, LatLng, RectBounds};

/// Radius applied to circle payloads that omit one, in meters.
pub const DEFAULT_CIRCLE_RADIUS_METERS: f64 = 100.0;

/// Errors produced when a raw geometry payload cannot be normalized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Geometry payload is not a JSON object")]
    NotAnObject,

    #[error("Geometry payload has no type tag")]
    MissingType,

    #[error("Unrecognized geometry type: {0}")]
    UnknownType(String),

    #[error("Geometry payload has no coordinates")]
    MissingCoordinates,

    #[error("Expected at least {expected} coordinate values, found {found}")]
    CoordinateArity { expected: usize, found: usize },

    #[error("Non-numeric value in field: {0}")]
    NonNumeric(&'static str),
}

/// Decodes a raw backend payload into a normalized [`Geometry`].
///
/// Type tags are matched case-insensitively ("Circle" and "circle" are the
/// same shape). Coordinates and radii pass through a tolerant numeric parse
/// that accepts JSON numbers and numeric strings.
pub fn decode(raw: &Value) -> Result<Geometry, DecodeError> {
    let obj = raw.as_object().ok_or(DecodeError::NotAnObject)?;

    let tag = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;

    let coordinates = obj
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingCoordinates)?;

    match tag.to_ascii_lowercase().as_str() {
        "circle" => {
            if coordinates.len() < 2 {
                return Err(DecodeError::CoordinateArity {
                    expected: 2,
                    found: coordinates.len(),
                });
            }
            let center = LatLng::new(
                number_from(&coordinates[0], "coordinates")?,
                number_from(&coordinates[1], "coordinates")?,
            );
            let radius_meters = match obj.get("radius") {
                Some(Value::Null) | None => DEFAULT_CIRCLE_RADIUS_METERS,
                Some(value) => number_from(value, "radius")?,
            };
            Ok(Geometry::Circle {
                center,
                radius_meters,
            })
        }
        "polygon" => {
            if coordinates.is_empty() {
                return Err(DecodeError::CoordinateArity {
                    expected: 1,
                    found: 0,
                });
            }
            // A flat [lat, lng] payload is accepted as a single-vertex path.
            let path = if coordinates[0].is_array() {
                coordinates
                    .iter()
                    .map(vertex_from)
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                vec![vertex_from(&Value::Array(coordinates.clone()))?]
            };
            Ok(Geometry::Polygon { path })
        }
        "rectangle" => {
            if coordinates.len() < 2 {
                return Err(DecodeError::CoordinateArity {
                    expected: 2,
                    found: coordinates.len(),
                });
            }
            Ok(Geometry::Rectangle {
                bounds: RectBounds {
                    north_east: vertex_from(&coordinates[0])?,
                    south_west: vertex_from(&coordinates[1])?,
                },
            })
        }
        _ => Err(DecodeError::UnknownType(tag.to_string())),
    }
}

/// Encodes a [`Geometry`] into the canonical backend payload.
///
/// Always produces the current-generation form: capitalized type tag, numeric
/// fields as JSON numbers, circle radius always present.
pub fn encode(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::Circle {
            center,
            radius_meters,
        } => json!({
            "type": "Circle",
            "coordinates": [center.lat, center.lng],
            "radius": radius_meters,
        }),
        Geometry::Polygon { path } => json!({
            "type": "Polygon",
            "coordinates": path
                .iter()
                .map(|v| json!([v.lat, v.lng]))
                .collect::<Vec<_>>(),
        }),
        Geometry::Rectangle { bounds } => json!({
            "type": "Rectangle",
            "coordinates": [
                [bounds.north_east.lat, bounds.north_east.lng],
                [bounds.south_west.lat, bounds.south_west.lng],
            ],
        }),
    }
}

/// Reads a `[lat, lng]` pair out of a JSON array value.
fn vertex_from(value: &Value) -> Result<LatLng, DecodeError> {
    let pair = value.as_array().ok_or(DecodeError::NonNumeric("coordinates"))?;
    if pair.len() < 2 {
        return Err(DecodeError::CoordinateArity {
            expected: 2,
            found: pair.len(),
        });
    }
    Ok(LatLng::new(
        number_from(&pair[0], "coordinates")?,
        number_from(&pair[1], "coordinates")?,
    ))
}

/// Tolerant numeric parse: JSON numbers and numeric strings are accepted,
/// anything else is an error rather than a silent zero.
fn number_from(value: &Value, field: &'static str) -> Result<f64, DecodeError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(DecodeError::NonNumeric(field)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| DecodeError::NonNumeric(field)),
        _ => Err(DecodeError::NonNumeric(field)),
    }
}
