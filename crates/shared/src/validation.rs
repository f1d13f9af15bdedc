//! Common validation utilities.

use validator::ValidationError;

/// Smallest radius a geozone circle may have, in meters.
pub const MIN_RADIUS_METERS: f64 = 1.0;

/// Largest radius a geozone circle may have, in meters.
pub const MAX_RADIUS_METERS: f64 = 50_000.0;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that a circle radius is within the allowed range.
pub fn validate_radius(radius_meters: f64) -> Result<(), ValidationError> {
    if (MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius_meters) {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be between 1 and 50000 meters".into());
        Err(err)
    }
}
