//! Transient edit-form state for a geozone being created or edited.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationError;

use shared::validation::{validate_latitude, validate_longitude, validate_radius};

use crate::geometry::{self, DecodeError, Geometry};
use crate::models::geozone::{
    CreateGeozoneRequest, GeoCodeData, Geozone, UpdateGeozoneRequest,
};

/// Errors raised while turning a draft into a persistable request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Nothing to save yet")]
    Empty,

    #[error("A drawn shape is required")]
    MissingGeometry,

    #[error("Radius is not a number: {0}")]
    InvalidRadius(String),

    #[error("{0}")]
    OutOfRange(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The in-progress form for a geozone being created or edited.
///
/// The radius field holds raw form text; it is parsed tolerantly when the
/// draft is committed and, for circles, overrides the drawn radius.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeozoneDraft {
    pub name: String,
    pub address: String,
    pub final_address: String,
    pub user_id: String,
    pub radius: String,
    pub pincode: String,
    #[serde(skip)]
    pub geometry: Option<Geometry>,
}

impl GeozoneDraft {
    /// A draft with nothing filled in and no shape drawn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates a draft from a persisted record, decoding its geometry.
    pub fn from_record(record: &Geozone) -> Result<Self, DecodeError> {
        let geometry = record.geometry()?;
        let radius = match &geometry {
            Some(Geometry::Circle { radius_meters, .. }) => radius_meters.to_string(),
            _ => String::new(),
        };
        Ok(Self {
            name: record.name.clone(),
            address: record.address.clone().unwrap_or_default(),
            final_address: record.final_address.clone(),
            user_id: record.user_id.clone().unwrap_or_default(),
            radius,
            pincode: record.pincode.clone().unwrap_or_default(),
            geometry,
        })
    }

    /// True when the user has entered nothing and drawn nothing.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.geometry.is_none()
    }

    /// The geometry that will be persisted: the drawn shape, with the radius
    /// field applied on top for circles.
    pub fn effective_geometry(&self) -> Result<Geometry, DraftError> {
        let mut result = self
            .geometry
            .clone()
            .ok_or(DraftError::MissingGeometry)?;

        if let Geometry::Circle { radius_meters, .. } = &mut result {
            let text = self.radius.trim();
            if !text.is_empty() {
                let parsed = text
                    .parse::<f64>()
                    .map_err(|_| DraftError::InvalidRadius(self.radius.clone()))?;
                validate_radius(parsed).map_err(range_error)?;
                *radius_meters = parsed;
            }
        }

        match &result {
            Geometry::Circle { center, .. } => validate_point(center)?,
            Geometry::Polygon { path } => {
                for vertex in path {
                    validate_point(vertex)?;
                }
            }
            Geometry::Rectangle { bounds } => {
                validate_point(&bounds.north_east)?;
                validate_point(&bounds.south_west)?;
            }
        }

        Ok(result)
    }

    /// Builds the create payload for this draft.
    pub fn to_create_request(&self) -> Result<CreateGeozoneRequest, DraftError> {
        if self.is_empty() {
            return Err(DraftError::Empty);
        }
        let geometry = self.effective_geometry()?;
        Ok(CreateGeozoneRequest {
            name: self.name.trim().to_string(),
            address: none_if_empty(&self.address),
            final_address: self.final_address.clone(),
            user_id: none_if_empty(&self.user_id),
            pincode: none_if_empty(&self.pincode),
            geo_code_data: GeoCodeData {
                geometry: geometry::encode(&geometry),
            },
        })
    }

    /// Builds the partial update payload for this draft.
    pub fn to_update_request(&self) -> Result<UpdateGeozoneRequest, DraftError> {
        if self.is_empty() {
            return Err(DraftError::Empty);
        }
        let geometry = self.effective_geometry()?;
        Ok(UpdateGeozoneRequest {
            name: Some(self.name.trim().to_string()),
            address: none_if_empty(&self.address),
            final_address: Some(self.final_address.clone()),
            user_id: none_if_empty(&self.user_id),
            pincode: none_if_empty(&self.pincode),
            geo_code_data: Some(GeoCodeData {
                geometry: geometry::encode(&geometry),
            }),
        })
    }
}

fn validate_point(point: &geometry::LatLng) -> Result<(), DraftError> {
    validate_latitude(point.lat).map_err(range_error)?;
    validate_longitude(point.lng).map_err(range_error)?;
    Ok(())
}

fn range_error(err: ValidationError) -> DraftError {
    DraftError::OutOfRange(
        err.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string()),
    )
}

fn none_if_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
