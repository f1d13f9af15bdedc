//! Geozone domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::geometry::{self, DecodeError, Geometry};

/// Current-generation geometry envelope carried by a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCodeData {
    pub geometry: serde_json::Value,
}

/// Represents a persisted geozone as returned by the backend.
///
/// A record may carry its boundary in the nested `geoCodeData.geometry` form,
/// in the legacy flat `shapeData` form, or not at all (address-only records
/// are valid business data).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geozone {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default)]
    pub final_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code_data: Option<GeoCodeData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Geozone {
    /// Raw geometry payload, preferring the nested current-generation form
    /// over the legacy flat one.
    pub fn raw_geometry(&self) -> Option<&serde_json::Value> {
        self.geo_code_data
            .as_ref()
            .map(|g| &g.geometry)
            .or(self.shape_data.as_ref())
    }

    /// Decoded boundary, if the record carries one.
    ///
    /// `Ok(None)` means the record has no drawn shape at all; `Err` means it
    /// has one that cannot be normalized.
    pub fn geometry(&self) -> Result<Option<Geometry>, DecodeError> {
        self.raw_geometry().map(geometry::decode).transpose()
    }
}

/// Request payload for creating a geozone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGeozoneRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub final_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,

    pub geo_code_data: GeoCodeData,
}

/// Request payload for updating a geozone (partial update).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGeozoneRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code_data: Option<GeoCodeData>,
}

/// One page of geozone records plus the total count across all pages.
///
/// Both retrieval paths (plain listing and text search) normalize to this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeozonePage {
    pub data: Vec<Geozone>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LatLng;
    use serde_json::json;

    fn record_json(geometry: serde_json::Value) -> serde_json::Value {
        json!({
            "_id": "gz-1",
            "name": "Depot North",
            "finalAddress": "1 Ring Road",
            "geoCodeData": {"geometry": geometry},
        })
    }

    #[test]
    fn test_deserialize_record_with_nested_geometry() {
        let raw = record_json(json!({
            "type": "Circle",
            "coordinates": [12.9, 77.6],
            "radius": 150,
        }));
        let record: Geozone = serde_json::from_value(raw).unwrap();
        assert_eq!(record.id, "gz-1");
        assert_eq!(record.name, "Depot North");
        let geometry = record.geometry().unwrap().unwrap();
        assert_eq!(
            geometry,
            Geometry::Circle {
                center: LatLng::new(12.9, 77.6),
                radius_meters: 150.0,
            }
        );
    }

    #[test]
    fn test_legacy_flat_shape_data_is_decoded() {
        let raw = json!({
            "_id": "gz-2",
            "name": "Depot South",
            "finalAddress": "2 Ring Road",
            "shapeData": {
                "type": "circle",
                "coordinates": [1.0, 2.0],
                "radius": "75",
            },
        });
        let record: Geozone = serde_json::from_value(raw).unwrap();
        let geometry = record.geometry().unwrap().unwrap();
        assert_eq!(
            geometry,
            Geometry::Circle {
                center: LatLng::new(1.0, 2.0),
                radius_meters: 75.0,
            }
        );
    }

    #[test]
    fn test_nested_geometry_wins_over_flat() {
        let raw = json!({
            "_id": "gz-3",
            "name": "Depot East",
            "finalAddress": "",
            "geoCodeData": {"geometry": {
                "type": "Circle",
                "coordinates": [10.0, 20.0],
                "radius": 30,
            }},
            "shapeData": {
                "type": "Circle",
                "coordinates": [99.0, 99.0],
                "radius": 99,
            },
        });
        let record: Geozone = serde_json::from_value(raw).unwrap();
        let Some(Geometry::Circle { center, .. }) = record.geometry().unwrap() else {
            panic!("expected circle");
        };
        assert_eq!(center, LatLng::new(10.0, 20.0));
    }

    #[test]
    fn test_address_only_record_has_no_geometry() {
        let raw = json!({
            "_id": "gz-4",
            "name": "Pickup point",
            "finalAddress": "77 Cross Street",
        });
        let record: Geozone = serde_json::from_value(raw).unwrap();
        assert!(record.raw_geometry().is_none());
        assert_eq!(record.geometry().unwrap(), None);
    }

    #[test]
    fn test_malformed_geometry_is_an_error_not_a_panic() {
        let raw = record_json(json!({"type": "Blob", "coordinates": [[0, 0]]}));
        let record: Geozone = serde_json::from_value(raw).unwrap();
        assert!(record.geometry().is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateGeozoneRequest {
            name: String::new(),
            address: None,
            final_address: "somewhere".to_string(),
            user_id: None,
            pincode: None,
            geo_code_data: GeoCodeData {
                geometry: json!({"type": "Circle", "coordinates": [0.0, 0.0], "radius": 10}),
            },
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_serializes_camel_case() {
        let request = CreateGeozoneRequest {
            name: "Depot".to_string(),
            address: None,
            final_address: "1 Ring Road".to_string(),
            user_id: Some("u-9".to_string()),
            pincode: None,
            geo_code_data: GeoCodeData {
                geometry: json!({"type": "Circle", "coordinates": [0.0, 0.0], "radius": 10}),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"finalAddress\":\"1 Ring Road\""));
        assert!(json.contains("\"geoCodeData\""));
        assert!(json.contains("\"userId\":\"u-9\""));
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        let request = UpdateGeozoneRequest {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, "{\"name\":\"Renamed\"}");
    }
}
