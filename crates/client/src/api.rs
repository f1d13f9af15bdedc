//! Typed API surface of the geofence backend and user directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use domain::models::{
    CreateGeozoneRequest, Geozone, GeozonePage, UpdateGeozoneRequest, UserPage,
    UserSearchRequest,
};

use crate::error::ApiError;

/// Acknowledgement returned by the backend for mutating operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationAck {
    /// Human-readable outcome, surfaced to the operator as a notice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The created or updated record, when the backend echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Geozone>,
}

/// Geofence CRUD and retrieval operations.
///
/// The two retrieval paths have independent response envelopes on the wire;
/// implementations normalize both to [`GeozonePage`].
#[async_trait]
pub trait GeozoneApi: Send + Sync {
    /// Plain paginated listing.
    async fn list(&self, page: u32, limit: u32) -> Result<GeozonePage, ApiError>;

    /// Free-text search with its own pagination.
    async fn search(
        &self,
        page: u32,
        limit: u32,
        search_text: &str,
    ) -> Result<GeozonePage, ApiError>;

    /// Creates a geozone from a draft payload.
    async fn create(&self, request: &CreateGeozoneRequest) -> Result<MutationAck, ApiError>;

    /// Partially updates an existing geozone.
    async fn update(
        &self,
        id: &str,
        request: &UpdateGeozoneRequest,
    ) -> Result<MutationAck, ApiError>;

    /// Deletes a geozone by id.
    async fn delete(&self, id: &str) -> Result<MutationAck, ApiError>;
}

/// User directory lookup.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn search_users(&self, request: &UserSearchRequest) -> Result<UserPage, ApiError>;
}
