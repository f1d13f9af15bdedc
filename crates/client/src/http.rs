//! HTTP implementations of the backend API traits over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use domain::models::{
    CreateGeozoneRequest, Geozone, GeozonePage, UpdateGeozoneRequest, UserPage,
    UserSearchRequest,
};

use crate::api::{GeozoneApi, MutationAck, UserApi};
use crate::config::BackendConfig;
use crate::error::ApiError;

/// Plain-listing envelope: records ride one level deeper than the total.
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: ListEnvelopeInner,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ListEnvelopeInner {
    data: Vec<Geozone>,
}

/// Search envelope: flat records plus its own count field.
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    data: Vec<Geozone>,
    total: u64,
}

/// Error body shape the backend uses for failed requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the geofence service.
#[derive(Debug, Clone)]
pub struct HttpGeozoneClient {
    client: Client,
    config: BackendConfig,
}

impl HttpGeozoneClient {
    /// Creates a new client with the configured request timeout.
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        if config.base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ApiError::Http)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else {
            ApiError::Http(err)
        }
    }
}

#[async_trait]
impl GeozoneApi for HttpGeozoneClient {
    async fn list(&self, page: u32, limit: u32) -> Result<GeozonePage, ApiError> {
        let url = self.url("geofences");
        debug!(url = %url, page, limit, "Fetching geozone listing");

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = check_status(response).await?;

        let envelope: ListEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(GeozonePage {
            data: envelope.data.data,
            total: envelope.total,
        })
    }

    async fn search(
        &self,
        page: u32,
        limit: u32,
        search_text: &str,
    ) -> Result<GeozonePage, ApiError> {
        let url = self.url("geofences/search");
        debug!(url = %url, page, limit, search_text, "Searching geozones");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("searchText", search_text.to_string()),
            ])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = check_status(response).await?;

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(GeozonePage {
            data: envelope.data,
            total: envelope.total,
        })
    }

    async fn create(&self, request: &CreateGeozoneRequest) -> Result<MutationAck, ApiError> {
        let url = self.url("geofences");
        debug!(url = %url, name = %request.name, "Creating geozone");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn update(
        &self,
        id: &str,
        request: &UpdateGeozoneRequest,
    ) -> Result<MutationAck, ApiError> {
        let url = self.url(&format!("geofences/{id}"));
        debug!(url = %url, id, "Updating geozone");

        let response = self
            .client
            .put(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<MutationAck, ApiError> {
        let url = self.url(&format!("geofences/{id}"));
        debug!(url = %url, id, "Deleting geozone");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// HTTP client for the user directory service.
#[derive(Debug, Clone)]
pub struct HttpUserClient {
    client: Client,
    config: BackendConfig,
}

impl HttpUserClient {
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        if config.user_service_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ApiError::Http)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl UserApi for HttpUserClient {
    async fn search_users(&self, request: &UserSearchRequest) -> Result<UserPage, ApiError> {
        debug!(url = %self.config.user_service_url, page = request.page, "Fetching user directory");

        let response = self
            .client
            .post(&self.config.user_service_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(self.config.timeout_ms)
                } else {
                    ApiError::Http(e)
                }
            })?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Maps non-success statuses to [`ApiError`], preserving the server message.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        Err(ApiError::NotFound(message))
    } else {
        Err(ApiError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_base_url() {
        let result = HttpGeozoneClient::new(BackendConfig::default());
        assert!(matches!(result, Err(ApiError::NotConfigured)));
    }

    #[test]
    fn test_user_client_requires_url() {
        let result = HttpUserClient::new(BackendConfig {
            base_url: "http://localhost:3001".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiError::NotConfigured)));
    }

    #[test]
    fn test_url_joining_trims_trailing_slash() {
        let client = HttpGeozoneClient::new(BackendConfig {
            base_url: "http://localhost:3001/api/v1/geofence/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.url("geofences/search"),
            "http://localhost:3001/api/v1/geofence/geofences/search"
        );
    }

    #[test]
    fn test_list_envelope_is_nested() {
        let body = r#"{
            "data": {"data": [{"_id": "g1", "name": "Depot", "finalAddress": ""}]},
            "total": 12
        }"#;
        let envelope: ListEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.data.len(), 1);
        assert_eq!(envelope.total, 12);
    }

    #[test]
    fn test_search_envelope_is_flat() {
        let body = r#"{
            "data": [{"_id": "g1", "name": "Depot", "finalAddress": ""}],
            "total": 3
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.total, 3);
    }
}
