//! In-memory API implementations for development and testing.
//!
//! These behave like the real backend but keep everything in process, so the
//! engine can run and be tested without network access.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use domain::models::{
    CreateGeozoneRequest, Geozone, GeozonePage, UpdateGeozoneRequest, User, UserPage,
    UserSearchRequest,
};

use crate::api::{GeozoneApi, MutationAck, UserApi};
use crate::error::ApiError;

/// In-memory geofence backend.
#[derive(Debug, Default)]
pub struct InMemoryGeozoneApi {
    records: Mutex<Vec<Geozone>>,
    simulate_failure: bool,
}

impl InMemoryGeozoneApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-seeded with records.
    pub fn with_records(records: Vec<Geozone>) -> Self {
        Self {
            records: Mutex::new(records),
            simulate_failure: false,
        }
    }

    /// A backend where every operation fails, for error-path tests.
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            simulate_failure: true,
        }
    }

    /// Number of records currently stored.
    pub fn record_count(&self) -> usize {
        self.records.lock().expect("record store poisoned").len()
    }

    fn check_available(&self) -> Result<(), ApiError> {
        if self.simulate_failure {
            Err(ApiError::Service {
                status: 500,
                message: "Simulated backend failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn page_of(records: &[Geozone], page: u32, limit: u32) -> GeozonePage {
    let total = records.len() as u64;
    let start = ((page.saturating_sub(1)) * limit) as usize;
    let data = records
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();
    GeozonePage { data, total }
}

fn matches_search(record: &Geozone, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record.name.to_lowercase().contains(&needle)
        || record.final_address.to_lowercase().contains(&needle)
}

#[async_trait]
impl GeozoneApi for InMemoryGeozoneApi {
    async fn list(&self, page: u32, limit: u32) -> Result<GeozonePage, ApiError> {
        self.check_available()?;
        let records = self.records.lock().expect("record store poisoned");
        Ok(page_of(&records, page, limit))
    }

    async fn search(
        &self,
        page: u32,
        limit: u32,
        search_text: &str,
    ) -> Result<GeozonePage, ApiError> {
        self.check_available()?;
        let records = self.records.lock().expect("record store poisoned");
        let matched: Vec<Geozone> = records
            .iter()
            .filter(|r| matches_search(r, search_text))
            .cloned()
            .collect();
        Ok(page_of(&matched, page, limit))
    }

    async fn create(&self, request: &CreateGeozoneRequest) -> Result<MutationAck, ApiError> {
        self.check_available()?;
        let now = Utc::now();
        let record = Geozone {
            id: Uuid::new_v4().to_string(),
            name: request.name.clone(),
            address: request.address.clone(),
            final_address: request.final_address.clone(),
            user_id: request.user_id.clone(),
            pincode: request.pincode.clone(),
            geo_code_data: Some(request.geo_code_data.clone()),
            shape_data: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tracing::info!(id = %record.id, name = %record.name, "Mock: created geozone");
        self.records
            .lock()
            .expect("record store poisoned")
            .push(record.clone());
        Ok(MutationAck {
            message: Some("Geozone created successfully".to_string()),
            data: Some(record),
        })
    }

    async fn update(
        &self,
        id: &str,
        request: &UpdateGeozoneRequest,
    ) -> Result<MutationAck, ApiError> {
        self.check_available()?;
        let mut records = self.records.lock().expect("record store poisoned");
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Geozone {id} not found")))?;

        if let Some(name) = &request.name {
            record.name = name.clone();
        }
        if request.address.is_some() {
            record.address = request.address.clone();
        }
        if let Some(final_address) = &request.final_address {
            record.final_address = final_address.clone();
        }
        if request.user_id.is_some() {
            record.user_id = request.user_id.clone();
        }
        if request.pincode.is_some() {
            record.pincode = request.pincode.clone();
        }
        if request.geo_code_data.is_some() {
            record.geo_code_data = request.geo_code_data.clone();
        }
        record.updated_at = Some(Utc::now());

        tracing::info!(id, "Mock: updated geozone");
        Ok(MutationAck {
            message: Some("Geozone updated successfully".to_string()),
            data: Some(record.clone()),
        })
    }

    async fn delete(&self, id: &str) -> Result<MutationAck, ApiError> {
        self.check_available()?;
        let mut records = self.records.lock().expect("record store poisoned");
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(ApiError::NotFound(format!("Geozone {id} not found")));
        }
        tracing::info!(id, "Mock: deleted geozone");
        Ok(MutationAck {
            message: Some("Geozone deleted successfully".to_string()),
            data: None,
        })
    }
}

/// User directory backed by a fixed list.
#[derive(Debug, Default)]
pub struct StaticUserApi {
    users: Vec<User>,
    simulate_failure: bool,
}

impl StaticUserApi {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            users: Vec::new(),
            simulate_failure: true,
        }
    }
}

#[async_trait]
impl UserApi for StaticUserApi {
    async fn search_users(&self, request: &UserSearchRequest) -> Result<UserPage, ApiError> {
        if self.simulate_failure {
            return Err(ApiError::Service {
                status: 500,
                message: "Simulated user service failure".to_string(),
            });
        }
        let start = ((request.page.saturating_sub(1)) * request.limit) as usize;
        let data = self
            .users
            .iter()
            .skip(start)
            .take(request.limit as usize)
            .cloned()
            .collect();
        Ok(UserPage { data })
    }
}
